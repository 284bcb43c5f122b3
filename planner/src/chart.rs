use std::path::Path;

use anyhow::Context;
use image::{Rgb, RgbImage};

use heating_common::HeatingSchedule;

pub const BLOCK_WIDTH: u32 = 20;
pub const BLOCK_HEIGHT: u32 = 20;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Grid of coloured blocks, one row per line. Blocks past `max_blocks`
/// columns or `max_lines` rows are ignored.
pub struct BlockChart {
    image: RgbImage,
    max_blocks: u32,
    max_lines: u32,
    line_index: u32,
}

impl BlockChart {
    pub fn new(max_blocks: u32, max_lines: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(
                BLOCK_WIDTH * max_blocks + 2,
                BLOCK_HEIGHT * max_lines,
                BACKGROUND,
            ),
            max_blocks,
            max_lines,
            line_index: 0,
        }
    }

    pub fn draw_block(&mut self, column: u32, value: f64) {
        if column >= self.max_blocks || self.line_index >= self.max_lines {
            return;
        }

        let start_x = BLOCK_WIDTH * column + 1;
        let start_y = BLOCK_HEIGHT * self.line_index;
        let color = block_color(value);

        for x in 1..BLOCK_WIDTH {
            for y in 1..BLOCK_HEIGHT {
                if let Some(pixel) = self.image.get_pixel_mut_checked(start_x + x, start_y + y) {
                    *pixel = color;
                }
            }
        }
    }

    pub fn draw_blocks(&mut self, values: &[f64]) {
        for (column, &value) in values.iter().enumerate() {
            let Ok(column) = u32::try_from(column) else {
                break;
            };
            self.draw_block(column, value);
        }
    }

    pub fn next_line(&mut self) {
        self.line_index += 1;
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Writes the chart; the format follows the file extension.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        self.image
            .save(path)
            .with_context(|| format!("failed to write chart to {}", path.display()))
    }
}

/// White at zero confidence, fading to blue at full confidence.
pub fn block_color(value: f64) -> Rgb<u8> {
    let value = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let red = (255.0 - 255.0 * value) as u8;
    let green = (255.0 - 149.0 * value) as u8;
    Rgb([red, green, 255])
}

/// One row per day profile, one block per slot.
pub fn render_schedule(schedule: &HeatingSchedule) -> BlockChart {
    let grid = schedule.confidence_grid();
    let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
    let mut chart = BlockChart::new(columns as u32, grid.len() as u32);

    for row in &grid {
        chart.draw_blocks(row);
        chart.next_line();
    }

    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use heating_common::{schedule::simple_schedule, Room, SensorDataset, TIME_BLOCKS_PER_DAY};
    use image::GenericImageView;
    use pretty_assertions::assert_eq;

    #[test]
    fn colour_ramps_from_white_to_blue() {
        assert_eq!(block_color(0.0), Rgb([255, 255, 255]));
        assert_eq!(block_color(1.0), Rgb([0, 106, 255]));
        assert_eq!(block_color(0.5), Rgb([127, 180, 255]));
        assert_eq!(block_color(3.0), block_color(1.0));
        assert_eq!(block_color(-1.0), block_color(0.0));
    }

    #[test]
    fn chart_dimensions_follow_grid() {
        let chart = BlockChart::new(48, 2);
        assert_eq!(chart.image().dimensions(), (20 * 48 + 2, 40));
    }

    #[test]
    fn block_leaves_a_one_pixel_border() {
        let mut chart = BlockChart::new(2, 1);
        chart.draw_blocks(&[1.0, 1.0]);

        let image = chart.image();
        assert_eq!(*image.get_pixel(1, 1), BACKGROUND);
        assert_eq!(*image.get_pixel(2, 1), block_color(1.0));
        assert_eq!(*image.get_pixel(20, 19), block_color(1.0));
        assert_eq!(*image.get_pixel(21, 5), BACKGROUND);
        assert_eq!(*image.get_pixel(22, 5), block_color(1.0));
        assert_eq!(*image.get_pixel(5, 0), BACKGROUND);
    }

    #[test]
    fn overflowing_blocks_and_lines_are_ignored() {
        let mut chart = BlockChart::new(1, 1);
        chart.draw_blocks(&[0.0, 1.0, 1.0]);
        chart.next_line();
        chart.draw_block(0, 1.0);

        assert!(chart
            .image()
            .pixels()
            .all(|pixel| *pixel == BACKGROUND));
    }

    #[test]
    fn renders_one_row_per_profile() {
        let days = (0..10)
            .map(|day| [if day % 7 < 5 { 1.0 } else { 0.0 }; TIME_BLOCKS_PER_DAY])
            .collect();
        let dataset = SensorDataset::from_days(days).unwrap();
        let schedule = heating_common::build(&dataset, &Room::new("Den", 21.0, 17.0)).unwrap();

        let chart = render_schedule(&schedule);

        assert_eq!(chart.image().height(), 2 * BLOCK_HEIGHT);
        assert_eq!(*chart.image().get_pixel(10, 10), block_color(1.0));
        assert_eq!(*chart.image().get_pixel(10, 30), block_color(0.0));
    }

    #[test]
    fn saves_png_and_ppm() {
        let dir = tempfile::tempdir().unwrap();
        let chart = render_schedule(&simple_schedule(21.0));

        for name in ["schedule.png", "schedule.ppm"] {
            let path = dir.path().join(name);
            chart.save(&path).unwrap();
            let loaded = image::open(&path).unwrap();
            assert_eq!(loaded.width(), BLOCK_WIDTH * 48 + 2);
            assert_eq!(loaded.height(), BLOCK_HEIGHT);
        }
    }
}
