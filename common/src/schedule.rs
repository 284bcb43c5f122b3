use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    calendar::{calc_weight, cycle_position, is_weekday, DayOfWeek, CYCLE_DAYS},
    dataset::{SensorDataset, TIME_BLOCKS_PER_DAY},
    room::Room,
};

pub const SIMPLE_MAX_DAYS: usize = 7;
pub const ROUGH_MAX_DAYS: usize = 28;

const COMFORT_CONFIDENCE: f64 = 0.9;
const AWAY_CONFIDENCE: f64 = 0.1;
const TREND_THRESHOLD: f64 = 0.1;
const AWAY_REACTION_MINUTES: f64 = 5.0;
const RISING_REACTION_FACTOR: f64 = 0.5;
const FALLING_REACTION_FACTOR: f64 = -30.0;

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("no samples contribute to {profile} at slot {slot}")]
    EmptyBucket { profile: String, slot: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Simple,
    Rough,
    Fine,
}

impl Tier {
    pub fn for_day_count(day_count: usize) -> Self {
        if day_count <= SIMPLE_MAX_DAYS {
            Self::Simple
        } else if day_count <= ROUGH_MAX_DAYS {
            Self::Rough
        } else {
            Self::Fine
        }
    }

    pub fn day_blocks(self) -> usize {
        match self {
            Self::Simple => 1,
            Self::Rough => 2,
            Self::Fine => CYCLE_DAYS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Rough => "rough",
            Self::Fine => "fine",
        }
    }

    pub fn profile_label(self, index: usize) -> String {
        match self {
            Self::Simple => "Every day".to_string(),
            Self::Rough if index == 0 => "Weekdays".to_string(),
            Self::Rough => "Weekends".to_string(),
            Self::Fine => format!(
                "Week {} {}",
                index / 7 + 1,
                DayOfWeek::from_index(index).as_str()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeBlock {
    #[serde(rename = "weightedAverage")]
    pub weighted_average: f64,
    pub trend: f64,
    pub temperature: f64,
    // Positive: minutes of presence before switching to comfort.
    // Negative: minutes of absence before switching to away.
    #[serde(rename = "sensorReactionTime")]
    pub sensor_reaction_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBlock {
    #[serde(rename = "timeBlocks")]
    pub time_blocks: Vec<TimeBlock>,
}

impl DayBlock {
    fn from_averages(averages: &[f64]) -> Self {
        Self {
            time_blocks: averages
                .iter()
                .map(|&weighted_average| TimeBlock {
                    weighted_average,
                    ..TimeBlock::default()
                })
                .collect(),
        }
    }

    pub fn weighted_averages(&self) -> Vec<f64> {
        self.time_blocks
            .iter()
            .map(|block| block.weighted_average)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatingSchedule {
    pub tier: Tier,
    pub days: Vec<DayBlock>,
}

impl HeatingSchedule {
    pub fn count(&self) -> usize {
        self.days.len()
    }

    pub fn confidence_grid(&self) -> Vec<Vec<f64>> {
        self.days.iter().map(DayBlock::weighted_averages).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotSetting {
    pub temperature: f64,
    pub sensor_reaction_time: f64,
}

impl SlotSetting {
    fn of(block: &TimeBlock) -> Self {
        Self {
            temperature: block.temperature,
            sensor_reaction_time: block.sensor_reaction_time,
        }
    }
}

pub fn build(dataset: &SensorDataset, room: &Room) -> Result<HeatingSchedule, ScheduleError> {
    match Tier::for_day_count(dataset.day_count()) {
        Tier::Simple => Ok(simple_schedule(room.comfort_temperature)),
        Tier::Rough => rough_schedule(dataset, room),
        Tier::Fine => fine_schedule(dataset, room),
    }
}

pub fn simple_schedule(comfort_temperature: f64) -> HeatingSchedule {
    let block = TimeBlock {
        weighted_average: 1.0,
        trend: 0.0,
        temperature: comfort_temperature,
        sensor_reaction_time: 0.0,
    };

    HeatingSchedule {
        tier: Tier::Simple,
        days: vec![DayBlock {
            time_blocks: vec![block; TIME_BLOCKS_PER_DAY],
        }],
    }
}

pub fn rough_schedule(
    dataset: &SensorDataset,
    room: &Room,
) -> Result<HeatingSchedule, ScheduleError> {
    let mut days = rough_weighted_averages(dataset)?;

    for day in &mut days {
        let averages = day.weighted_averages();
        for (slot, block) in day.time_blocks.iter_mut().enumerate() {
            block.trend = if slot == 0 || slot == TIME_BLOCKS_PER_DAY - 1 {
                0.0
            } else {
                (averages[slot + 1] - averages[slot]) + (averages[slot] - averages[slot - 1])
            };
        }
    }

    for day in &mut days {
        for slot in 0..TIME_BLOCKS_PER_DAY {
            let previous = slot
                .checked_sub(1)
                .map(|prev| SlotSetting::of(&day.time_blocks[prev]));
            apply_setting(&mut day.time_blocks[slot], previous, room);
        }
    }

    Ok(HeatingSchedule {
        tier: Tier::Rough,
        days,
    })
}

fn rough_weighted_averages(dataset: &SensorDataset) -> Result<Vec<DayBlock>, ScheduleError> {
    let mut weekdays = [0.0; TIME_BLOCKS_PER_DAY];
    let mut weekends = [0.0; TIME_BLOCKS_PER_DAY];

    for slot in 0..TIME_BLOCKS_PER_DAY {
        let (mut weekday_sum, mut weekday_count) = (0.0, 0usize);
        let (mut weekend_sum, mut weekend_count) = (0.0, 0usize);

        for (day, values) in dataset.days().iter().enumerate() {
            if is_weekday(day) {
                weekday_sum += values[slot];
                weekday_count += 1;
            } else {
                weekend_sum += values[slot];
                weekend_count += 1;
            }
        }

        weekdays[slot] = mean(weekday_sum, weekday_count as f64, Tier::Rough, 0, slot)?;
        weekends[slot] = mean(weekend_sum, weekend_count as f64, Tier::Rough, 1, slot)?;
    }

    Ok(vec![
        DayBlock::from_averages(&weekdays),
        DayBlock::from_averages(&weekends),
    ])
}

pub fn fine_schedule(
    dataset: &SensorDataset,
    room: &Room,
) -> Result<HeatingSchedule, ScheduleError> {
    let mut days = fine_weighted_averages(dataset)?;

    let flat: Vec<f64> = days.iter().flat_map(DayBlock::weighted_averages).collect();
    let last = flat.len() - 1;
    for (day_index, day) in days.iter_mut().enumerate() {
        for (slot, block) in day.time_blocks.iter_mut().enumerate() {
            let position = day_index * TIME_BLOCKS_PER_DAY + slot;
            block.trend = if position == 0 || position == last {
                0.0
            } else {
                flat[position + 1] - flat[position - 1]
            };
        }
    }

    for day_index in 0..days.len() {
        for slot in 0..TIME_BLOCKS_PER_DAY {
            let previous = if slot > 0 {
                Some(SlotSetting::of(&days[day_index].time_blocks[slot - 1]))
            } else if day_index > 0 {
                days[day_index - 1].time_blocks.last().map(SlotSetting::of)
            } else {
                None
            };
            apply_setting(&mut days[day_index].time_blocks[slot], previous, room);
        }
    }

    Ok(HeatingSchedule {
        tier: Tier::Fine,
        days,
    })
}

fn fine_weighted_averages(dataset: &SensorDataset) -> Result<Vec<DayBlock>, ScheduleError> {
    let mut averages = vec![[0.0; TIME_BLOCKS_PER_DAY]; CYCLE_DAYS];

    for slot in 0..TIME_BLOCKS_PER_DAY {
        let mut results = [0.0; CYCLE_DAYS];
        let mut sum_of_weights = [0.0; CYCLE_DAYS];

        for (day, values) in dataset.days().iter().enumerate() {
            let weight = calc_weight(day);
            let position = cycle_position(day);
            results[position] += values[slot] * weight;
            sum_of_weights[position] += weight;
        }

        for position in 0..CYCLE_DAYS {
            averages[position][slot] = mean(
                results[position],
                sum_of_weights[position],
                Tier::Fine,
                position,
                slot,
            )?;
        }
    }

    Ok(averages
        .iter()
        .map(|day| DayBlock::from_averages(day))
        .collect())
}

fn mean(
    sum: f64,
    weight: f64,
    tier: Tier,
    profile: usize,
    slot: usize,
) -> Result<f64, ScheduleError> {
    if weight <= 0.0 {
        return Err(ScheduleError::EmptyBucket {
            profile: tier.profile_label(profile),
            slot,
        });
    }
    Ok(sum / weight)
}

fn apply_setting(block: &mut TimeBlock, previous: Option<SlotSetting>, room: &Room) {
    let setting = slot_setting(block.weighted_average, block.trend, previous, room);
    block.temperature = setting.temperature;
    block.sensor_reaction_time = setting.sensor_reaction_time;
}

pub fn slot_setting(
    weighted_average: f64,
    trend: f64,
    previous: Option<SlotSetting>,
    room: &Room,
) -> SlotSetting {
    if weighted_average >= COMFORT_CONFIDENCE {
        SlotSetting {
            temperature: room.comfort_temperature,
            sensor_reaction_time: 0.0,
        }
    } else if weighted_average >= AWAY_CONFIDENCE {
        uncertain_setting(weighted_average, trend, previous, room)
    } else {
        SlotSetting {
            temperature: room.away_temperature,
            sensor_reaction_time: AWAY_REACTION_MINUTES,
        }
    }
}

fn uncertain_setting(
    weighted_average: f64,
    trend: f64,
    previous: Option<SlotSetting>,
    room: &Room,
) -> SlotSetting {
    let leaving = SlotSetting {
        temperature: room.comfort_temperature,
        sensor_reaction_time: FALLING_REACTION_FACTOR * weighted_average,
    };

    if trend > TREND_THRESHOLD {
        let spread = room.comfort_temperature - room.away_temperature;
        SlotSetting {
            temperature: room.comfort_temperature - spread * (1.0 - weighted_average),
            sensor_reaction_time: RISING_REACTION_FACTOR / weighted_average,
        }
    } else if trend >= -TREND_THRESHOLD {
        previous.unwrap_or(leaving)
    } else {
        leaving
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn room() -> Room {
        Room::new("Office", 22.0, 16.0)
    }

    fn dataset_with(days: usize, value: impl Fn(usize, usize) -> f64) -> SensorDataset {
        let rows = (0..days)
            .map(|day| std::array::from_fn(|slot| value(day, slot)))
            .collect();
        SensorDataset::from_days(rows).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(Tier::for_day_count(0), Tier::Simple);
        assert_eq!(Tier::for_day_count(7), Tier::Simple);
        assert_eq!(Tier::for_day_count(8), Tier::Rough);
        assert_eq!(Tier::for_day_count(28), Tier::Rough);
        assert_eq!(Tier::for_day_count(29), Tier::Fine);
        assert_eq!(Tier::for_day_count(100), Tier::Fine);
    }

    #[test]
    fn short_history_is_always_comfortable() {
        for days in 0..=7 {
            let dataset = dataset_with(days, |day, slot| ((day + slot) % 3) as f64 / 3.0);
            let schedule = build(&dataset, &room()).unwrap();

            assert_eq!(schedule.tier, Tier::Simple);
            assert_eq!(schedule.count(), 1);
            for block in &schedule.days[0].time_blocks {
                assert_eq!(block.weighted_average, 1.0);
                assert_eq!(block.trend, 0.0);
                assert_eq!(block.temperature, 22.0);
                assert_eq!(block.sensor_reaction_time, 0.0);
            }
        }
    }

    #[test]
    fn five_half_occupied_days_use_simple_tier() {
        let dataset = dataset_with(5, |_, _| 0.5);
        let schedule = build(&dataset, &room()).unwrap();

        assert_eq!(schedule.count(), 1);
        assert_eq!(schedule.days[0].time_blocks.len(), TIME_BLOCKS_PER_DAY);
        assert_eq!(schedule.days[0].time_blocks[17].temperature, 22.0);
        assert_eq!(schedule.days[0].time_blocks[17].weighted_average, 1.0);
    }

    #[test]
    fn rough_tier_has_flat_edges() {
        for days in 8..=28 {
            let dataset = dataset_with(days, |day, slot| ((day * 7 + slot * 3) % 10) as f64 / 10.0);
            let schedule = build(&dataset, &room()).unwrap();

            assert_eq!(schedule.tier, Tier::Rough);
            assert_eq!(schedule.count(), 2);
            for day in &schedule.days {
                assert_eq!(day.time_blocks.len(), TIME_BLOCKS_PER_DAY);
                assert_eq!(day.time_blocks[0].trend, 0.0);
                assert_eq!(day.time_blocks[TIME_BLOCKS_PER_DAY - 1].trend, 0.0);
            }
        }
    }

    #[test]
    fn rough_tier_separates_weekdays_from_weekends() {
        let dataset = dataset_with(20, |day, slot| {
            if slot == 10 {
                if is_weekday(day) {
                    1.0
                } else {
                    0.0
                }
            } else {
                0.5
            }
        });

        let schedule = build(&dataset, &room()).unwrap();

        let weekday = schedule.days[0].time_blocks[10];
        assert_eq!(weekday.weighted_average, 1.0);
        assert_eq!(weekday.temperature, 22.0);
        assert_eq!(weekday.sensor_reaction_time, 0.0);

        let weekend = schedule.days[1].time_blocks[10];
        assert_eq!(weekend.weighted_average, 0.0);
        assert_eq!(weekend.temperature, 16.0);
        assert_eq!(weekend.sensor_reaction_time, 5.0);
    }

    #[test]
    fn rough_trend_is_centered_difference() {
        let dataset = dataset_with(14, |_, slot| slot as f64 / 100.0);
        let schedule = build(&dataset, &room()).unwrap();

        for slot in 1..TIME_BLOCKS_PER_DAY - 1 {
            assert_close(schedule.days[0].time_blocks[slot].trend, 0.02);
        }
    }

    #[test]
    fn rough_uncertain_slots_follow_trend() {
        // Weekday profile ramps 0.2 -> 0.6 -> 0.2 around slots 20..=24.
        let profile = |slot: usize| match slot {
            20 => 0.2,
            21 => 0.4,
            22 => 0.6,
            23 => 0.4,
            24 => 0.2,
            _ => 0.5,
        };
        let dataset = dataset_with(14, |_, slot| profile(slot));
        let schedule = build(&dataset, &room()).unwrap();
        let day = &schedule.days[0].time_blocks;

        // Slot 0 is neutral with no predecessor.
        assert_eq!(day[0].temperature, 22.0);
        assert_close(day[0].sensor_reaction_time, -15.0);

        // Rising: 0.6 - 0.2 at slot 21.
        assert_close(day[21].trend, 0.4);
        assert_close(day[21].temperature, 22.0 - 6.0 * 0.6);
        assert_close(day[21].sensor_reaction_time, 0.5 / 0.4);

        // Neutral at the peak copies the rising slot.
        assert_close(day[22].trend, 0.0);
        assert_eq!(day[22].temperature, day[21].temperature);
        assert_eq!(day[22].sensor_reaction_time, day[21].sensor_reaction_time);

        // Falling: 0.2 - 0.6 at slot 23.
        assert_close(day[23].trend, -0.4);
        assert_eq!(day[23].temperature, 22.0);
        assert_close(day[23].sensor_reaction_time, -12.0);
    }

    #[test]
    fn rough_tier_rejects_empty_weekend_bucket() {
        let dataset = dataset_with(3, |_, _| 0.5);
        let err = rough_schedule(&dataset, &room()).unwrap_err();

        assert_eq!(
            err,
            ScheduleError::EmptyBucket {
                profile: "Weekends".to_string(),
                slot: 0,
            }
        );
    }

    #[test]
    fn fine_tier_has_fourteen_profiles_with_flat_ends() {
        for days in [29, 42, 71, 100] {
            let dataset = dataset_with(days, |day, slot| ((day * 5 + slot) % 11) as f64 / 10.0);
            let schedule = build(&dataset, &room()).unwrap();

            assert_eq!(schedule.tier, Tier::Fine);
            assert_eq!(schedule.count(), CYCLE_DAYS);
            assert_eq!(schedule.days[0].time_blocks[0].trend, 0.0);
            assert_eq!(
                schedule.days[CYCLE_DAYS - 1].time_blocks[TIME_BLOCKS_PER_DAY - 1].trend,
                0.0
            );
        }
    }

    #[test]
    fn fine_average_weights_early_days_more() {
        // Day 2 contributes with weight 1.0, day 44 with weight 0.6.
        let dataset = dataset_with(45, |day, _| if day == 44 { 1.0 } else { 0.0 });
        let schedule = build(&dataset, &room()).unwrap();

        // Cycle position 2 sees days 2, 16, 30 and 44.
        let expected = 0.6 / (1.0 + 1.0 + 0.8 + 0.6);
        assert_close(schedule.days[2].time_blocks[5].weighted_average, expected);
        assert_eq!(schedule.days[3].time_blocks[5].weighted_average, 0.0);
    }

    #[test]
    fn fine_trend_wraps_between_days() {
        let dataset = dataset_with(28 + 14, |day, slot| {
            let position = day % CYCLE_DAYS;
            (position * TIME_BLOCKS_PER_DAY + slot) as f64 / 1000.0
        });
        let schedule = build(&dataset, &room()).unwrap();

        // Every interior position sees a constant slope of two steps.
        assert_close(schedule.days[3].time_blocks[0].trend, 0.002);
        assert_close(schedule.days[3].time_blocks[47].trend, 0.002);
        assert_close(schedule.days[0].time_blocks[1].trend, 0.002);
    }

    #[test]
    fn fine_neutral_first_slot_copies_previous_day() {
        // Profile 1 ends on a rise, profile 2 starts flat at the same level.
        let dataset = dataset_with(29, |day, slot| {
            let position = day % CYCLE_DAYS;
            match (position, slot) {
                (1, 45) => 0.2,
                (1, 46) => 0.3,
                (1, 47) => 0.5,
                (2, _) => 0.5,
                _ => 0.0,
            }
        });
        let schedule = build(&dataset, &room()).unwrap();
        let previous = schedule.days[1].time_blocks[47];
        let first = schedule.days[2].time_blocks[0];

        assert_close(previous.trend, 0.2);
        assert_close(first.trend, 0.0);
        assert_eq!(first.temperature, previous.temperature);
        assert_eq!(first.sensor_reaction_time, previous.sensor_reaction_time);
    }

    #[test]
    fn fine_uncertain_slots_follow_trend() {
        // Cycle position 4 ramps 0.2 -> 0.6 -> 0.2 around slots 20..=24.
        let dataset = dataset_with(30, |day, slot| match (day % CYCLE_DAYS, slot) {
            (4, 20) | (4, 24) => 0.2,
            (4, 21) | (4, 23) => 0.4,
            (4, 22) => 0.6,
            _ => 0.5,
        });
        let schedule = build(&dataset, &room()).unwrap();
        assert_eq!(schedule.tier, Tier::Fine);

        // Global first slot is neutral with nothing before it.
        let first = schedule.days[0].time_blocks[0];
        assert_close(first.weighted_average, 0.5);
        assert_eq!(first.trend, 0.0);
        assert_eq!(first.temperature, 22.0);
        assert_close(first.sensor_reaction_time, -15.0);

        let day = &schedule.days[4].time_blocks;

        assert_close(day[21].trend, 0.4);
        assert_close(day[21].temperature, 22.0 - 6.0 * 0.6);
        assert_close(day[21].sensor_reaction_time, 0.5 / 0.4);

        assert_close(day[23].trend, -0.4);
        assert_eq!(day[23].temperature, 22.0);
        assert_close(day[23].sensor_reaction_time, -12.0);
    }

    #[test]
    fn fine_rejects_cycle_positions_without_history() {
        let dataset = dataset_with(10, |_, _| 0.5);
        let err = fine_schedule(&dataset, &room()).unwrap_err();

        assert!(matches!(err, ScheduleError::EmptyBucket { slot: 0, .. }));
        assert_eq!(
            err.to_string(),
            "no samples contribute to Week 2 Thu at slot 0"
        );
    }

    #[test]
    fn building_twice_is_identical() {
        for days in [5, 20, 60] {
            let dataset = dataset_with(days, |day, slot| ((day * 13 + slot * 7) % 17) as f64 / 16.0);
            let first = build(&dataset, &room()).unwrap();
            let second = build(&dataset, &room()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn confidence_threshold_edges() {
        let room = room();

        let comfort = slot_setting(0.9, -1.0, None, &room);
        assert_eq!(comfort.temperature, 22.0);
        assert_eq!(comfort.sensor_reaction_time, 0.0);

        let away = slot_setting(0.099, 1.0, None, &room);
        assert_eq!(away.temperature, 16.0);
        assert_eq!(away.sensor_reaction_time, 5.0);

        let previous = SlotSetting {
            temperature: 19.0,
            sensor_reaction_time: 3.0,
        };
        assert_eq!(slot_setting(0.1, 0.1, Some(previous), &room), previous);
        assert_eq!(slot_setting(0.5, -0.1, Some(previous), &room), previous);
    }

    #[test]
    fn profile_labels() {
        assert_eq!(Tier::Simple.profile_label(0), "Every day");
        assert_eq!(Tier::Rough.profile_label(1), "Weekends");
        assert_eq!(Tier::Fine.profile_label(0), "Week 1 Mon");
        assert_eq!(Tier::Fine.profile_label(13), "Week 2 Sun");
    }
}
