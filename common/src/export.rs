use std::io::{self, Write};

use chrono::NaiveTime;

use crate::schedule::HeatingSchedule;

pub const SLOT_MINUTES: u32 = 30;

pub fn slot_start(slot: usize) -> NaiveTime {
    let minutes = (slot as u32 * SLOT_MINUTES) % (24 * 60);
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or_default()
}

pub fn write_plan<W: Write>(schedule: &HeatingSchedule, out: &mut W) -> io::Result<()> {
    for (index, day) in schedule.days.iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        writeln!(out, "# {}", schedule.tier.profile_label(index))?;
        for (slot, block) in day.time_blocks.iter().enumerate() {
            writeln!(
                out,
                "{}  {:6.2}  {:7.2}",
                slot_start(slot).format("%H:%M"),
                block.temperature,
                block.sensor_reaction_time
            )?;
        }
    }
    Ok(())
}

pub fn write_json<W: Write>(schedule: &HeatingSchedule, out: &mut W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(out, schedule)
}
