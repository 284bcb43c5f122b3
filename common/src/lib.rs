pub mod calendar;
pub mod config;
pub mod dataset;
pub mod export;
pub mod room;
pub mod schedule;

pub use calendar::{calc_weight, is_weekday, DayOfWeek, CYCLE_DAYS};
pub use config::{ConfigError, PlannerConfig, RoomDefaults};
pub use dataset::{DatasetError, SensorDataset, MAX_DAYS, TIME_BLOCKS_PER_DAY};
pub use room::{Room, RoomError, RoomStore};
pub use schedule::{build, DayBlock, HeatingSchedule, ScheduleError, Tier, TimeBlock};
