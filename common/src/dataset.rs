use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use thiserror::Error;

pub const TIME_BLOCKS_PER_DAY: usize = 48;
pub const MAX_DAYS: usize = 100;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("sample file '{}' cannot be opened", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read sample data")]
    Read(#[from] io::Error),
    #[error("invalid value '{token}' at day {day} value {slot}")]
    InvalidValue {
        day: usize,
        slot: usize,
        token: String,
    },
    #[error("non-finite value at day {day} value {slot}")]
    NonFinite { day: usize, slot: usize },
    #[error("can only handle {max} days of data")]
    TooManyDays { max: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorDataset {
    days: Vec<[f64; TIME_BLOCKS_PER_DAY]>,
}

impl SensorDataset {
    pub fn from_days(days: Vec<[f64; TIME_BLOCKS_PER_DAY]>) -> Result<Self, DatasetError> {
        if days.len() > MAX_DAYS {
            return Err(DatasetError::TooManyDays { max: MAX_DAYS });
        }
        for (day, values) in days.iter().enumerate() {
            if let Some(slot) = values.iter().position(|value| !value.is_finite()) {
                return Err(DatasetError::NonFinite {
                    day: day + 1,
                    slot: slot + 1,
                });
            }
        }
        Ok(Self { days })
    }

    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = fs::File::open(path).map_err(|source| DatasetError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, DatasetError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, DatasetError> {
        let mut days = Vec::new();
        let mut current = [0.0; TIME_BLOCKS_PER_DAY];
        let mut slot = 0;

        for token in raw.split_whitespace() {
            let day = days.len();
            let value: f64 = token.parse().map_err(|_| DatasetError::InvalidValue {
                day: day + 1,
                slot: slot + 1,
                token: token.to_string(),
            })?;
            if !value.is_finite() {
                return Err(DatasetError::NonFinite {
                    day: day + 1,
                    slot: slot + 1,
                });
            }
            if day >= MAX_DAYS {
                return Err(DatasetError::TooManyDays { max: MAX_DAYS });
            }

            current[slot] = value;
            slot += 1;
            if slot == TIME_BLOCKS_PER_DAY {
                days.push(current);
                slot = 0;
            }
        }

        Ok(Self { days })
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn value(&self, day: usize, slot: usize) -> f64 {
        self.days[day][slot]
    }

    pub fn days(&self) -> &[[f64; TIME_BLOCKS_PER_DAY]] {
        &self.days
    }
}
