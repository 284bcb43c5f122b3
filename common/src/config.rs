use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::room::Room;

const PHYSICAL_MIN_TEMP_C: f64 = 5.0;
const PHYSICAL_MAX_TEMP_C: f64 = 35.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config")]
    Io(#[from] io::Error),
    #[error("failed to parse config")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomDefaults {
    pub comfort_temperature: f64,
    pub away_temperature: f64,
}

impl Default for RoomDefaults {
    fn default() -> Self {
        Self {
            comfort_temperature: 21.0,
            away_temperature: 17.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerConfig {
    pub rooms_file: PathBuf,
    pub output_dir: PathBuf,
    pub chart_file: String,
    pub plan_file: String,
    pub json_file: Option<String>,
    pub samples_extension: String,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub default_room: RoomDefaults,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            rooms_file: PathBuf::from("rooms.txt"),
            output_dir: PathBuf::from("."),
            chart_file: "schedule.png".to_string(),
            plan_file: "plan.txt".to_string(),
            json_file: None,
            samples_extension: "txt".to_string(),
            min_temperature: 15.0,
            max_temperature: 30.0,
            default_room: RoomDefaults::default(),
        }
    }
}

impl PlannerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read(path) {
            Ok(raw) => {
                let mut config: Self = serde_json::from_slice(&raw)?;
                config.sanitize();
                Ok(config)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn sanitize(&mut self) {
        self.min_temperature = self
            .min_temperature
            .clamp(PHYSICAL_MIN_TEMP_C, PHYSICAL_MAX_TEMP_C);
        self.max_temperature = self
            .max_temperature
            .clamp(PHYSICAL_MIN_TEMP_C, PHYSICAL_MAX_TEMP_C);
        if self.min_temperature >= self.max_temperature {
            let defaults = Self::default();
            self.min_temperature = defaults.min_temperature;
            self.max_temperature = defaults.max_temperature;
        }

        let comfort = self
            .default_room
            .comfort_temperature
            .clamp(self.min_temperature, self.max_temperature);
        let away = self
            .default_room
            .away_temperature
            .clamp(self.min_temperature, comfort);
        self.default_room = RoomDefaults {
            comfort_temperature: comfort,
            away_temperature: away,
        };

        if self.chart_file.trim().is_empty() {
            self.chart_file = Self::default().chart_file;
        }
        if self.plan_file.trim().is_empty() {
            self.plan_file = Self::default().plan_file;
        }
        self.samples_extension = self.samples_extension.trim_start_matches('.').to_string();
    }

    pub fn rooted_at(mut self, data_dir: &Path) -> Self {
        if self.rooms_file.is_relative() {
            self.rooms_file = data_dir.join(&self.rooms_file);
        }
        if self.output_dir.is_relative() {
            self.output_dir = data_dir.join(&self.output_dir);
        }
        self
    }

    pub fn chart_path(&self) -> PathBuf {
        self.output_dir.join(&self.chart_file)
    }

    pub fn plan_path(&self) -> PathBuf {
        self.output_dir.join(&self.plan_file)
    }

    pub fn json_path(&self) -> Option<PathBuf> {
        self.json_file
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(|name| self.output_dir.join(name))
    }

    pub fn default_room(&self) -> Room {
        Room::new(
            "default",
            self.default_room.comfort_temperature,
            self.default_room.away_temperature,
        )
    }
}
