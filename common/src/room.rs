use std::{
    fmt::Write as _,
    fs,
    io::{self, ErrorKind},
    path::Path,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_ROOMS: usize = 50;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("invalid format in line {line}")]
    InvalidLine { line: usize },
    #[error("room name must not be empty")]
    EmptyName,
    #[error("room name must not contain ':' or line breaks")]
    InvalidName,
    #[error("{field} temperature {value:.2} is outside {min:.1}..={max:.1}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("away temperature {away:.2} is above comfort temperature {comfort:.2}")]
    AwayAboveComfort { comfort: f64, away: f64 },
    #[error("room '{0}' already exists")]
    Duplicate(String),
    #[error("can only handle {max} rooms")]
    Capacity { max: usize },
    #[error("room store i/o failed")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub comfort_temperature: f64,
    pub away_temperature: f64,
}

impl Room {
    pub fn new(name: impl Into<String>, comfort_temperature: f64, away_temperature: f64) -> Self {
        Self {
            name: name.into().trim().to_string(),
            comfort_temperature,
            away_temperature,
        }
    }

    pub fn validate(&self, min: f64, max: f64) -> Result<(), RoomError> {
        if self.name.trim().is_empty() {
            return Err(RoomError::EmptyName);
        }
        if self.name.contains([':', '\n', '\r']) {
            return Err(RoomError::InvalidName);
        }
        for (field, value) in [
            ("comfort", self.comfort_temperature),
            ("away", self.away_temperature),
        ] {
            if !value.is_finite() || !(min..=max).contains(&value) {
                return Err(RoomError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }
        if self.away_temperature > self.comfort_temperature {
            return Err(RoomError::AwayAboveComfort {
                comfort: self.comfort_temperature,
                away: self.away_temperature,
            });
        }
        Ok(())
    }

    fn parse_line(line: &str) -> Option<Self> {
        let (name, rest) = line.split_once(':')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut fields = rest.split_whitespace();
        let comfort = fields.next()?.parse().ok()?;
        let away = fields.next()?.parse().ok()?;

        Some(Self::new(name, comfort, away))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomStore {
    rooms: Vec<Room>,
}

impl RoomStore {
    pub fn load(path: &Path) -> Result<Self, RoomError> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, RoomError> {
        let mut rooms = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            if rooms.len() >= MAX_ROOMS {
                return Err(RoomError::Capacity { max: MAX_ROOMS });
            }
            let room = Room::parse_line(line).ok_or(RoomError::InvalidLine { line: index + 1 })?;
            rooms.push(room);
        }
        Ok(Self { rooms })
    }

    pub fn save(&self, path: &Path) -> Result<(), RoomError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.render())?;
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for room in &self.rooms {
            let _ = writeln!(
                out,
                "{}: {:.2} {:.2}",
                room.name, room.comfort_temperature, room.away_temperature
            );
        }
        out
    }

    pub fn find_first(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.name == name)
    }

    pub fn add(&mut self, room: Room) -> Result<(), RoomError> {
        if self.rooms.len() >= MAX_ROOMS {
            return Err(RoomError::Capacity { max: MAX_ROOMS });
        }
        if self.find_first(&room.name).is_some() {
            return Err(RoomError::Duplicate(room.name));
        }
        self.rooms.push(room);
        Ok(())
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
