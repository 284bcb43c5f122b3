use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use tracing::info;

use heating_common::{PlannerConfig, Room, RoomStore, SensorDataset};

use crate::app::{compute_schedule, export_schedule, resolve_room};

/// Line oriented interactive menu. End of input quits.
pub struct Menu<'a, R, W> {
    input: R,
    output: W,
    config: &'a PlannerConfig,
    data_dir: PathBuf,
    rooms: RoomStore,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(
        input: R,
        output: W,
        config: &'a PlannerConfig,
        data_dir: PathBuf,
    ) -> anyhow::Result<Self> {
        let rooms = RoomStore::load(&config.rooms_file).with_context(|| {
            format!("failed to load rooms from {}", config.rooms_file.display())
        })?;

        Ok(Self {
            input,
            output,
            config,
            data_dir,
            rooms,
        })
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "1) List rooms")?;
            writeln!(self.output, "2) Create room")?;
            writeln!(self.output, "3) Compute schedule")?;
            writeln!(self.output, "0) Quit")?;

            let Some(choice) = self.prompt("> ")? else {
                break;
            };
            match choice.as_str() {
                "1" => self.list_rooms()?,
                "2" => self.create_room()?,
                "3" => self.compute()?,
                "0" | "q" => break,
                other => writeln!(self.output, "Unknown option '{other}'")?,
            }
        }
        Ok(())
    }

    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt_temperature(&mut self, label: &str) -> io::Result<Option<f64>> {
        loop {
            let Some(raw) = self.prompt(label)? else {
                return Ok(None);
            };
            match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => return Ok(Some(value)),
                _ => writeln!(self.output, "'{raw}' is not a temperature")?,
            }
        }
    }

    fn list_rooms(&mut self) -> io::Result<()> {
        if self.rooms.is_empty() {
            return writeln!(self.output, "No rooms configured.");
        }
        for room in self.rooms.rooms() {
            writeln!(
                self.output,
                "{}: comfort {:.2} away {:.2}",
                room.name, room.comfort_temperature, room.away_temperature
            )?;
        }
        Ok(())
    }

    fn create_room(&mut self) -> anyhow::Result<()> {
        let (min, max) = (self.config.min_temperature, self.config.max_temperature);

        let Some(name) = self.prompt("Room name: ")? else {
            return Ok(());
        };
        let Some(comfort) =
            self.prompt_temperature(&format!("Comfort temperature ({min:.1}-{max:.1}): "))?
        else {
            return Ok(());
        };
        let Some(away) =
            self.prompt_temperature(&format!("Away temperature ({min:.1}-{comfort:.1}): "))?
        else {
            return Ok(());
        };

        let room = Room::new(name, comfort, away);
        if let Err(err) = room
            .validate(min, max)
            .and_then(|()| self.rooms.add(room.clone()))
        {
            writeln!(self.output, "Room not created: {err}")?;
            return Ok(());
        }

        self.rooms.save(&self.config.rooms_file).with_context(|| {
            format!("failed to save rooms to {}", self.config.rooms_file.display())
        })?;
        info!(room = %room.name, "room created");
        writeln!(self.output, "Saved room '{}'.", room.name)?;
        Ok(())
    }

    fn compute(&mut self) -> anyhow::Result<()> {
        let Some(name) = self.prompt("Room name (blank for first): ")? else {
            return Ok(());
        };
        let name = (!name.is_empty()).then_some(name);
        let room = match resolve_room(self.config, &self.rooms, name.as_deref()) {
            Ok(room) => room,
            Err(err) => {
                writeln!(self.output, "{err:#}")?;
                return Ok(());
            }
        };

        let excluded = [self.config.rooms_file.clone(), self.config.plan_path()];
        let files = list_sample_files(&self.data_dir, &self.config.samples_extension, &excluded)
            .with_context(|| format!("failed to list {}", self.data_dir.display()))?;
        if files.is_empty() {
            writeln!(
                self.output,
                "No .{} sample files in {}.",
                self.config.samples_extension,
                self.data_dir.display()
            )?;
            return Ok(());
        }

        for (index, path) in files.iter().enumerate() {
            let name = path.file_name().unwrap_or(path.as_os_str());
            writeln!(self.output, "{:>3}) {}", index + 1, name.to_string_lossy())?;
        }
        let Some(choice) = self.prompt("Sample file: ")? else {
            return Ok(());
        };
        let Some(samples) = choice
            .parse::<usize>()
            .ok()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| files.get(index))
        else {
            writeln!(self.output, "Invalid selection '{choice}'")?;
            return Ok(());
        };

        let dataset = SensorDataset::load(samples)
            .with_context(|| format!("failed to read sensor data from {}", samples.display()))?;
        let schedule = compute_schedule(&dataset, &room)?;
        for path in export_schedule(self.config, &schedule)? {
            writeln!(self.output, "wrote {}", path.display())?;
        }
        Ok(())
    }
}

/// Files in `dir` with the given extension, sorted by name.
pub fn list_sample_files(
    dir: &Path,
    extension: &str,
    excluded: &[PathBuf],
) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || excluded.contains(&path) {
            continue;
        }
        if path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
