use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use tracing::{debug, info, warn};

use heating_common::{
    export::{write_json, write_plan},
    HeatingSchedule, PlannerConfig, Room, RoomStore, SensorDataset, Tier,
};

use crate::{chart::render_schedule, menu::Menu};

const CONFIG_FILE: &str = "planner.json";

pub fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let data_dir = std::env::var("HEATING_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));
    let config = load_config(&data_dir);

    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(samples) => {
            let room_name = args.next();
            let written = run_batch(&config, Path::new(&samples), room_name.as_deref())?;
            for path in written {
                println!("wrote {}", path.display());
            }
            Ok(())
        }
        None => {
            let stdin = io::stdin();
            let mut menu = Menu::new(stdin.lock(), io::stdout(), &config, data_dir)?;
            menu.run()
        }
    }
}

pub fn load_config(data_dir: &Path) -> PlannerConfig {
    PlannerConfig::load(&data_dir.join(CONFIG_FILE))
        .unwrap_or_else(|err| {
            warn!("failed to load planner config: {err}");
            PlannerConfig::default()
        })
        .rooted_at(data_dir)
}

/// Non-interactive mode: one sample file in, chart and plan out.
pub fn run_batch(
    config: &PlannerConfig,
    samples: &Path,
    room_name: Option<&str>,
) -> anyhow::Result<Vec<PathBuf>> {
    let rooms = RoomStore::load(&config.rooms_file)
        .with_context(|| format!("failed to load rooms from {}", config.rooms_file.display()))?;
    let room = resolve_room(config, &rooms, room_name)?;
    let dataset = SensorDataset::load(samples)
        .with_context(|| format!("failed to read sensor data from {}", samples.display()))?;

    let schedule = compute_schedule(&dataset, &room)?;
    export_schedule(config, &schedule)
}

pub fn resolve_room(
    config: &PlannerConfig,
    rooms: &RoomStore,
    name: Option<&str>,
) -> anyhow::Result<Room> {
    let room = match name {
        Some(name) => match rooms.find_first(name) {
            Some(room) => room.clone(),
            None => bail!("unknown room '{name}'"),
        },
        None => rooms.rooms().first().cloned().unwrap_or_else(|| {
            debug!("no rooms configured, using default preferences");
            config.default_room()
        }),
    };

    room.validate(config.min_temperature, config.max_temperature)
        .with_context(|| format!("room '{}' has invalid preferences", room.name))?;
    Ok(room)
}

pub fn compute_schedule(dataset: &SensorDataset, room: &Room) -> anyhow::Result<HeatingSchedule> {
    let tier = Tier::for_day_count(dataset.day_count());
    info!(
        days = dataset.day_count(),
        tier = tier.as_str(),
        room = %room.name,
        "building heating schedule"
    );

    let schedule = heating_common::build(dataset, room)?;
    debug!(profiles = schedule.count(), "schedule built");
    Ok(schedule)
}

pub fn export_schedule(
    config: &PlannerConfig,
    schedule: &HeatingSchedule,
) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let mut written = Vec::new();

    let chart_path = config.chart_path();
    render_schedule(schedule).save(&chart_path)?;
    written.push(chart_path);

    let plan_path = config.plan_path();
    let mut plan = BufWriter::new(
        fs::File::create(&plan_path)
            .with_context(|| format!("failed to create {}", plan_path.display()))?,
    );
    write_plan(schedule, &mut plan)
        .and_then(|()| plan.flush())
        .with_context(|| format!("failed to write plan to {}", plan_path.display()))?;
    written.push(plan_path);

    if let Some(json_path) = config.json_path() {
        let file = fs::File::create(&json_path)
            .with_context(|| format!("failed to create {}", json_path.display()))?;
        let mut json = BufWriter::new(file);
        write_json(schedule, &mut json)
            .map_err(io::Error::from)
            .and_then(|()| json.flush())
            .with_context(|| format!("failed to write schedule to {}", json_path.display()))?;
        written.push(json_path);
    }

    for path in &written {
        info!("wrote {}", path.display());
    }
    Ok(written)
}
