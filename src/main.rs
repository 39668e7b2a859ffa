use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use rewind::config::{self, CONFIG_PATH};
use rewind::error::ConfigurationError;
use rewind::game::events::Event;
use rewind::game::note_lock::NoteLockStyle;
use rewind::game::state::StateSummary;
use rewind::game::timing_stats::{TimingStats, compute_timing_stats};
use rewind::session::Session;

#[derive(Parser, Debug)]
#[command(name = "rewind", version, about = "Judge a recorded play and inspect it at any point in time")]
struct Cli {
    /// Session file with `targets` and `frames`.
    session: PathBuf,
    /// Times to inspect, in ms. Defaults to the end of the session.
    #[arg(allow_negative_numbers = true)]
    times: Vec<f64>,
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,
    /// Overall difficulty, overrides the config file.
    #[arg(long)]
    od: Option<f64>,
    /// Circle size, overrides the config file.
    #[arg(long)]
    cs: Option<f64>,
    /// none, stable, lazer or strict.
    #[arg(long)]
    note_lock: Option<String>,
    /// Bucket interval in ms.
    #[arg(long)]
    interval: Option<f64>,
    /// Leave out the event list.
    #[arg(long)]
    summary_only: bool,
}

#[derive(Serialize)]
struct Report {
    query_ms: f64,
    summary: StateSummary,
    timing: TimingStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    events: Option<Vec<Event>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Startup default when config is missing or malformed.
    log::set_max_level(log::LevelFilter::Warn);

    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    log::set_max_level(cfg.log_level.as_level_filter());

    let mut engine = cfg.engine;
    if let Some(od) = cli.od {
        engine.overall_difficulty = od;
    }
    if let Some(cs) = cli.cs {
        engine.circle_size = cs;
    }
    if let Some(style) = cli.note_lock.as_deref() {
        engine.lock.style = style
            .parse::<NoteLockStyle>()
            .map_err(|()| ConfigurationError::UnknownValue { key: "NoteLock", value: style.to_string() })?;
    }
    if let Some(interval) = cli.interval {
        engine.bucket_interval_ms = interval;
    }

    let machine = Session::load(&cli.session)?.into_time_machine(&engine)?;
    let times = if cli.times.is_empty() { vec![machine.duration()] } else { cli.times };

    let reports: Vec<Report> = times
        .into_iter()
        .map(|t| {
            let state = machine.state_at(t);
            Report {
                query_ms: t,
                summary: state.summary(),
                timing: compute_timing_stats(&state),
                events: (!cli.summary_only).then(|| machine.extract_events(&state)),
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
