use std::path::Path;
use std::str::FromStr;

use ini::Ini;
use log::{LevelFilter, info};

use crate::error::ConfigurationError;
use crate::game::frames::FrameOrderPolicy;
use crate::game::gameplay::Ruleset;
use crate::game::judgment::JudgeGrade;
use crate::game::note_lock::{LockPolicy, NoteLockStyle};
use crate::game::time_machine::DEFAULT_BUCKET_INTERVAL_MS;
use crate::game::timing_windows::HitWindows;

pub const CONFIG_PATH: &str = "rewind.ini";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(&self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

/// Everything a session needs besides its targets and frames.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub overall_difficulty: f64,
    pub circle_size: f64,
    /// Replaces the OD-derived windows when set.
    pub hit_windows: Option<HitWindows>,
    pub lock: LockPolicy,
    pub bucket_interval_ms: f64,
    pub frame_order: FrameOrderPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overall_difficulty: 5.0,
            circle_size: 4.0,
            hit_windows: None,
            lock: LockPolicy::new(NoteLockStyle::Stable),
            bucket_interval_ms: DEFAULT_BUCKET_INTERVAL_MS,
            frame_order: FrameOrderPolicy::Sort,
        }
    }
}

impl EngineConfig {
    pub fn with_hit_windows(mut self, windows: HitWindows) -> Self {
        self.hit_windows = Some(windows);
        self
    }

    pub fn with_lock(mut self, lock: LockPolicy) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_bucket_interval(mut self, interval_ms: f64) -> Self {
        self.bucket_interval_ms = interval_ms;
        self
    }

    pub fn with_frame_order(mut self, order: FrameOrderPolicy) -> Self {
        self.frame_order = order;
        self
    }

    pub fn ruleset(&self) -> Result<Ruleset, ConfigurationError> {
        let windows = match &self.hit_windows {
            Some(w) => w.clone(),
            None => HitWindows::for_od(self.overall_difficulty)?,
        };
        Ruleset::new(windows, self.lock, Ruleset::radius_for_cs(self.circle_size)?)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub engine: EngineConfig,
    pub log_level: LogLevel,
}

// --- File I/O ---

fn create_default_config_file(path: &Path) -> Result<(), ConfigurationError> {
    info!("'{}' not found, creating with default values.", path.display());
    let default = Config::default();
    let engine = &default.engine;

    let mut conf = Ini::new();
    conf.with_section(Some("Judge"))
        .set("OverallDifficulty", engine.overall_difficulty.to_string())
        .set("CircleSize", engine.circle_size.to_string())
        .set("HitWindows", "")
        .set("NoteLock", engine.lock.style.as_str())
        .set("LockDistance", "Unlimited");
    conf.with_section(Some("Engine"))
        .set("BucketInterval", engine.bucket_interval_ms.to_string())
        .set(
            "StrictFrameOrder",
            if engine.frame_order == FrameOrderPolicy::Strict { "1" } else { "0" },
        );
    conf.with_section(Some("Options")).set("LogLevel", default.log_level.as_str());
    conf.write_to_file(path)
        .map_err(|e| ConfigurationError::File(format!("{}: {e}", path.display())))
}

/// Reads `path`, writing a default file first when it does not exist.
pub fn load(path: &Path) -> Result<Config, ConfigurationError> {
    if !path.exists() {
        create_default_config_file(path)?;
    }
    let conf = Ini::load_from_file(path)
        .map_err(|e| ConfigurationError::File(format!("{}: {e}", path.display())))?;
    from_ini(&conf)
}

fn get<'a>(conf: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    conf.get_from(Some(section), key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_with<T>(
    conf: &Ini,
    section: &str,
    key: &'static str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<Option<T>, ConfigurationError> {
    match get(conf, section, key) {
        None => Ok(None),
        Some(v) => parse(v)
            .map(Some)
            .ok_or_else(|| ConfigurationError::UnknownValue { key, value: v.to_string() }),
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") || v.eq_ignore_ascii_case("on") {
        Some(true)
    } else if v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("no") || v.eq_ignore_ascii_case("off") {
        Some(false)
    } else {
        v.parse::<u8>().ok().map(|n| n != 0)
    }
}

fn parse_lock_distance(v: &str) -> Option<Option<f64>> {
    if v.eq_ignore_ascii_case("unlimited") || v.eq_ignore_ascii_case("none") {
        Some(None)
    } else {
        v.parse::<f64>().ok().map(Some)
    }
}

/// `Great,Ok,Meh` half-widths in ms; fewer entries drop the worse tiers.
fn parse_hit_windows(v: &str) -> Option<Result<HitWindows, ConfigurationError>> {
    let widths: Vec<f64> = v
        .split(',')
        .map(|w| w.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if widths.len() > 3 {
        return None;
    }
    let bands: Vec<(JudgeGrade, f64)> = JudgeGrade::ALL.into_iter().zip(widths).collect();
    Some(HitWindows::symmetric(&bands))
}

/// Builds a config from parsed ini contents, using defaults for missing keys.
pub fn from_ini(conf: &Ini) -> Result<Config, ConfigurationError> {
    let default = Config::default();
    let mut engine = default.engine.clone();

    if let Some(od) = parse_with(conf, "Judge", "OverallDifficulty", |v| v.parse::<f64>().ok())? {
        engine.overall_difficulty = od;
    }
    if let Some(cs) = parse_with(conf, "Judge", "CircleSize", |v| v.parse::<f64>().ok())? {
        engine.circle_size = cs;
    }
    if let Some(windows) = parse_with(conf, "Judge", "HitWindows", parse_hit_windows)? {
        engine.hit_windows = Some(windows?);
    }
    if let Some(style) = parse_with(conf, "Judge", "NoteLock", |v| NoteLockStyle::from_str(v).ok())? {
        engine.lock.style = style;
    }
    if let Some(distance) = parse_with(conf, "Judge", "LockDistance", parse_lock_distance)? {
        engine.lock.lock_distance_ms = distance;
    }
    if let Some(interval) = parse_with(conf, "Engine", "BucketInterval", |v| v.parse::<f64>().ok())? {
        engine.bucket_interval_ms = interval;
    }
    if let Some(strict) = parse_with(conf, "Engine", "StrictFrameOrder", parse_bool)? {
        engine.frame_order = if strict { FrameOrderPolicy::Strict } else { FrameOrderPolicy::Sort };
    }
    let log_level = parse_with(conf, "Options", "LogLevel", |v| LogLevel::from_str(v).ok())?
        .unwrap_or(default.log_level);

    // Surface inconsistent values here rather than at first query.
    engine.ruleset()?;
    if !engine.bucket_interval_ms.is_finite() || engine.bucket_interval_ms <= 0.0 {
        return Err(ConfigurationError::InvalidBucketInterval(engine.bucket_interval_ms));
    }

    Ok(Config { engine, log_level })
}
