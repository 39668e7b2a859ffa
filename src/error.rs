use thiserror::Error;

use crate::game::target::TargetId;

/// Target list could not be turned into an index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedTargetError {
    #[error("duplicate target id {0}")]
    DuplicateId(TargetId),
    #[error("target {id} has parts out of time order ({previous} ms before {time} ms)")]
    UnorderedParts {
        id: TargetId,
        previous: f64,
        time: f64,
    },
    #[error("target {id} has a non-finite time")]
    NonFiniteTime { id: TargetId },
}

/// Frame list violates non-decreasing time order (strict mode), or carries a
/// time that can never be ordered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnorderedInputError {
    #[error("frame {index} at {time} ms comes after a frame at {previous} ms")]
    OutOfOrder {
        index: usize,
        time: f64,
        previous: f64,
    },
    #[error("frame {index} has a non-finite time")]
    NonFiniteTime { index: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("hit window table is empty")]
    EmptyHitWindows,
    #[error("hit window for {grade} is invalid (early {early} ms, late {late} ms)")]
    InvalidHitWindow {
        grade: &'static str,
        early: f64,
        late: f64,
    },
    #[error("hit window for {grade} is narrower than the stricter window before it")]
    NonMonotonicHitWindows { grade: &'static str },
    #[error("hit window table must not contain a Miss band")]
    MissBand,
    #[error("bucket interval must be a positive finite number, got {0}")]
    InvalidBucketInterval(f64),
    #[error("bucket interval {interval_ms} ms would need {buckets} buckets (at most {max} allowed)")]
    TooManyBuckets {
        interval_ms: f64,
        buckets: f64,
        max: usize,
    },
    #[error("lock distance must be a non-negative number, got {0}")]
    InvalidLockDistance(f64),
    #[error("circle radius must be a positive finite number, got {0}")]
    InvalidCircleRadius(f32),
    #[error("difficulty value {key}={value} is out of range")]
    DifficultyOutOfRange { key: &'static str, value: f64 },
    #[error("unknown value '{value}' for {key}")]
    UnknownValue { key: &'static str, value: String },
    #[error("config file error: {0}")]
    File(String),
}

/// Anything that prevents an engine instance from being created.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Target(#[from] MalformedTargetError),
    #[error(transparent)]
    Input(#[from] UnorderedInputError),
    #[error(transparent)]
    Config(#[from] ConfigurationError),
}

/// A session file could not be read or decoded.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read session '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed session file: {0}")]
    Json(#[from] serde_json::Error),
}
