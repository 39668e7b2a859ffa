use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NoteLockStyle {
    /// Any pending object may be hit at any time.
    None,
    /// A press is ignored while an earlier object is still pending.
    #[default]
    Stable,
    /// Nothing is locked; hitting an object misses every earlier pending one.
    Lazer,
    /// Stable, and slider checkpoints also wait for the earlier parts of their slider.
    Strict,
}

impl NoteLockStyle {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Stable => "Stable",
            Self::Lazer => "Lazer",
            Self::Strict => "Strict",
        }
    }
}

impl fmt::Display for NoteLockStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteLockStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "stable" => Ok(Self::Stable),
            "lazer" => Ok(Self::Lazer),
            "strict" => Ok(Self::Strict),
            _ => Err(()),
        }
    }
}

/// Lock strategy plus how far back (in ms of nominal time) an earlier pending
/// object still holds the lock. `None` distance means no limit.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LockPolicy {
    pub style: NoteLockStyle,
    pub lock_distance_ms: Option<f64>,
}

impl LockPolicy {
    pub const fn new(style: NoteLockStyle) -> Self {
        Self { style, lock_distance_ms: None }
    }

    pub fn with_distance(style: NoteLockStyle, distance_ms: f64) -> Result<Self, ConfigurationError> {
        let policy = Self { style, lock_distance_ms: Some(distance_ms) };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.lock_distance_ms {
            Some(d) if d.is_nan() || d < 0.0 => Err(ConfigurationError::InvalidLockDistance(d)),
            _ => Ok(()),
        }
    }

    #[inline(always)]
    pub const fn locks_objects(&self) -> bool {
        matches!(self.style, NoteLockStyle::Stable | NoteLockStyle::Strict)
    }

    #[inline(always)]
    pub const fn orders_parts(&self) -> bool {
        matches!(self.style, NoteLockStyle::Strict)
    }

    #[inline(always)]
    pub const fn force_misses(&self) -> bool {
        matches!(self.style, NoteLockStyle::Lazer)
    }

    /// Whether a pending object at `earlier_ms` still locks one at `later_ms`.
    #[inline(always)]
    pub fn within_distance(&self, earlier_ms: f64, later_ms: f64) -> bool {
        self.lock_distance_ms.is_none_or(|d| later_ms - earlier_ms <= d)
    }
}
