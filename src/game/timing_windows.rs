// Hit window definitions shared by judging, timeouts and the analysis views.

use smallvec::SmallVec;

use crate::error::ConfigurationError;
use crate::game::judgment::JudgeGrade;

// Base windows in ms at OD 0, and how much each OD point narrows them.
pub const BASE_GREAT_MS: f64 = 80.0;
pub const BASE_OK_MS: f64 = 140.0;
pub const BASE_MEH_MS: f64 = 200.0;
pub const GREAT_PER_OD_MS: f64 = 6.0;
pub const OK_PER_OD_MS: f64 = 8.0;
pub const MEH_PER_OD_MS: f64 = 10.0;

pub const MAX_DIFFICULTY: f64 = 11.0;

/// One tolerance band. `early` and `late` are magnitudes around the nominal time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitWindow {
    pub grade: JudgeGrade,
    pub early_ms: f64,
    pub late_ms: f64,
}

impl HitWindow {
    #[inline(always)]
    pub fn contains(&self, error_ms: f64) -> bool {
        error_ms >= -self.early_ms && error_ms <= self.late_ms
    }
}

/// Bands ordered strictest first; each band at least as wide as the previous.
#[derive(Clone, Debug, PartialEq)]
pub struct HitWindows {
    bands: SmallVec<[HitWindow; 4]>,
}

impl HitWindows {
    pub fn new(bands: &[HitWindow]) -> Result<Self, ConfigurationError> {
        if bands.is_empty() {
            return Err(ConfigurationError::EmptyHitWindows);
        }
        let mut prev: Option<&HitWindow> = None;
        for band in bands {
            if band.grade == JudgeGrade::Miss {
                return Err(ConfigurationError::MissBand);
            }
            let valid = |v: f64| v.is_finite() && v >= 0.0;
            if !valid(band.early_ms) || !valid(band.late_ms) {
                return Err(ConfigurationError::InvalidHitWindow {
                    grade: band.grade.as_str(),
                    early: band.early_ms,
                    late: band.late_ms,
                });
            }
            if let Some(p) = prev
                && (band.early_ms < p.early_ms || band.late_ms < p.late_ms || band.grade <= p.grade)
            {
                return Err(ConfigurationError::NonMonotonicHitWindows {
                    grade: band.grade.as_str(),
                });
            }
            prev = Some(band);
        }
        Ok(Self { bands: bands.iter().copied().collect() })
    }

    /// Symmetric table from `(grade, half_width_ms)` pairs.
    pub fn symmetric(bands: &[(JudgeGrade, f64)]) -> Result<Self, ConfigurationError> {
        let bands: SmallVec<[HitWindow; 4]> = bands
            .iter()
            .map(|&(grade, w)| HitWindow { grade, early_ms: w, late_ms: w })
            .collect();
        Self::new(&bands)
    }

    /// Great/Ok/Meh windows for an Overall Difficulty value.
    pub fn for_od(od: f64) -> Result<Self, ConfigurationError> {
        if !(0.0..=MAX_DIFFICULTY).contains(&od) {
            return Err(ConfigurationError::DifficultyOutOfRange {
                key: "OverallDifficulty",
                value: od,
            });
        }
        Self::symmetric(&[
            (JudgeGrade::Great, od.mul_add(-GREAT_PER_OD_MS, BASE_GREAT_MS)),
            (JudgeGrade::Ok, od.mul_add(-OK_PER_OD_MS, BASE_OK_MS)),
            (JudgeGrade::Meh, od.mul_add(-MEH_PER_OD_MS, BASE_MEH_MS)),
        ])
    }

    pub fn bands(&self) -> &[HitWindow] {
        &self.bands
    }

    #[inline(always)]
    pub fn widest(&self) -> HitWindow {
        // Construction guarantees at least one band.
        self.bands[self.bands.len() - 1]
    }

    /// Tier for a signed error (hit time minus nominal time). Boundaries are
    /// inclusive and the strictest containing band wins.
    #[inline(always)]
    pub fn classify(&self, error_ms: f64) -> Option<JudgeGrade> {
        self.bands.iter().find(|b| b.contains(error_ms)).map(|b| b.grade)
    }

    /// Time after which a press can no longer hit a part at `time`.
    #[inline(always)]
    pub fn close_time(&self, time: f64) -> f64 {
        time + self.widest().late_ms
    }
}
