use std::fmt;

use serde::Serialize;

use crate::game::target::{Part, SubTargetId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeGrade {
    Great, // 300
    Ok,    // 100
    Meh,   // 50
    Miss,
}

impl JudgeGrade {
    pub const ALL: [JudgeGrade; 4] = [Self::Great, Self::Ok, Self::Meh, Self::Miss];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Great => "Great",
            Self::Ok => "Ok",
            Self::Meh => "Meh",
            Self::Miss => "Miss",
        }
    }

    #[inline(always)]
    pub const fn is_hit(self) -> bool {
        !matches!(self, Self::Miss)
    }
}

impl fmt::Display for JudgeGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What settled a judgement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "by", content = "frame", rename_all = "snake_case")]
pub enum Resolution {
    /// The input of this frame (a press, or what was held at a checkpoint).
    Frame(usize),
    /// No frame satisfied the part before its window closed.
    TimedOut,
    /// A later object was hit first by this frame under the lazer lock style.
    ForceMissed(usize),
    /// Part came due while an earlier part of its slider was pending.
    Blocked,
}

impl Resolution {
    pub const fn frame(self) -> Option<usize> {
        match self {
            Self::Frame(i) | Self::ForceMissed(i) => Some(i),
            Self::TimedOut | Self::Blocked => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Judgment {
    pub sub_target: SubTargetId,
    pub part: Part,
    pub grade: JudgeGrade,
    /// Resolution time minus nominal time.
    pub time_error_ms: f64,
    /// Simulated time at which this judgement became final.
    pub resolved_at: f64,
    pub resolution: Resolution,
    /// Position in the order judgements were applied to combo, score and life.
    pub sequence: u32,
}

pub const SCORE_TICK: u64 = 10;
pub const SCORE_REPEAT: u64 = 30;
pub const SCORE_TAIL: u64 = 30;
const COMBO_BONUS_DIVISOR: u64 = 25;

pub const fn hit_value(grade: JudgeGrade) -> u64 {
    match grade {
        JudgeGrade::Great => 300,
        JudgeGrade::Ok => 100,
        JudgeGrade::Meh => 50,
        JudgeGrade::Miss => 0,
    }
}

/// Score gained by a judgement given the combo right before it (ScoreV1 style):
/// objects gain a combo bonus, slider checkpoints are flat.
pub fn score_for(part: Part, grade: JudgeGrade, combo_before: u32) -> u64 {
    if !grade.is_hit() {
        return 0;
    }
    match part {
        Part::Tick(_) => SCORE_TICK,
        Part::Repeat(_) => SCORE_REPEAT,
        Part::Tail => SCORE_TAIL,
        Part::Circle | Part::Head | Part::Spinner => {
            let value = hit_value(grade);
            value + value * u64::from(combo_before) / COMBO_BONUS_DIVISOR
        }
    }
}

/// Counts per tier, split by whether the part is an object or a checkpoint.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GradeCounts {
    pub great: u32,
    pub ok: u32,
    pub meh: u32,
    pub miss: u32,
    pub checkpoints_hit: u32,
    pub checkpoints_missed: u32,
}

impl GradeCounts {
    pub fn record(&mut self, part: Part, grade: JudgeGrade) {
        let slot = match (part, grade) {
            (Part::Tick(_) | Part::Repeat(_) | Part::Tail, JudgeGrade::Miss) => {
                &mut self.checkpoints_missed
            }
            (Part::Tick(_) | Part::Repeat(_) | Part::Tail, _) => &mut self.checkpoints_hit,
            (_, JudgeGrade::Great) => &mut self.great,
            (_, JudgeGrade::Ok) => &mut self.ok,
            (_, JudgeGrade::Meh) => &mut self.meh,
            (_, JudgeGrade::Miss) => &mut self.miss,
        };
        *slot = slot.saturating_add(1);
    }

    pub const fn objects(&self) -> u32 {
        self.great + self.ok + self.meh + self.miss
    }

    /// Accuracy as a 0.0-1.0 ratio over judged objects; 1.0 when nothing is judged.
    pub fn accuracy(&self) -> f64 {
        let total = self.objects();
        if total == 0 {
            return 1.0;
        }
        let points = u64::from(self.great) * 300 + u64::from(self.ok) * 100 + u64::from(self.meh) * 50;
        points as f64 / (u64::from(total) * 300) as f64
    }
}
