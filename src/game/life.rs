use crate::game::judgment::JudgeGrade;
use crate::game::target::Part;

pub const INITIAL_LIFE: f64 = 1.0;
pub const MAX_LIFE: f64 = 1.0;

pub const LIFE_GREAT: f64 = 0.02;
pub const LIFE_OK: f64 = 0.01;
pub const LIFE_MEH: f64 = 0.0;
pub const LIFE_MISS: f64 = -0.08;
pub const LIFE_CHECKPOINT_HIT: f64 = 0.005;
pub const LIFE_CHECKPOINT_MISS: f64 = -0.02;

pub const fn life_delta(part: Part, grade: JudgeGrade) -> f64 {
    match (part, grade) {
        (Part::Tick(_) | Part::Repeat(_) | Part::Tail, JudgeGrade::Miss) => LIFE_CHECKPOINT_MISS,
        (Part::Tick(_) | Part::Repeat(_) | Part::Tail, _) => LIFE_CHECKPOINT_HIT,
        (_, JudgeGrade::Great) => LIFE_GREAT,
        (_, JudgeGrade::Ok) => LIFE_OK,
        (_, JudgeGrade::Meh) => LIFE_MEH,
        (_, JudgeGrade::Miss) => LIFE_MISS,
    }
}

#[inline(always)]
pub fn apply_life_change(life: f64, part: Part, grade: JudgeGrade) -> f64 {
    (life + life_delta(part, grade)).clamp(0.0, MAX_LIFE)
}
