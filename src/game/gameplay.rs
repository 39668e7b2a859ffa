use log::{info, trace};
use smallvec::SmallVec;

use crate::error::ConfigurationError;
use crate::game::frames::{FrameStream, InputFrame};
use crate::game::judgment::{self, JudgeGrade, Judgment, Resolution};
use crate::game::life::apply_life_change;
use crate::game::note_lock::LockPolicy;
use crate::game::state::{GameState, NoteLockRecord};
use crate::game::target::{SubTarget, SubTargetId, Trigger};
use crate::game::target_index::TargetIndex;
use crate::game::timing_windows::{HitWindows, MAX_DIFFICULTY};

// Circle radius at CS 0 and how much each CS point shrinks it.
pub const BASE_CIRCLE_RADIUS: f32 = 54.4;
pub const CIRCLE_RADIUS_PER_CS: f32 = 4.48;
/// Follow circle size relative to the object radius.
pub const FOLLOW_RADIUS_SCALE: f32 = 2.4;

// Held ratio needed per tier on a spinner.
pub const SPINNER_GREAT_RATIO: f64 = 0.9;
pub const SPINNER_OK_RATIO: f64 = 0.5;
pub const SPINNER_MEH_RATIO: f64 = 0.25;

/// Everything that decides how input is judged. Read-only for a session.
#[derive(Clone, Debug, PartialEq)]
pub struct Ruleset {
    pub hit_windows: HitWindows,
    pub lock: LockPolicy,
    pub circle_radius: f32,
}

impl Ruleset {
    pub fn new(hit_windows: HitWindows, lock: LockPolicy, circle_radius: f32) -> Result<Self, ConfigurationError> {
        if !circle_radius.is_finite() || circle_radius <= 0.0 {
            return Err(ConfigurationError::InvalidCircleRadius(circle_radius));
        }
        lock.validate()?;
        Ok(Self { hit_windows, lock, circle_radius })
    }

    pub fn radius_for_cs(cs: f64) -> Result<f32, ConfigurationError> {
        if !(0.0..=MAX_DIFFICULTY).contains(&cs) {
            return Err(ConfigurationError::DifficultyOutOfRange { key: "CircleSize", value: cs });
        }
        Ok((cs as f32).mul_add(-CIRCLE_RADIUS_PER_CS, BASE_CIRCLE_RADIUS))
    }

    #[inline(always)]
    pub fn follow_radius(&self) -> f32 {
        self.circle_radius * FOLLOW_RADIUS_SCALE
    }
}

#[inline(always)]
fn spinner_grade(ratio: f64) -> JudgeGrade {
    if ratio >= SPINNER_GREAT_RATIO {
        JudgeGrade::Great
    } else if ratio >= SPINNER_OK_RATIO {
        JudgeGrade::Ok
    } else if ratio >= SPINNER_MEH_RATIO {
        JudgeGrade::Meh
    } else {
        JudgeGrade::Miss
    }
}

/// Orderings derived once from the index and the rules.
#[derive(Clone, Debug, Default)]
struct Schedule {
    /// Press-triggered parts by (time, id).
    press: Vec<SubTargetId>,
    /// Every part by (due time, id): window close, checkpoint time, spinner end.
    due: Vec<(f64, SubTargetId)>,
    spinners: Vec<SubTargetId>,
    /// Latest spinner end among `spinners[..=i]`; non-decreasing.
    spinner_reach: Vec<f64>,
}

impl Schedule {
    fn build(index: &TargetIndex, windows: &HitWindows) -> Self {
        let subs = index.sub_targets();
        let mut press: Vec<SubTargetId> =
            subs.iter().filter(|s| s.part.is_press()).map(|s| s.id).collect();
        press.sort_by(|a, b| {
            subs[a.index()].time.total_cmp(&subs[b.index()].time).then(a.cmp(b))
        });

        let mut due: Vec<(f64, SubTargetId)> = subs
            .iter()
            .map(|s| {
                let t = match s.part.trigger() {
                    Trigger::Press => windows.close_time(s.time),
                    Trigger::Tracking => s.time,
                    Trigger::Duration => s.end_time,
                };
                (t, s.id)
            })
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let spinners: Vec<SubTargetId> = subs
            .iter()
            .filter(|s| matches!(s.part.trigger(), Trigger::Duration))
            .map(|s| s.id)
            .collect();
        let spinner_reach = spinners
            .iter()
            .scan(f64::NEG_INFINITY, |reach, id| {
                *reach = reach.max(subs[id.index()].end_time);
                Some(*reach)
            })
            .collect();
        Self { press, due, spinners, spinner_reach }
    }
}

/// The judgement state machine: immutable session inputs plus the pure
/// transitions that move a [`GameState`] forward in time.
#[derive(Clone, Debug)]
pub struct Simulation {
    index: TargetIndex,
    frames: FrameStream,
    rules: Ruleset,
    schedule: Schedule,
}

impl Simulation {
    pub fn new(index: TargetIndex, frames: FrameStream, rules: Ruleset) -> Self {
        let schedule = Schedule::build(&index, &rules.hit_windows);
        info!(
            "Simulation ready: {} parts, {} frames, lock={}, widest window={:.1} ms",
            index.len(),
            frames.len(),
            rules.lock.style,
            rules.hit_windows.widest().late_ms
        );
        Self { index, frames, rules, schedule }
    }

    pub fn index(&self) -> &TargetIndex {
        &self.index
    }

    pub fn frames(&self) -> &FrameStream {
        &self.frames
    }

    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    /// Time by which every part has been resolved and every frame consumed.
    pub fn duration(&self) -> f64 {
        let last_due = self.schedule.due.last().map_or(0.0, |d| d.0);
        let last_frame = self.frames.last_time().unwrap_or(0.0);
        last_due.max(last_frame).max(0.0)
    }

    /// All parts pending, no frame consumed.
    pub fn initial_state(&self) -> GameState {
        GameState::new(self.index.len(), self.schedule.spinners.len())
    }

    /// Applies the next unconsumed frame. Returns the state unchanged once every
    /// frame has been consumed.
    pub fn advance(&self, mut state: GameState) -> GameState {
        self.advance_in_place(&mut state);
        state
    }

    /// Resolves everything due at or before `t` without consuming frames.
    pub fn settle(&self, mut state: GameState, t: f64) -> GameState {
        self.settle_in_place(&mut state, t);
        state
    }

    /// Consumes every frame at or before `t`, then settles to `t`.
    pub fn run_until(&self, mut state: GameState, t: f64) -> GameState {
        while self.frames.get(state.next_frame).is_some_and(|f| f.time <= t) {
            self.advance_in_place(&mut state);
        }
        self.settle_in_place(&mut state, t);
        state
    }

    fn advance_in_place(&self, state: &mut GameState) {
        let index = state.next_frame;
        let Some(frame) = self.frames.get(index) else {
            return;
        };
        self.resolve_due(state, |due| due < frame.time);
        self.accumulate_spin(state, frame);
        let previous = state.last_frame().and_then(|i| self.frames.get(i));
        if !frame.pressed_since(previous).is_empty() {
            self.judge_press(state, index, frame);
        }
        state.next_frame = index + 1;
    }

    fn settle_in_place(&self, state: &mut GameState, t: f64) {
        self.resolve_due(state, |due| due <= t);
        if t > state.time {
            state.time = t;
        }
    }

    fn resolve_due(&self, state: &mut GameState, within: impl Fn(f64) -> bool) {
        while let Some(&(due, id)) = self.schedule.due.get(state.due_cursor) {
            if !within(due) {
                break;
            }
            state.due_cursor += 1;
            if state.is_resolved(id) {
                continue;
            }
            let sub = &self.index.sub_targets()[id.index()];
            match sub.part.trigger() {
                Trigger::Press => {
                    self.record(state, sub, JudgeGrade::Miss, due - sub.time, due, Resolution::TimedOut);
                }
                Trigger::Tracking => self.judge_checkpoint(state, sub, due),
                Trigger::Duration => self.judge_spinner(state, sub, due),
            }
        }
    }

    fn has_pending_sibling_before(&self, state: &GameState, sub: &SubTarget) -> bool {
        (sub.first_sibling.0..sub.id.0).any(|i| !state.is_resolved(SubTargetId(i)))
    }

    fn judge_checkpoint(&self, state: &mut GameState, sub: &SubTarget, due: f64) {
        if self.rules.lock.orders_parts() && self.has_pending_sibling_before(state, sub) {
            state.blocked.push(sub.id);
            return;
        }
        let last = state.last_frame();
        let follow = self.rules.follow_radius();
        let tracked = last
            .and_then(|i| self.frames.get(i))
            .is_some_and(|f| f.is_holding() && f.position.distance(sub.position) <= follow);
        let grade = if tracked { JudgeGrade::Great } else { JudgeGrade::Miss };
        let resolution = last.map_or(Resolution::TimedOut, Resolution::Frame);
        self.record(state, sub, grade, 0.0, due, resolution);
    }

    fn spinner_slot(&self, id: SubTargetId) -> Option<usize> {
        self.schedule.spinners.binary_search(&id).ok()
    }

    fn judge_spinner(&self, state: &mut GameState, sub: &SubTarget, end: f64) {
        let Some(slot) = self.spinner_slot(sub.id) else {
            return;
        };
        let last = state.last_frame();
        let last_frame = last.and_then(|i| self.frames.get(i));
        let holding = last_frame.is_some_and(InputFrame::is_holding);
        let mut held = state.spin_held_ms[slot];
        if let Some(f) = last_frame
            && holding
        {
            held += (end - f.time.max(sub.time)).max(0.0);
        }
        let length = sub.end_time - sub.time;
        let ratio = if length > 0.0 {
            held / length
        } else if holding {
            1.0
        } else {
            0.0
        };
        let resolution = last.map_or(Resolution::TimedOut, Resolution::Frame);
        self.record(state, sub, spinner_grade(ratio), 0.0, end, resolution);
    }

    fn accumulate_spin(&self, state: &mut GameState, frame: &InputFrame) {
        let Some(previous) = state.last_frame().and_then(|i| self.frames.get(i)) else {
            return;
        };
        if !previous.is_holding() {
            return;
        }
        let subs = self.index.sub_targets();
        let spinners = &self.schedule.spinners;
        // Spinners are in start order; none before `first` is still running.
        let first = self.schedule.spinner_reach.partition_point(|&end| end < previous.time);
        let last = spinners.partition_point(|id| subs[id.index()].time < frame.time);
        for slot in first..last.max(first) {
            let id = spinners[slot];
            if state.is_resolved(id) {
                continue;
            }
            let sub = &subs[id.index()];
            let from = previous.time.max(sub.time);
            let to = frame.time.min(sub.end_time);
            if to > from {
                state.spin_held_ms[slot] += to - from;
            }
        }
    }

    fn judge_press(&self, state: &mut GameState, frame_index: usize, frame: &InputFrame) {
        let windows = &self.rules.hit_windows;
        let lock = self.rules.lock;
        let widest = windows.widest();
        let earliest = frame.time - widest.late_ms;
        let latest = frame.time + widest.early_ms;
        let subs = self.index.sub_targets();

        let start = self.schedule.press.partition_point(|id| subs[id.index()].time < earliest);
        let mut pending_before: SmallVec<[&SubTarget; 4]> = SmallVec::new();

        for &id in &self.schedule.press[start..] {
            let sub = &subs[id.index()];
            if sub.time > latest {
                break;
            }
            if state.is_resolved(id) {
                continue;
            }
            let error = frame.time - sub.time;
            let on_target = frame.position.distance(sub.position) <= self.rules.circle_radius;

            if lock.locks_objects()
                && let Some(blocker) = pending_before
                    .iter()
                    .find(|b| lock.within_distance(b.time, sub.time))
            {
                if on_target {
                    trace!("Note lock: frame {frame_index} refused part {} (blocked by {})", id.0, blocker.id.0);
                    state.note_locks.push(NoteLockRecord {
                        frame: frame_index,
                        time: frame.time,
                        sub_target: id,
                        blocked_by: blocker.id,
                    });
                }
                pending_before.push(sub);
                continue;
            }

            let Some(grade) = windows.classify(error).filter(|_| on_target) else {
                pending_before.push(sub);
                continue;
            };

            if lock.force_misses() {
                for earlier in pending_before.drain(..) {
                    self.record(
                        state,
                        earlier,
                        JudgeGrade::Miss,
                        frame.time - earlier.time,
                        frame.time,
                        Resolution::ForceMissed(frame_index),
                    );
                }
            }
            self.record(state, sub, grade, error, frame.time, Resolution::Frame(frame_index));
        }
    }

    fn record(
        &self,
        state: &mut GameState,
        sub: &SubTarget,
        grade: JudgeGrade,
        time_error_ms: f64,
        resolved_at: f64,
        resolution: Resolution,
    ) {
        let slot = &mut state.judgments[sub.id.index()];
        if slot.is_some() {
            return;
        }
        *slot = Some(Judgment {
            sub_target: sub.id,
            part: sub.part,
            grade,
            time_error_ms,
            resolved_at,
            resolution,
            sequence: state.resolved as u32,
        });
        state.resolved += 1;

        state.score += judgment::score_for(sub.part, grade, state.combo);
        state.counts.record(sub.part, grade);
        state.life = apply_life_change(state.life, sub.part, grade);
        if grade.is_hit() {
            state.combo += 1;
            state.max_combo = state.max_combo.max(state.combo);
        } else {
            state.combo = 0;
        }
        trace!(
            "JUDGE: target={}, part={:?}, grade={grade}, error_ms={time_error_ms:.2}, at={resolved_at:.1}, by={resolution:?}",
            sub.target,
            sub.part,
        );

        if self.rules.lock.orders_parts() && !state.blocked.is_empty() {
            self.release_blocked(state, sub, resolved_at);
        }
    }

    /// Blocked parts of the same slider whose earlier parts are now all resolved
    /// can never be tracked any more.
    fn release_blocked(&self, state: &mut GameState, sub: &SubTarget, at: f64) {
        let subs = self.index.sub_targets();
        while let Some(pos) = state.blocked.iter().position(|id| {
            let other = &subs[id.index()];
            other.first_sibling == sub.first_sibling && !self.has_pending_sibling_before(state, other)
        }) {
            let other = &subs[state.blocked.remove(pos).index()];
            self.record(state, other, JudgeGrade::Miss, at - other.time, at, Resolution::Blocked);
        }
    }
}
