use serde::Serialize;

use crate::game::judgment::{GradeCounts, Judgment};
use crate::game::life::INITIAL_LIFE;
use crate::game::target::SubTargetId;

/// A press that would have hit `sub_target` but was refused by the lock policy.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct NoteLockRecord {
    pub frame: usize,
    pub time: f64,
    pub sub_target: SubTargetId,
    pub blocked_by: SubTargetId,
}

/// Aggregates of a snapshot, as reported to viewers.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct StateSummary {
    pub time: f64,
    pub judged: usize,
    pub pending: usize,
    pub frames_consumed: usize,
    pub combo: u32,
    pub max_combo: u32,
    pub score: u64,
    pub accuracy: f64,
    pub life: f64,
    pub counts: GradeCounts,
    pub note_locks: usize,
}

/// Judged condition of a session at one instant.
///
/// A snapshot is a plain value: the same targets, frames and rules always
/// produce an equal snapshot for the same time, however it was reached.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    /// Every due item at or before this time has been resolved.
    pub(crate) time: f64,
    /// Number of frames consumed so far.
    pub(crate) next_frame: usize,
    /// Position in the due schedule.
    pub(crate) due_cursor: usize,
    pub(crate) judgments: Vec<Option<Judgment>>,
    /// Slider parts that came due while an earlier part was pending.
    pub(crate) blocked: Vec<SubTargetId>,
    /// Held time per spinner, accumulated between consumed frames.
    pub(crate) spin_held_ms: Vec<f64>,
    pub(crate) note_locks: Vec<NoteLockRecord>,
    pub(crate) resolved: usize,

    pub combo: u32,
    pub max_combo: u32,
    pub counts: GradeCounts,
    pub score: u64,
    pub life: f64,
}

impl GameState {
    pub(crate) fn new(sub_targets: usize, spinners: usize) -> Self {
        Self {
            time: f64::NEG_INFINITY,
            next_frame: 0,
            due_cursor: 0,
            judgments: vec![None; sub_targets],
            blocked: Vec::new(),
            spin_held_ms: vec![0.0; spinners],
            note_locks: Vec::new(),
            resolved: 0,
            combo: 0,
            max_combo: 0,
            counts: GradeCounts::default(),
            score: 0,
            life: INITIAL_LIFE,
        }
    }

    #[inline(always)]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Index of the last consumed frame.
    #[inline(always)]
    pub fn last_frame(&self) -> Option<usize> {
        self.next_frame.checked_sub(1)
    }

    #[inline(always)]
    pub fn frames_consumed(&self) -> usize {
        self.next_frame
    }

    #[inline(always)]
    pub fn judgment(&self, id: SubTargetId) -> Option<&Judgment> {
        self.judgments.get(id.index()).and_then(Option::as_ref)
    }

    #[inline(always)]
    pub fn is_resolved(&self, id: SubTargetId) -> bool {
        self.judgment(id).is_some()
    }

    /// Recorded judgements in target order.
    pub fn judgments(&self) -> impl Iterator<Item = &Judgment> + '_ {
        self.judgments.iter().flatten()
    }

    pub fn pending(&self) -> impl Iterator<Item = SubTargetId> + '_ {
        self.judgments
            .iter()
            .enumerate()
            .filter(|(_, j)| j.is_none())
            .map(|(i, _)| SubTargetId(i as u32))
    }

    #[inline(always)]
    pub fn judged_count(&self) -> usize {
        self.resolved
    }

    #[inline(always)]
    pub fn pending_count(&self) -> usize {
        self.judgments.len() - self.resolved
    }

    #[inline(always)]
    pub fn is_complete(&self) -> bool {
        self.pending_count() == 0
    }

    pub fn note_locks(&self) -> &[NoteLockRecord] {
        &self.note_locks
    }

    pub fn accuracy(&self) -> f64 {
        self.counts.accuracy()
    }

    pub fn summary(&self) -> StateSummary {
        StateSummary {
            time: self.time,
            judged: self.judged_count(),
            pending: self.pending_count(),
            frames_consumed: self.frames_consumed(),
            combo: self.combo,
            max_combo: self.max_combo,
            score: self.score,
            accuracy: self.accuracy(),
            life: self.life,
            counts: self.counts,
            note_locks: self.note_locks.len(),
        }
    }
}
