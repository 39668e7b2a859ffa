use serde::Serialize;

use crate::game::judgment::JudgeGrade;
use crate::game::state::GameState;
use crate::game::target::{Part, SubTarget, SubTargetId, TargetId};
use crate::game::target_index::TargetIndex;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Judgment,
    /// A miss that ended a streak of at least one hit.
    ComboBreak,
    /// A press on this part was refused by the lock policy.
    NoteLock,
}

/// Flat analysis record for viewers and exporters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub kind: EventKind,
    pub target: TargetId,
    pub sub_target: SubTargetId,
    pub part: Part,
    /// Nominal time of the part.
    pub time: f64,
    pub grade: Option<JudgeGrade>,
    pub time_error_ms: Option<f64>,
    /// Streak length that was broken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combo: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<usize>,
}

impl Event {
    fn new(kind: EventKind, sub: &SubTarget) -> Self {
        Self {
            kind,
            target: sub.target,
            sub_target: sub.id,
            part: sub.part,
            time: sub.time,
            grade: None,
            time_error_ms: None,
            combo: None,
            frame: None,
        }
    }
}

/// Projects a snapshot into events ordered by the nominal time of their parts.
///
/// Combo breaks are found in the order judgements were applied, which is the
/// order the snapshot's combo saw them, and are then placed at the missed part.
pub fn extract(state: &GameState, index: &TargetIndex) -> Vec<Event> {
    let mut judged: Vec<(&SubTarget, _)> = state
        .judgments()
        .filter_map(|j| index.get(j.sub_target).map(|sub| (sub, j)))
        .collect();
    judged.sort_by_key(|(_, j)| j.sequence);

    let mut events = Vec::with_capacity(judged.len() + state.note_locks().len());
    let mut streak: u32 = 0;
    for (sub, j) in judged {
        events.push(Event {
            grade: Some(j.grade),
            time_error_ms: Some(j.time_error_ms),
            frame: j.resolution.frame(),
            ..Event::new(EventKind::Judgment, sub)
        });
        if j.grade.is_hit() {
            streak += 1;
        } else {
            if streak > 0 {
                events.push(Event {
                    grade: Some(j.grade),
                    combo: Some(streak),
                    ..Event::new(EventKind::ComboBreak, sub)
                });
            }
            streak = 0;
        }
    }

    for lock in state.note_locks() {
        let Some(sub) = index.get(lock.sub_target) else {
            continue;
        };
        events.push(Event {
            time_error_ms: Some(lock.time - sub.time),
            frame: Some(lock.frame),
            ..Event::new(EventKind::NoteLock, sub)
        });
    }

    events.sort_by(|a, b| {
        a.time
            .total_cmp(&b.time)
            .then(a.sub_target.cmp(&b.sub_target))
            .then(a.kind.cmp(&b.kind))
    });
    events
}

/// Judgement events only, the shape most viewers draw from.
pub fn judgments_only(events: &[Event]) -> impl Iterator<Item = &Event> {
    events.iter().filter(|e| e.kind == EventKind::Judgment)
}
