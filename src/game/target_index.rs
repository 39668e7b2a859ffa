use std::ops::Range;

use glam::Vec2;
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::MalformedTargetError;
use crate::game::target::{CheckpointKind, Part, SubTarget, SubTargetId, Target, TargetId, TargetKind};

/// Flattened, read-only view of every judgeable piece of the map.
///
/// Targets are ordered by start time (ties keep input order), and each target's
/// parts follow it in structural order: head, checkpoints, tail.
#[derive(Clone, Debug, Default)]
pub struct TargetIndex {
    targets: Vec<Target>,
    subs: Vec<SubTarget>,
    ranges: FxHashMap<TargetId, Range<usize>>,
}

impl TargetIndex {
    pub fn build(targets: Vec<Target>) -> Result<Self, MalformedTargetError> {
        let mut seen = FxHashSet::default();
        for t in &targets {
            if !seen.insert(t.id) {
                return Err(MalformedTargetError::DuplicateId(t.id));
            }
            validate_parts(t)?;
        }

        let mut targets = targets;
        targets.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut subs = Vec::with_capacity(targets.len());
        let mut ranges = FxHashMap::default();
        for t in &targets {
            let start = subs.len();
            let first = SubTargetId(start as u32);
            let mut push = |part: Part, time: f64, end_time: f64, position: Vec2| {
                let id = SubTargetId(subs.len() as u32);
                subs.push(SubTarget { id, target: t.id, part, time, end_time, position, first_sibling: first });
            };
            match &t.kind {
                TargetKind::Circle => push(Part::Circle, t.time, t.time, t.position),
                TargetKind::Slider { checkpoints, end_time, end_position } => {
                    push(Part::Head, t.time, t.time, t.position);
                    let (mut ticks, mut repeats) = (0u16, 0u16);
                    for cp in checkpoints {
                        let part = match cp.kind {
                            CheckpointKind::Tick => {
                                ticks += 1;
                                Part::Tick(ticks - 1)
                            }
                            CheckpointKind::Repeat => {
                                repeats += 1;
                                Part::Repeat(repeats - 1)
                            }
                        };
                        push(part, cp.time, cp.time, cp.position);
                    }
                    push(Part::Tail, *end_time, *end_time, *end_position);
                }
                TargetKind::Spinner { end_time } => {
                    push(Part::Spinner, t.time, *end_time, t.position)
                }
            }
            ranges.insert(t.id, start..subs.len());
        }

        debug!("Target index built: {} targets, {} sub-targets", targets.len(), subs.len());
        Ok(Self { targets, subs, ranges })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, id: SubTargetId) -> Option<&SubTarget> {
        self.subs.get(id.index())
    }

    #[inline(always)]
    pub fn sub_targets(&self) -> &[SubTarget] {
        &self.subs
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// All parts belonging to `id`, in structural order.
    pub fn parts_of(&self, id: TargetId) -> &[SubTarget] {
        self.ranges.get(&id).map(|r| &self.subs[r.clone()]).unwrap_or_default()
    }

    /// Latest time any part refers to.
    pub fn last_time(&self) -> Option<f64> {
        self.subs.iter().map(|s| s.end_time).reduce(f64::max)
    }
}

fn validate_parts(t: &Target) -> Result<(), MalformedTargetError> {
    if !t.time.is_finite() {
        return Err(MalformedTargetError::NonFiniteTime { id: t.id });
    }
    let ordered = |previous: f64, time: f64| {
        if !time.is_finite() {
            Err(MalformedTargetError::NonFiniteTime { id: t.id })
        } else if time < previous {
            Err(MalformedTargetError::UnorderedParts { id: t.id, previous, time })
        } else {
            Ok(time)
        }
    };
    match &t.kind {
        TargetKind::Circle => Ok(()),
        TargetKind::Slider { checkpoints, end_time, .. } => {
            let mut last = t.time;
            for cp in checkpoints {
                last = ordered(last, cp.time)?;
            }
            ordered(last, *end_time).map(|_| ())
        }
        TargetKind::Spinner { end_time } => ordered(t.time, *end_time).map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::target::Checkpoint;

    fn tick(time: f64) -> Checkpoint {
        Checkpoint { kind: CheckpointKind::Tick, time, position: Vec2::ZERO }
    }

    #[test]
    fn flattens_slider_parts_in_structural_order() {
        let index = TargetIndex::build(vec![
            Target::slider(7, 100.0, Vec2::ZERO, vec![tick(150.0), tick(200.0)], 300.0, Vec2::X),
            Target::circle(3, 50.0, Vec2::ZERO),
        ])
        .expect("valid targets");

        let parts: Vec<Part> = index.sub_targets().iter().map(|s| s.part).collect();
        assert_eq!(
            parts,
            vec![Part::Circle, Part::Head, Part::Tick(0), Part::Tick(1), Part::Tail]
        );
        assert_eq!(index.parts_of(7).len(), 4);
        assert_eq!(index.parts_of(7)[0].first_sibling, SubTargetId(1));
        assert_eq!(index.last_time(), Some(300.0));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = TargetIndex::build(vec![
            Target::circle(1, 0.0, Vec2::ZERO),
            Target::circle(1, 10.0, Vec2::ZERO),
        ])
        .unwrap_err();
        assert_eq!(err, MalformedTargetError::DuplicateId(1));
    }

    #[test]
    fn rejects_unordered_slider_parts() {
        let err = TargetIndex::build(vec![Target::slider(
            1,
            100.0,
            Vec2::ZERO,
            vec![tick(200.0), tick(150.0)],
            300.0,
            Vec2::ZERO,
        )])
        .unwrap_err();
        assert!(matches!(err, MalformedTargetError::UnorderedParts { id: 1, .. }));
    }

    #[test]
    fn rejects_spinner_ending_before_start() {
        let err = TargetIndex::build(vec![Target::spinner(4, 500.0, 400.0, Vec2::ZERO)]).unwrap_err();
        assert!(matches!(err, MalformedTargetError::UnorderedParts { id: 4, .. }));
    }

    #[test]
    fn unknown_target_has_no_parts() {
        let index = TargetIndex::build(Vec::new()).expect("empty is valid");
        assert!(index.is_empty());
        assert!(index.parts_of(42).is_empty());
        assert_eq!(index.last_time(), None);
    }
}
