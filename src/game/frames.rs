use bitflags::bitflags;
use glam::Vec2;
use log::warn;

use crate::error::UnorderedInputError;

bitflags! {
    /// Buttons held in a recorded frame.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Buttons: u8 {
        const M1 = 1 << 0;
        const M2 = 1 << 1;
        const K1 = 1 << 2;
        const K2 = 1 << 3;
        const SMOKE = 1 << 4;
    }
}

impl Buttons {
    /// Buttons that count towards hitting and holding.
    #[inline(always)]
    pub fn gameplay(self) -> Self {
        self - Self::SMOKE
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InputFrame {
    pub time: f64,
    pub position: Vec2,
    pub buttons: Buttons,
}

impl InputFrame {
    pub const fn new(time: f64, position: Vec2, buttons: Buttons) -> Self {
        Self { time, position, buttons }
    }

    #[inline(always)]
    pub fn is_holding(&self) -> bool {
        !self.buttons.gameplay().is_empty()
    }

    /// Buttons that went down in this frame relative to `previous`.
    #[inline(always)]
    pub fn pressed_since(&self, previous: Option<&InputFrame>) -> Buttons {
        let before = previous.map_or(Buttons::empty(), |p| p.buttons.gameplay());
        self.buttons.gameplay() - before
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FrameOrderPolicy {
    /// Stable sort by time; ties keep recorded order.
    #[default]
    Sort,
    /// Refuse out-of-order frames.
    Strict,
}

/// Time-ordered, immutable recorded input.
#[derive(Clone, Debug, Default)]
pub struct FrameStream {
    frames: Vec<InputFrame>,
}

impl FrameStream {
    pub fn build(
        mut frames: Vec<InputFrame>,
        policy: FrameOrderPolicy,
    ) -> Result<Self, UnorderedInputError> {
        if let Some(index) = frames.iter().position(|f| !f.time.is_finite()) {
            return Err(UnorderedInputError::NonFiniteTime { index });
        }
        let first_violation = frames
            .windows(2)
            .position(|w| w[1].time < w[0].time)
            .map(|i| i + 1);
        if let Some(index) = first_violation {
            match policy {
                FrameOrderPolicy::Strict => {
                    return Err(UnorderedInputError::OutOfOrder {
                        index,
                        time: frames[index].time,
                        previous: frames[index - 1].time,
                    });
                }
                FrameOrderPolicy::Sort => {
                    warn!(
                        "Frame {index} at {:.1} ms is out of order; re-sorting {} frames.",
                        frames[index].time,
                        frames.len()
                    );
                    frames.sort_by(|a, b| a.time.total_cmp(&b.time));
                }
            }
        }
        Ok(Self { frames })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<&InputFrame> {
        self.frames.get(index)
    }

    pub fn as_slice(&self) -> &[InputFrame] {
        &self.frames
    }

    /// Index of the last frame with `time <= t`.
    #[inline(always)]
    pub fn last_at_or_before(&self, t: f64) -> Option<usize> {
        self.frames.partition_point(|f| f.time <= t).checked_sub(1)
    }

    pub fn last_time(&self) -> Option<f64> {
        self.frames.last().map(|f| f.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(time: f64, x: f32) -> InputFrame {
        InputFrame::new(time, Vec2::new(x, 0.0), Buttons::empty())
    }

    #[test]
    fn sort_policy_is_stable_for_ties() {
        let stream = FrameStream::build(
            vec![frame(20.0, 1.0), frame(10.0, 2.0), frame(20.0, 3.0), frame(10.0, 4.0)],
            FrameOrderPolicy::Sort,
        )
        .expect("sort never fails on finite times");
        let xs: Vec<f32> = stream.as_slice().iter().map(|f| f.position.x).collect();
        assert_eq!(xs, vec![2.0, 4.0, 1.0, 3.0]);
    }

    #[test]
    fn strict_policy_reports_first_violation() {
        let err = FrameStream::build(
            vec![frame(0.0, 0.0), frame(30.0, 0.0), frame(25.0, 0.0)],
            FrameOrderPolicy::Strict,
        )
        .unwrap_err();
        assert_eq!(
            err,
            UnorderedInputError::OutOfOrder { index: 2, time: 25.0, previous: 30.0 }
        );
    }

    #[test]
    fn non_finite_times_are_rejected_under_both_policies() {
        for policy in [FrameOrderPolicy::Sort, FrameOrderPolicy::Strict] {
            let err = FrameStream::build(vec![frame(0.0, 0.0), frame(f64::NAN, 0.0)], policy)
                .unwrap_err();
            assert_eq!(err, UnorderedInputError::NonFiniteTime { index: 1 });
        }
    }

    #[test]
    fn last_at_or_before_is_inclusive() {
        let stream = FrameStream::build(
            vec![frame(-5.0, 0.0), frame(10.0, 0.0), frame(10.0, 0.0), frame(40.0, 0.0)],
            FrameOrderPolicy::Strict,
        )
        .expect("ordered");
        assert_eq!(stream.last_at_or_before(-6.0), None);
        assert_eq!(stream.last_at_or_before(-5.0), Some(0));
        assert_eq!(stream.last_at_or_before(10.0), Some(2));
        assert_eq!(stream.last_at_or_before(39.9), Some(2));
        assert_eq!(stream.last_at_or_before(1e9), Some(3));
    }

    #[test]
    fn presses_are_rising_edges_without_smoke() {
        let held = InputFrame::new(0.0, Vec2::ZERO, Buttons::K1);
        let both = InputFrame::new(10.0, Vec2::ZERO, Buttons::K1 | Buttons::K2 | Buttons::SMOKE);
        assert_eq!(both.pressed_since(Some(&held)), Buttons::K2);
        assert_eq!(held.pressed_since(None), Buttons::K1);
        let smoke = InputFrame::new(20.0, Vec2::ZERO, Buttons::SMOKE);
        assert!(smoke.pressed_since(None).is_empty());
        assert!(!smoke.is_holding());
    }
}
