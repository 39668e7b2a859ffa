use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::config::EngineConfig;
use crate::error::{ConfigurationError, EngineError};
use crate::game::events::{self, Event};
use crate::game::frames::{FrameStream, InputFrame};
use crate::game::gameplay::Simulation;
use crate::game::state::GameState;
use crate::game::target::Target;
use crate::game::target_index::TargetIndex;

pub const DEFAULT_BUCKET_INTERVAL_MS: f64 = 1000.0;
/// Upper bound on cached snapshots for one session.
pub const MAX_BUCKETS: usize = 1 << 16;

/// Random-time access to the judged state of a session.
///
/// Snapshots at every multiple of the bucket interval are computed on first
/// need and kept; a query replays forward from the nearest bucket at or before
/// it. The interval only trades memory for seek cost, it never changes a result.
#[derive(Debug)]
pub struct TimeMachine {
    sim: Simulation,
    interval_ms: f64,
    duration_ms: f64,
    // buckets[k] is the state at k * interval_ms; always a contiguous prefix.
    buckets: Mutex<Vec<Arc<GameState>>>,
}

impl TimeMachine {
    pub fn new(sim: Simulation, interval_ms: f64) -> Result<Self, ConfigurationError> {
        if !interval_ms.is_finite() || interval_ms <= 0.0 {
            return Err(ConfigurationError::InvalidBucketInterval(interval_ms));
        }
        let duration_ms = sim.duration();
        let buckets = (duration_ms / interval_ms).floor() + 1.0;
        if buckets > MAX_BUCKETS as f64 {
            return Err(ConfigurationError::TooManyBuckets { interval_ms, buckets, max: MAX_BUCKETS });
        }
        debug!("Time machine: duration {duration_ms:.1} ms, bucket interval {interval_ms:.1} ms");
        Ok(Self { sim, interval_ms, duration_ms, buckets: Mutex::new(Vec::new()) })
    }

    /// Validates every input and builds a ready-to-query engine.
    pub fn build(
        targets: Vec<Target>,
        frames: Vec<InputFrame>,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let rules = config.ruleset()?;
        let index = TargetIndex::build(targets)?;
        let frames = FrameStream::build(frames, config.frame_order)?;
        Ok(Self::new(Simulation::new(index, frames, rules), config.bucket_interval_ms)?)
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    #[inline(always)]
    pub fn duration(&self) -> f64 {
        self.duration_ms
    }

    #[inline(always)]
    pub fn bucket_interval(&self) -> f64 {
        self.interval_ms
    }

    pub fn cached_buckets(&self) -> usize {
        self.lock_buckets().len()
    }

    /// Drops every cached bucket. Always safe: buckets are recomputed on demand.
    pub fn clear_cache(&self) {
        self.lock_buckets().clear();
    }

    /// State at `time`, clamped into `[0, duration]`.
    pub fn state_at(&self, time: f64) -> GameState {
        let t = if time.is_nan() { 0.0 } else { time.clamp(0.0, self.duration_ms) };
        let mut k = (t / self.interval_ms).floor() as usize;
        while k > 0 && self.boundary(k) > t {
            k -= 1;
        }
        let base = self.bucket(k);
        if self.boundary(k) == t {
            return GameState::clone(&base);
        }
        self.sim.run_until(GameState::clone(&base), t)
    }

    /// Fully resolved state at the end of the session.
    pub fn final_state(&self) -> GameState {
        self.state_at(self.duration_ms)
    }

    /// Computes every bucket up to the end of the session.
    pub fn warm_up(&self) {
        let last = (self.duration_ms / self.interval_ms).floor() as usize;
        self.bucket(last);
    }

    pub fn extract_events(&self, state: &GameState) -> Vec<Event> {
        events::extract(state, self.sim.index())
    }

    #[inline(always)]
    fn boundary(&self, k: usize) -> f64 {
        k as f64 * self.interval_ms
    }

    fn lock_buckets(&self) -> MutexGuard<'_, Vec<Arc<GameState>>> {
        // Buckets are only ever pushed whole, so a poisoned lock still holds valid data.
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bucket(&self, k: usize) -> Arc<GameState> {
        let (first_missing, latest) = {
            let buckets = self.lock_buckets();
            if let Some(b) = buckets.get(k) {
                return Arc::clone(b);
            }
            (buckets.len(), buckets.last().cloned())
        };

        // Computed outside the lock. Racing callers produce identical buckets.
        let mut state = latest.map_or_else(|| self.sim.initial_state(), |b| GameState::clone(&b));
        let mut computed = Vec::with_capacity(k + 1 - first_missing);
        for j in first_missing..=k {
            state = self.sim.run_until(state, self.boundary(j));
            debug!(
                "Bucket {j} at {:.0} ms: {} judged, {} pending, {} frames consumed",
                self.boundary(j),
                state.judged_count(),
                state.pending_count(),
                state.frames_consumed()
            );
            computed.push(Arc::new(state.clone()));
        }

        let mut buckets = self.lock_buckets();
        for (offset, bucket) in computed.into_iter().enumerate() {
            if buckets.len() == first_missing + offset {
                buckets.push(bucket);
            }
        }
        buckets.get(k).cloned().unwrap_or_else(|| Arc::new(state))
    }
}
