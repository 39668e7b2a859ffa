use std::collections::BTreeMap;

use serde::Serialize;

use crate::game::judgment::Judgment;
use crate::game::state::GameState;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimingStats {
    pub mean_abs_ms: f64,
    pub mean_ms: f64,
    pub stddev_ms: f64,
    /// Standard deviation scaled by ten, as players quote it.
    pub unstable_rate: f64,
    pub max_abs_ms: f64,
    pub count: usize,
}

#[inline(always)]
fn counts_for_timing(j: &Judgment) -> bool {
    j.part.is_press() && j.grade.is_hit()
}

/// Offsets of every hit object press in the snapshot; misses and slider
/// checkpoints carry no timing information.
pub fn compute_timing_stats(state: &GameState) -> TimingStats {
    // First pass: accumulate sums and maxima
    let mut sum_abs = 0.0_f64;
    let mut sum_signed = 0.0_f64;
    let mut max_abs = 0.0_f64;
    let mut count: usize = 0;

    for j in state.judgments().filter(|j| counts_for_timing(j)) {
        let e = j.time_error_ms;
        let a = e.abs();
        sum_abs += a;
        sum_signed += e;
        if a > max_abs {
            max_abs = a;
        }
        count += 1;
    }

    if count == 0 {
        return TimingStats::default();
    }

    let mean_ms = sum_signed / (count as f64);
    let mean_abs_ms = sum_abs / (count as f64);

    // Second pass: sample standard deviation of signed offsets
    let stddev_ms = if count > 1 {
        let sum_diff_sq: f64 = state
            .judgments()
            .filter(|j| counts_for_timing(j))
            .map(|j| {
                let d = j.time_error_ms - mean_ms;
                d * d
            })
            .sum();
        (sum_diff_sq / ((count as f64) - 1.0)).sqrt()
    } else {
        0.0
    };

    TimingStats {
        mean_abs_ms,
        mean_ms,
        stddev_ms,
        unstable_rate: stddev_ms * 10.0,
        max_abs_ms: max_abs,
        count,
    }
}

const HIST_BIN_MS: f64 = 1.0;

#[inline(always)]
fn bin_index_ms(v_ms: f64) -> i32 {
    // Floor to 1ms steps, negative going more negative
    (v_ms / HIST_BIN_MS).floor() as i32
}

/// Offset histogram in 1 ms bins, sorted by bin.
pub fn build_histogram_ms(state: &GameState) -> Vec<(i32, u32)> {
    let mut counts: BTreeMap<i32, u32> = BTreeMap::new();
    for j in state.judgments().filter(|j| counts_for_timing(j)) {
        let c = counts.entry(bin_index_ms(j.time_error_ms)).or_insert(0);
        *c = c.saturating_add(1);
    }
    counts.into_iter().collect()
}
