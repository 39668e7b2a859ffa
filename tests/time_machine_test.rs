mod common;

use std::sync::Arc;
use std::thread;

use glam::Vec2;
use rewind::config::EngineConfig;
use rewind::error::{ConfigurationError, EngineError, MalformedTargetError, UnorderedInputError};
use rewind::game::events::EventKind;
use rewind::game::frames::{Buttons, FrameOrderPolicy, InputFrame};
use rewind::game::judgment::{JudgeGrade, Resolution};
use rewind::game::target::{SubTargetId, Target};
use rewind::game::time_machine::{MAX_BUCKETS, TimeMachine};
use rewind::game::timing_windows::HitWindows;

use common::{machine, sample_session};

#[test]
fn sample_session_final_state() {
    let (targets, frames) = sample_session();
    let tm = machine(&targets, &frames, &EngineConfig::default());
    assert_eq!(tm.duration(), 4250.0);

    let end = tm.final_state();
    assert!(end.is_complete());
    assert_eq!(end.counts.great, 2);
    assert_eq!(end.counts.ok, 2);
    assert_eq!(end.counts.meh, 1);
    assert_eq!(end.counts.miss, 1);
    assert_eq!(end.counts.checkpoints_hit, 3);
    assert_eq!(end.note_locks().len(), 1);
    assert_eq!(end.max_combo, 8);
    assert_eq!(end.combo, 0);
}

#[test]
fn mid_session_query_leaves_later_parts_pending() {
    let (targets, frames) = sample_session();
    let tm = machine(&targets, &frames, &EngineConfig::default());
    let state = tm.state_at(1700.0);
    // Circles 0, 1; slider head and tick. The repeat at 1800 is not due yet.
    assert_eq!(state.judged_count(), 4);
    assert_eq!(state.judgment(SubTargetId(3)).map(|j| j.grade), Some(JudgeGrade::Great));
    assert!(state.judgment(SubTargetId(4)).is_none());
    let pending: Vec<SubTargetId> = state.pending().collect();
    assert_eq!(pending, (4..9).map(SubTargetId).collect::<Vec<_>>());
    assert_eq!(state.pending_count(), 5);
    assert_eq!(state.time(), 1700.0);
}

#[test]
fn queries_are_clamped_into_the_session() {
    let (targets, frames) = sample_session();
    let tm = machine(&targets, &frames, &EngineConfig::default());
    let start = tm.state_at(0.0);
    assert_eq!(tm.state_at(-250.0), start);
    assert_eq!(tm.state_at(f64::NAN), start);
    assert_eq!(tm.state_at(1e12), tm.final_state());
    assert_eq!(start.judged_count(), 0);
}

#[test]
fn cache_can_be_warmed_and_dropped() {
    let (targets, frames) = sample_session();
    let tm = machine(&targets, &frames, &EngineConfig::default());
    assert_eq!(tm.cached_buckets(), 0);
    let before = tm.state_at(3333.0);
    assert_eq!(tm.cached_buckets(), 4);

    tm.warm_up();
    assert_eq!(tm.cached_buckets(), 5);
    tm.clear_cache();
    assert_eq!(tm.cached_buckets(), 0);
    assert_eq!(tm.state_at(3333.0), before);
}

#[test]
fn concurrent_queries_agree_with_a_fresh_engine() {
    let (targets, frames) = sample_session();
    let config = EngineConfig::default().with_bucket_interval(250.0);
    let shared = Arc::new(machine(&targets, &frames, &config));
    let reference = machine(&targets, &frames, &config);

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let tm = Arc::clone(&shared);
            thread::spawn(move || {
                (0..20)
                    .map(|i| {
                        let t = f64::from((i * 211 + n * 97) % 4300);
                        (t, tm.state_at(t))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for (t, state) in handle.join().expect("query thread") {
            assert_eq!(state, reference.state_at(t), "t = {t}");
        }
    }
}

#[test]
fn extracted_events_follow_nominal_time() {
    let (targets, frames) = sample_session();
    let tm = machine(&targets, &frames, &EngineConfig::default());
    let events = tm.extract_events(&tm.final_state());
    assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
    assert_eq!(events.iter().filter(|e| e.kind == EventKind::NoteLock).count(), 1);
    assert_eq!(events.iter().filter(|e| e.kind == EventKind::ComboBreak).count(), 1);
}

#[test]
fn windows_of_ten_thirty_fifty() {
    let windows = HitWindows::symmetric(&[
        (JudgeGrade::Great, 10.0),
        (JudgeGrade::Ok, 30.0),
        (JudgeGrade::Meh, 50.0),
    ])
    .expect("valid windows");
    let config = EngineConfig::default().with_hit_windows(windows);
    let targets: Vec<_> = (0..3).map(|i| Target::circle(i, 1000.0 * f64::from(i + 1), Vec2::ZERO)).collect();
    let mut frames = Vec::new();
    for (i, offset) in [9.0, 29.0, 51.0].into_iter().enumerate() {
        let t = 1000.0 * (i as f64 + 1.0) + offset;
        frames.push(InputFrame::new(t, Vec2::ZERO, Buttons::K1));
        frames.push(InputFrame::new(t + 20.0, Vec2::ZERO, Buttons::empty()));
    }
    let tm = machine(&targets, &frames, &config);
    let end = tm.final_state();
    let grade = |id| end.judgment(SubTargetId(id)).map(|j| (j.grade, j.resolution));
    assert_eq!(grade(0), Some((JudgeGrade::Great, Resolution::Frame(0))));
    assert_eq!(grade(1), Some((JudgeGrade::Ok, Resolution::Frame(2))));
    assert_eq!(grade(2), Some((JudgeGrade::Miss, Resolution::TimedOut)));

    // Before its window closes the third circle is still open.
    assert!(tm.state_at(3049.0).judgment(SubTargetId(2)).is_none());
}

#[test]
fn invalid_sessions_are_rejected() {
    let config = EngineConfig::default();
    let dup = vec![Target::circle(7, 100.0, Vec2::ZERO), Target::circle(7, 200.0, Vec2::ZERO)];
    assert!(matches!(
        TimeMachine::build(dup, Vec::new(), &config),
        Err(EngineError::Target(MalformedTargetError::DuplicateId(7)))
    ));

    let backwards = vec![
        InputFrame::new(200.0, Vec2::ZERO, Buttons::empty()),
        InputFrame::new(100.0, Vec2::ZERO, Buttons::empty()),
    ];
    let strict = config.clone().with_frame_order(FrameOrderPolicy::Strict);
    assert!(matches!(
        TimeMachine::build(Vec::new(), backwards.clone(), &strict),
        Err(EngineError::Input(UnorderedInputError::OutOfOrder { index: 1, .. }))
    ));
    assert!(TimeMachine::build(Vec::new(), backwards, &config).is_ok());

    assert!(matches!(
        TimeMachine::build(Vec::new(), Vec::new(), &config.with_bucket_interval(0.0)),
        Err(EngineError::Config(ConfigurationError::InvalidBucketInterval(_)))
    ));
}

#[test]
fn sorted_input_matches_shuffled_input() {
    let (targets, frames) = sample_session();
    let mut shuffled = frames.clone();
    shuffled.swap(0, 3);
    shuffled.reverse();
    let config = EngineConfig::default();
    assert_eq!(
        machine(&targets, &shuffled, &config).final_state(),
        machine(&targets, &frames, &config).final_state()
    );
}

#[test]
fn empty_session_answers_every_query() {
    let tm = machine(&[], &[], &EngineConfig::default());
    assert_eq!(tm.duration(), 0.0);
    for t in [-1000.0, 0.0, 1.0, 1e9] {
        let state = tm.state_at(t);
        assert!(state.is_complete());
        assert_eq!(state.judged_count(), 0);
        assert_eq!(state.time(), 0.0);
        assert!(tm.extract_events(&state).is_empty());
    }
}

#[test]
fn bucket_interval_too_small_for_the_session_is_rejected() {
    let targets = vec![Target::circle(0, 1000.0, Vec2::ZERO)];
    let config = EngineConfig::default().with_bucket_interval(1e-6);
    assert!(matches!(
        TimeMachine::build(targets.clone(), Vec::new(), &config),
        Err(EngineError::Config(ConfigurationError::TooManyBuckets { max: MAX_BUCKETS, .. }))
    ));

    // Small but bounded intervals are still accepted and answer normally.
    let fine = machine(&targets, &[], &EngineConfig::default().with_bucket_interval(1.0));
    assert_eq!(fine.state_at(1100.0).pending_count(), 1);
    assert!(fine.final_state().is_complete());
}
