#![allow(dead_code)]

use glam::Vec2;
use proptest::prelude::*;
use rewind::config::EngineConfig;
use rewind::game::frames::{Buttons, InputFrame};
use rewind::game::note_lock::{LockPolicy, NoteLockStyle};
use rewind::game::target::{Checkpoint, CheckpointKind, Target};
use rewind::game::time_machine::TimeMachine;

pub fn machine(targets: &[Target], frames: &[InputFrame], config: &EngineConfig) -> TimeMachine {
    TimeMachine::build(targets.to_vec(), frames.to_vec(), config).expect("valid session")
}

/// A short map mixing every target kind, plus a play that taps each object
/// slightly late and holds through sliders and spinners.
pub fn sample_session() -> (Vec<Target>, Vec<InputFrame>) {
    let at = |x: f32, y: f32| Vec2::new(x, y);
    let targets = vec![
        Target::circle(0, 500.0, at(100.0, 100.0)),
        Target::circle(1, 900.0, at(200.0, 100.0)),
        Target::slider(
            2,
            1400.0,
            at(100.0, 200.0),
            vec![
                Checkpoint { kind: CheckpointKind::Tick, time: 1600.0, position: at(150.0, 200.0) },
                Checkpoint { kind: CheckpointKind::Repeat, time: 1800.0, position: at(200.0, 200.0) },
            ],
            2000.0,
            at(100.0, 200.0),
        ),
        Target::spinner(3, 2500.0, 3500.0, at(256.0, 192.0)),
        Target::circle(4, 4000.0, at(300.0, 300.0)),
        Target::circle(5, 4100.0, at(350.0, 300.0)),
    ];

    let mut frames = Vec::new();
    let mut tap = |t: f64, p: Vec2| {
        frames.push(InputFrame::new(t, p, Buttons::K1));
        frames.push(InputFrame::new(t + 40.0, p, Buttons::empty()));
    };
    tap(512.0, at(100.0, 100.0));
    tap(830.0, at(200.0, 100.0));
    frames.push(InputFrame::new(1420.0, at(100.0, 200.0), Buttons::K2));
    frames.push(InputFrame::new(1600.0, at(150.0, 200.0), Buttons::K2));
    frames.push(InputFrame::new(1800.0, at(190.0, 200.0), Buttons::K2));
    frames.push(InputFrame::new(2000.0, at(110.0, 200.0), Buttons::K2));
    frames.push(InputFrame::new(2050.0, at(110.0, 200.0), Buttons::empty()));
    frames.push(InputFrame::new(2600.0, at(256.0, 192.0), Buttons::M1));
    frames.push(InputFrame::new(3300.0, at(256.0, 192.0), Buttons::empty()));
    let mut tap = |t: f64, p: Vec2| {
        frames.push(InputFrame::new(t, p, Buttons::K1));
        frames.push(InputFrame::new(t + 40.0, p, Buttons::empty()));
    };
    tap(4090.0, at(350.0, 300.0));
    tap(4150.0, at(300.0, 300.0));
    (targets, frames)
}

pub fn lock_styles() -> impl Strategy<Value = LockPolicy> {
    prop_oneof![
        Just(LockPolicy::new(NoteLockStyle::None)),
        Just(LockPolicy::new(NoteLockStyle::Stable)),
        Just(LockPolicy::new(NoteLockStyle::Lazer)),
        Just(LockPolicy::new(NoteLockStyle::Strict)),
        (0.0..400.0f64).prop_map(|d| LockPolicy { style: NoteLockStyle::Stable, lock_distance_ms: Some(d) }),
    ]
}

fn position() -> impl Strategy<Value = Vec2> {
    (0.0..200.0f32, 0.0..200.0f32).prop_map(|(x, y)| Vec2::new(x, y))
}

fn target_at(id: u32, time: f64, kind: u8, length: f64, position: Vec2) -> Target {
    match kind {
        0 | 1 => Target::circle(id, time, position),
        2 => Target::slider(
            id,
            time,
            position,
            vec![Checkpoint { kind: CheckpointKind::Tick, time: time + length / 2.0, position: position + Vec2::X * 20.0 }],
            time + length,
            position + Vec2::X * 40.0,
        ),
        _ => Target::spinner(id, time, time + length, position),
    }
}

/// Targets spread over a few seconds, overlapping often enough to exercise
/// the lock policies.
pub fn any_targets() -> impl Strategy<Value = Vec<Target>> {
    prop::collection::vec((10.0..400.0f64, 0u8..4, 0.0..600.0f64, position()), 0..20).prop_map(|specs| {
        let mut time = 0.0;
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (gap, kind, length, pos))| {
                time += gap;
                target_at(i as u32, time, kind, length, pos)
            })
            .collect()
    })
}

pub fn any_frames() -> impl Strategy<Value = Vec<InputFrame>> {
    prop::collection::vec((0.0..120.0f64, position(), 0u8..32), 0..120).prop_map(|specs| {
        let mut time = 0.0;
        specs
            .into_iter()
            .map(|(gap, pos, bits)| {
                time += gap;
                InputFrame::new(time, pos, Buttons::from_bits_truncate(bits))
            })
            .collect()
    })
}
