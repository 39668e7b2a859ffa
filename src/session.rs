use std::fs;
use std::path::Path;

use glam::Vec2;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineError, SessionError};
use crate::game::frames::{Buttons, InputFrame};
use crate::game::target::Target;
use crate::game::time_machine::TimeMachine;

/// One recorded frame as stored on disk. `buttons` is the raw bit set
/// (M1=1, M2=2, K1=4, K2=8, smoke=16); unknown bits are dropped.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub time: f64,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub buttons: u8,
}

impl From<FrameRecord> for InputFrame {
    fn from(r: FrameRecord) -> Self {
        InputFrame::new(r.time, Vec2::new(r.x, r.y), Buttons::from_bits_truncate(r.buttons))
    }
}

impl From<&InputFrame> for FrameRecord {
    fn from(f: &InputFrame) -> Self {
        Self { time: f.time, x: f.position.x, y: f.position.y, buttons: f.buttons.bits() }
    }
}

/// Targets and recorded input of one play.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub frames: Vec<FrameRecord>,
}

impl Session {
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let text = fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let session = Self::from_json(&text)?;
        info!(
            "Loaded session '{}': {} targets, {} frames",
            path.display(),
            session.targets.len(),
            session.frames.len()
        );
        Ok(session)
    }

    pub fn input_frames(&self) -> Vec<InputFrame> {
        self.frames.iter().copied().map(InputFrame::from).collect()
    }

    pub fn into_time_machine(self, config: &EngineConfig) -> Result<TimeMachine, EngineError> {
        let frames = self.input_frames();
        TimeMachine::build(self.targets, frames, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::target::TargetKind;

    const SAMPLE: &str = r#"{
        "targets": [
            { "id": 0, "time": 1000, "position": [100, 100], "type": "circle" },
            { "id": 1, "time": 2000, "position": [200, 100], "type": "slider",
              "checkpoints": [ { "kind": "tick", "time": 2100, "position": [250, 100] } ],
              "end_time": 2200, "end_position": [300, 100] },
            { "id": 2, "time": 3000, "position": [256, 192], "type": "spinner", "end_time": 4000 }
        ],
        "frames": [
            { "time": 995, "x": 100, "y": 100, "buttons": 4 },
            { "time": 1030, "x": 100, "y": 100, "buttons": 0 },
            { "time": 1040, "x": 100, "y": 100, "buttons": 48 }
        ]
    }"#;

    #[test]
    fn parses_every_target_kind() {
        let session = Session::from_json(SAMPLE).expect("valid session");
        assert_eq!(session.targets.len(), 3);
        assert_eq!(session.targets[0].kind, TargetKind::Circle);
        assert!(matches!(&session.targets[1].kind, TargetKind::Slider { checkpoints, .. } if checkpoints.len() == 1));
        assert_eq!(session.targets[2].end_time(), 4000.0);
    }

    #[test]
    fn unknown_button_bits_are_dropped() {
        let frames = Session::from_json(SAMPLE).expect("valid session").input_frames();
        assert_eq!(frames[0].buttons, Buttons::K1);
        assert_eq!(frames[2].buttons, Buttons::SMOKE);
        assert!(!frames[2].is_holding());
        assert_eq!(frames[2].position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn empty_object_is_an_empty_session() {
        assert_eq!(Session::from_json("{}").expect("valid"), Session::default());
        assert!(matches!(Session::from_json("{\"targets\": 3}"), Err(SessionError::Json(_))));
    }

    #[test]
    fn builds_a_queryable_engine() {
        let tm = Session::from_json(SAMPLE)
            .expect("valid session")
            .into_time_machine(&EngineConfig::default())
            .expect("valid engine");
        let end = tm.final_state();
        assert!(end.is_complete());
        // Circle hit; slider head, tick, tail and the unheld spinner missed.
        assert_eq!(end.counts.great, 1);
        assert_eq!(end.counts.miss, 2);
        assert_eq!(end.counts.checkpoints_missed, 2);
    }

    #[test]
    fn written_session_loads_back() {
        let frames = vec![
            InputFrame::new(10.0, Vec2::new(1.5, 2.0), Buttons::M1 | Buttons::K2),
            InputFrame::new(20.0, Vec2::new(3.0, 4.0), Buttons::SMOKE),
        ];
        let session = Session {
            targets: vec![Target::circle(0, 15.0, Vec2::new(1.5, 2.0))],
            frames: frames.iter().map(FrameRecord::from).collect(),
        };
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("session.json");
        fs::write(&path, serde_json::to_string(&session).expect("serializable")).expect("writable");

        let loaded = Session::load(&path).expect("readable session");
        assert_eq!(loaded, session);
        assert_eq!(loaded.input_frames(), frames);
        assert!(matches!(
            Session::load(&dir.path().join("missing.json")),
            Err(SessionError::Io { .. })
        ));
    }
}
