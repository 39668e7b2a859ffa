//! Replay judgement engine: judges recorded input against a map's hit
//! objects and answers "what had happened by time `t`" for any `t`.

pub mod config;
pub mod error;
pub mod game;
pub mod session;

pub use config::EngineConfig;
pub use error::{ConfigurationError, EngineError, MalformedTargetError, SessionError, UnorderedInputError};
pub use game::events::{Event, EventKind};
pub use game::frames::{Buttons, FrameOrderPolicy, InputFrame};
pub use game::judgment::{JudgeGrade, Judgment, Resolution};
pub use game::note_lock::{LockPolicy, NoteLockStyle};
pub use game::state::GameState;
pub use game::target::{Checkpoint, CheckpointKind, Part, SubTargetId, Target, TargetId, TargetKind};
pub use game::time_machine::TimeMachine;
