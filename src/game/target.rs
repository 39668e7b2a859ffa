use glam::Vec2;
use serde::{Deserialize, Serialize};

pub type TargetId = u32;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    Tick,
    Repeat,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub kind: CheckpointKind,
    pub time: f64,
    pub position: Vec2,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetKind {
    Circle,
    Slider {
        #[serde(default)]
        checkpoints: Vec<Checkpoint>,
        end_time: f64,
        end_position: Vec2,
    },
    Spinner {
        end_time: f64,
    },
}

/// A scorable object as it appears in the map, before flattening.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub time: f64,
    pub position: Vec2,
    #[serde(flatten)]
    pub kind: TargetKind,
}

impl Target {
    pub const fn circle(id: TargetId, time: f64, position: Vec2) -> Self {
        Self { id, time, position, kind: TargetKind::Circle }
    }

    pub fn slider(
        id: TargetId,
        time: f64,
        position: Vec2,
        checkpoints: Vec<Checkpoint>,
        end_time: f64,
        end_position: Vec2,
    ) -> Self {
        Self {
            id,
            time,
            position,
            kind: TargetKind::Slider { checkpoints, end_time, end_position },
        }
    }

    pub const fn spinner(id: TargetId, time: f64, end_time: f64, position: Vec2) -> Self {
        Self { id, time, position, kind: TargetKind::Spinner { end_time } }
    }

    #[inline(always)]
    pub fn end_time(&self) -> f64 {
        match &self.kind {
            TargetKind::Circle => self.time,
            TargetKind::Slider { end_time, .. } | TargetKind::Spinner { end_time } => *end_time,
        }
    }
}

/// Which piece of a target a flattened entry stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "part", content = "n", rename_all = "snake_case")]
pub enum Part {
    Circle,
    Head,
    Tick(u16),
    Repeat(u16),
    Tail,
    Spinner,
}

/// How a part gets resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Needs a button press inside the hit window and the cursor on the object.
    Press,
    /// Checked at its own time against the input held at that moment.
    Tracking,
    /// Judged at its end from how long input was held.
    Duration,
}

impl Part {
    pub const fn trigger(self) -> Trigger {
        match self {
            Part::Circle | Part::Head => Trigger::Press,
            Part::Tick(_) | Part::Repeat(_) | Part::Tail => Trigger::Tracking,
            Part::Spinner => Trigger::Duration,
        }
    }

    pub const fn is_press(self) -> bool {
        matches!(self.trigger(), Trigger::Press)
    }
}

/// Index into the flattened sub-target table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SubTargetId(pub u32);

impl SubTargetId {
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One independently judgeable piece of a target.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SubTarget {
    pub id: SubTargetId,
    pub target: TargetId,
    pub part: Part,
    /// Nominal time. For spinners this is the start.
    pub time: f64,
    /// Spinner end. Equal to `time` for every other part.
    pub end_time: f64,
    pub position: Vec2,
    /// First sub-target of the owning target.
    pub first_sibling: SubTargetId,
}
