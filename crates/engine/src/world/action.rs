use serde::{Deserialize, Serialize};

use super::geometry::Vec2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GripperSignal {
    /// Open hand while moving.
    Move,
    #[default]
    Idle,
    Close,
    ReleaseFirst,
    ReleaseOther,
    ReleaseAll,
}

impl GripperSignal {
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Self::Move),
            0 => Some(Self::Idle),
            1 => Some(Self::Close),
            2 => Some(Self::ReleaseFirst),
            3 => Some(Self::ReleaseOther),
            4 => Some(Self::ReleaseAll),
            _ => None,
        }
    }

    pub fn code(self) -> i8 {
        match self {
            Self::Move => -1,
            Self::Idle => 0,
            Self::Close => 1,
            Self::ReleaseFirst => 2,
            Self::ReleaseOther => 3,
            Self::ReleaseAll => 4,
        }
    }

    pub fn is_closed(self) -> bool {
        self == Self::Close
    }

    pub fn is_release(self) -> bool {
        matches!(
            self,
            Self::ReleaseFirst | Self::ReleaseOther | Self::ReleaseAll
        )
    }
}

/// `(dx, dy, gripper_signal)` as consumed by the scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAction {
    pub delta: Vec2,
    pub gripper: GripperSignal,
}

impl PhysicalAction {
    pub const IDLE: Self = Self {
        delta: Vec2::ZERO,
        gripper: GripperSignal::Idle,
    };

    pub fn new(delta: Vec2, gripper: GripperSignal) -> Self {
        Self { delta, gripper }
    }

    pub fn move_by(delta: Vec2) -> Self {
        Self::new(delta, GripperSignal::Move)
    }

    pub fn grip(gripper: GripperSignal) -> Self {
        Self::new(Vec2::ZERO, gripper)
    }

    /// The zero-displacement follow-up applied after a move.
    pub fn settle(self) -> Self {
        Self::grip(self.gripper)
    }

    pub fn as_array(self) -> [f32; 3] {
        [self.delta.x, self.delta.y, f32::from(self.gripper.code())]
    }
}
