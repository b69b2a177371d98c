use serde::{Deserialize, Serialize};

pub const ARENA_MIN: f32 = -1.0;
pub const ARENA_MAX: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset_by(self, delta: Self) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
        }
    }

    pub fn delta_to(self, target: Self) -> Self {
        Self {
            x: target.x - self.x,
            y: target.y - self.y,
        }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Clips both coordinates into the arena square. Non-finite input collapses
    /// to the arena center.
    pub fn clamped_to_arena(self) -> Self {
        Self {
            x: clamp_coordinate(self.x),
            y: clamp_coordinate(self.y),
        }
    }
}

fn clamp_coordinate(value: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(ARENA_MIN, ARENA_MAX)
}

/// Two bodies touch when their centers are closer than the mean of their sizes.
pub fn in_contact(a: Vec2, a_size: f32, b: Vec2, b_size: f32) -> bool {
    a.distance(b) < (a_size + b_size) / 2.0
}

/// Axis-aligned placement region inside the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRegion {
    pub low: Vec2,
    pub high: Vec2,
}

impl PlacementRegion {
    pub const FULL: Self = Self {
        low: Vec2 {
            x: ARENA_MIN,
            y: ARENA_MIN,
        },
        high: Vec2 {
            x: ARENA_MAX,
            y: ARENA_MAX,
        },
    };

    pub fn from_hint(hint: Option<PositionHint>) -> Self {
        let mut region = Self::FULL;
        match hint {
            None => {}
            Some(PositionHint::Left) => region.high.x = 0.0,
            Some(PositionHint::Right) => region.low.x = 0.0,
            Some(PositionHint::Top) => region.low.y = 0.0,
            Some(PositionHint::Bottom) => region.high.y = 0.0,
        }
        region
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionHint {
    Left,
    Right,
    Top,
    Bottom,
}

impl PositionHint {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_points_inside_arena() {
        let clipped = Vec2::new(1.7, -3.0).clamped_to_arena();
        assert_eq!(clipped, Vec2::new(1.0, -1.0));
        assert_eq!(Vec2::new(f32::NAN, 0.5).clamped_to_arena(), Vec2::new(0.0, 0.5));
    }

    #[test]
    fn contact_is_strictly_below_mean_size() {
        let a = Vec2::new(0.0, 0.0);
        assert!(in_contact(a, 0.2, Vec2::new(0.19, 0.0), 0.2));
        assert!(!in_contact(a, 0.2, Vec2::new(0.2, 0.0), 0.2));
    }

    #[test]
    fn hints_restrict_half_planes() {
        let left = PlacementRegion::from_hint(Some(PositionHint::Left));
        assert_eq!(left.high.x, 0.0);
        assert_eq!(left.low.x, -1.0);
        let bottom = PlacementRegion::from_hint(Some(PositionHint::Bottom));
        assert_eq!(bottom.high.y, 0.0);
    }
}
