//! The per-actor kinematic state advanced once per tick.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::hitbox::ActorBox;
use crate::world::HazardKind;

/// Cardinal facing direction. Also the axis along which push velocity acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Up (+y).
    N,
    /// Down (-y).
    S,
    /// Right (+x).
    #[default]
    E,
    /// Left (-x).
    W,
}

/// Kinematic snapshot of one actor.
///
/// This is a small `Copy` value: the planner clones it into every search node
/// and the validator keeps the pre-tick copy around for replays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActorState {
    /// Centre x.
    pub x: f64,
    /// Centre y.
    pub y: f64,
    /// Horizontal velocity in units per second.
    pub vx: f64,
    /// Vertical velocity in units per second.
    pub vy: f64,
    /// Residual push speed from speed zones, applied along `facing`.
    #[serde(default)]
    pub push: f64,
    /// `false` while a speed zone has taken over movement.
    #[serde(default = "default_true")]
    pub can_control: bool,
    /// Last direction the actor moved or was pushed in.
    #[serde(default)]
    pub facing: Direction,
    /// Not standing on any surface.
    pub airborne: bool,
    /// Hazard touched during the last tick, if any.
    #[serde(default)]
    pub hazard: Option<HazardKind>,
}

fn default_true() -> bool {
    true
}

impl Default for ActorState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            push: 0.0,
            can_control: true,
            facing: Direction::E,
            airborne: true,
            hazard: None,
        }
    }
}

impl ActorState {
    /// An actor at rest at `(x, y)`, standing on the ground.
    pub fn grounded(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            airborne: false,
            ..Self::default()
        }
    }

    /// An actor at rest at `(x, y)`, in free fall.
    pub fn falling(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Centre position.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Current hitbox.
    pub fn hitbox(&self) -> ActorBox {
        ActorBox::at(self.x, self.y)
    }

    /// Whether the actor ended its last tick touching a spike.
    pub fn is_dead(&self) -> bool {
        self.hazard == Some(HazardKind::Spike)
    }

    /// Chebyshev-box proximity: both axes within `tolerance` of `target`.
    pub fn within(&self, target: Point, tolerance: f64) -> bool {
        (self.x - target.x).abs() <= tolerance && (self.y - target.y).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_is_inclusive_on_both_axes() {
        let s = ActorState::grounded(0.0, 0.0);
        assert!(s.within(Point::new(16.0, -16.0), 16.0));
        assert!(!s.within(Point::new(16.5, 0.0), 16.0));
        assert!(!s.within(Point::new(0.0, 17.0), 16.0));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: ActorState =
            serde_json::from_str(r#"{"x":1.0,"y":2.0,"vx":0.0,"vy":0.0,"airborne":false}"#)
                .unwrap();
        assert!(s.can_control);
        assert_eq!(s.push, 0.0);
        assert_eq!(s.hazard, None);
    }
}
