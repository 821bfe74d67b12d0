//! Physics constants and the per-session physics configuration.

use serde::{Deserialize, Serialize};

/// Fixed tick duration in seconds (60 Hz).
pub const TICK_S: f64 = 1.0 / 60.0;
/// Base vertical velocity of a jump, units per second.
pub const JUMP_SPEED: f64 = 320.0;
/// Base horizontal walking velocity, units per second.
pub const WALK_SPEED: f64 = 160.0;
/// Horizontal speed multiplier while the run modifier is held.
pub const RUN_MULTIPLIER: f64 = 1.5;
/// Vertical velocity lost per airborne tick, units per second.
pub const GRAVITY: f64 = 6.0;
/// Push speed added on entering a speed zone.
pub const PUSH_SPEED: f64 = 2500.0;
/// Push speed lost per tick once control is regained.
pub const PUSH_DECAY: f64 = 125.0;
/// Decimal places kept of each per-tick displacement.
pub const DISPLACEMENT_DECIMALS: i32 = 5;

/// Movement model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Side view with gravity and jumping.
    #[default]
    Platformer,
    /// Top-down view: up/down move vertically at walking speed, no gravity.
    Scroller,
}

/// Knobs that change the transition function. Part of every search and
/// validation input, never read from global state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Movement model.
    pub mode: GameMode,
    /// Multiplier applied to walk and run speed (e.g. from equipment).
    pub speed_multiplier: f64,
    /// Multiplier applied to jump speed.
    pub jump_multiplier: f64,
    /// When `false` the run modifier is ignored.
    pub run_enabled: bool,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            mode: GameMode::Platformer,
            speed_multiplier: 1.0,
            jump_multiplier: 1.0,
            run_enabled: true,
        }
    }
}

impl PhysicsSettings {
    /// Settings for a top-down level.
    pub fn scroller() -> Self {
        Self {
            mode: GameMode::Scroller,
            ..Self::default()
        }
    }

    /// Fastest horizontal distance covered in one tick without modifiers.
    pub fn max_run_step(&self) -> f64 {
        let run = if self.run_enabled { RUN_MULTIPLIER } else { 1.0 };
        WALK_SPEED * run * self.speed_multiplier * TICK_S
    }
}
