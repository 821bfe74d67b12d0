//! Strider Engine -- authoritative tick loop, playback and verification.
//!
//! This crate builds on [`strider_core`] and [`strider_search`] to drive a
//! single actor through a level: one physics step per fixed tick, planned
//! routes and key macros played back through the same input path, settings
//! swapped only at tick boundaries, and client-reported transitions checked
//! against the canonical step.
//!
//! # Quick Start
//!
//! ```
//! use strider_core::prelude::*;
//! use strider_engine::prelude::*;
//!
//! let ground = Polygon::rect(-500.0, -64.0, 500.0, -16.0).unwrap();
//! let world = StaticWorld::new(vec![StaticObject::wall(ground)]);
//! let mut sim = Simulation::new(world, ActorState::grounded(0.0, 0.0), EngineConfig::default());
//!
//! let queued = sim.plan_to(Point::new(160.0, 0.0)).unwrap();
//! sim.run_idle(queued as u64);
//! assert!(sim.actor().within(Point::new(160.0, 0.0), 16.0));
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod input;
pub mod replay;
pub mod simulation;
pub mod snapshot;
pub mod validate;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the physics crate for convenience.
pub use strider_core;

/// Re-export the planner crate for convenience.
pub use strider_search;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from loading or updating an [`EngineConfig`](config::EngineConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("setting overrides must be a JSON object")]
    NotAnObject,
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::input::{Key, TickInput};
    pub use crate::replay::{
        replay, RecordedTick, Recorder, Recording, ReplayDivergence, ReplayReport,
    };
    pub use crate::simulation::Simulation;
    pub use crate::snapshot::SimulationSnapshot;
    pub use crate::validate::{validate_transition, Field, FieldDiff, TransitionReport};
    pub use crate::ConfigError;
}
