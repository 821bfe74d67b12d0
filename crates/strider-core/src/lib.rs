//! Strider Core -- deterministic fixed-step physics for a 2D platformer actor.
//!
//! The crate models a static level (walls, hazards, speed zones, environment
//! modifiers) and a single square actor. [`physics::step`] is the one
//! transition function shared by gameplay, the route planner and the
//! transition validator, so it must be bit-for-bit reproducible: no hashing
//! order, threading or wall clock leaks into it.
//!
//! # Quick Start
//!
//! ```
//! use strider_core::prelude::*;
//!
//! let ground = Polygon::rect(-500.0, -64.0, 500.0, -16.0).unwrap();
//! let world = StaticWorld::new(vec![StaticObject::wall(ground)]);
//!
//! let start = ActorState::grounded(0.0, 0.0);
//! let next = step(&start, &world, Move::D, true, &PhysicsSettings::default());
//!
//! assert_eq!(next.x, 4.0);
//! assert!(!next.airborne);
//! ```

#![deny(unsafe_code)]

pub mod actor;
pub mod geometry;
pub mod grid;
pub mod hitbox;
pub mod moves;
pub mod physics;
pub mod settings;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while building level geometry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// The descriptor names an object kind this crate does not model.
    #[error("unknown object kind '{kind}'")]
    UnknownKind { kind: String },

    /// The descriptor lacks a field its kind requires.
    #[error("object of kind '{kind}' is missing '{field}'")]
    MissingData { kind: String, field: &'static str },

    /// Fewer than three vertices, or a rectangle with no area.
    #[error("outline has {points} usable points, need at least 3 with non-zero area")]
    DegenerateOutline { points: usize },

    /// The outline is not strictly convex at the given vertex.
    #[error("outline is not convex at vertex {vertex}")]
    NotConvex { vertex: usize },

    /// A coordinate is NaN or infinite.
    #[error("vertex {vertex} has a non-finite coordinate")]
    NonFinite { vertex: usize },
}

/// Errors produced while parsing move tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveParseError {
    #[error("unrecognized move token '{0}'")]
    Unrecognized(String),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::actor::{ActorState, Direction};
    pub use crate::geometry::{Bounds, Point, Polygon};
    pub use crate::hitbox::{collides, minimum_penetration, ActorBox, PenetrationAxis, Shape};
    pub use crate::moves::{parse_macro, parse_move_list, MacroStep, Move};
    pub use crate::physics::{rollout, step};
    pub use crate::settings::{GameMode, PhysicsSettings};
    pub use crate::world::{
        EnvModifier, HazardKind, ObjectDescriptor, ObjectKind, StaticObject, StaticWorld,
        WorldBuild,
    };
    pub use crate::{MoveParseError, WorldError};
}
