//! Strider Search -- goal-directed movement planning over the physics step.
//!
//! The planner treats [`strider_core::physics::step`] as a pure transition
//! function and runs a weighted best-first search over actor states, one tick
//! per edge. Dominance pruning on (optionally quantized) positions keeps the
//! continuous state space tractable; a wall-clock deadline bounds the rest.
//!
//! ```
//! use strider_core::prelude::*;
//! use strider_search::prelude::*;
//!
//! let ground = Polygon::rect(-500.0, -64.0, 500.0, -16.0).unwrap();
//! let world = StaticWorld::new(vec![StaticObject::wall(ground)]);
//!
//! let plan = plan(
//!     &ActorState::grounded(0.0, 0.0),
//!     Point::new(160.0, 0.0),
//!     &world,
//!     &SearchSettings::default(),
//! )
//! .unwrap();
//! assert_eq!(plan.ticks(), 36);
//! ```

#![deny(unsafe_code)]

use std::time::Duration;

pub mod key;
pub mod planner;
pub mod settings;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Why a search ended without a path. Both variants mean "not found".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The wall-clock budget ran out.
    #[error("search timed out after {elapsed:?} ({iterations} iterations)")]
    TimedOut { iterations: u64, elapsed: Duration },

    /// Every reachable, non-dominated state was expanded.
    #[error("no path: frontier exhausted after {iterations} iterations")]
    Exhausted { iterations: u64 },
}

impl SearchError {
    pub fn iterations(&self) -> u64 {
        match self {
            SearchError::TimedOut { iterations, .. } | SearchError::Exhausted { iterations } => {
                *iterations
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::key::StateKey;
    pub use crate::planner::{plan, Plan, PlanStep, GOAL_TOLERANCE};
    pub use crate::settings::SearchSettings;
    pub use crate::SearchError;
}
