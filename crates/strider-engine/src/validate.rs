//! Transition validation: re-run a recorded step and diff it against what the
//! client reported.
//!
//! Validation is observational only. It never fails and never changes the
//! state it is given; a mismatch is returned as data for the caller to
//! surface.

use serde::{Deserialize, Serialize};
use strider_core::actor::ActorState;
use strider_core::moves::MacroStep;
use strider_core::physics::step;
use strider_core::settings::PhysicsSettings;
use strider_core::world::StaticWorld;

/// An attribute compared by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    X,
    Y,
    Vx,
    Vy,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::X, Field::Y, Field::Vx, Field::Vy];

    pub fn read(self, state: &ActorState) -> f64 {
        match self {
            Field::X => state.x,
            Field::Y => state.y,
            Field::Vx => state.vx,
            Field::Vy => state.vy,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::X => "x",
            Field::Y => "y",
            Field::Vx => "vx",
            Field::Vy => "vy",
        }
    }
}

/// One mismatching attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: Field,
    /// Canonical value from the physics step.
    pub expected: f64,
    /// Value the client reported.
    pub observed: f64,
}

/// Result of comparing a canonical transition with an observed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionReport {
    pub matches: bool,
    pub diffs: Vec<FieldDiff>,
}

impl TransitionReport {
    /// Compare the validated attributes exactly. `NaN` never matches.
    pub fn compare(expected: &ActorState, observed: &ActorState) -> Self {
        let diffs: Vec<FieldDiff> = Field::ALL
            .iter()
            .filter_map(|&field| {
                let (e, o) = (field.read(expected), field.read(observed));
                (e != o).then_some(FieldDiff {
                    field,
                    expected: e,
                    observed: o,
                })
            })
            .collect();
        Self {
            matches: diffs.is_empty(),
            diffs,
        }
    }
}

/// Re-run `input` from `recorded` and diff the result against `observed`.
pub fn validate_transition(
    recorded: &ActorState,
    world: &StaticWorld,
    input: MacroStep,
    physics: &PhysicsSettings,
    observed: &ActorState,
) -> TransitionReport {
    let expected = step(recorded, world, input.mv, input.run, physics);
    TransitionReport::compare(&expected, observed)
}
