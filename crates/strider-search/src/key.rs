//! Dominance keys: which actor states the planner treats as "the same place".

use strider_core::actor::{ActorState, Direction};

use crate::settings::SearchSettings;

/// Hashable identity of a search state.
///
/// By default only the position takes part, compared bit-for-bit or rounded
/// to integers under `simple_geometry`. With `track_velocity` the residual
/// motion (vertical velocity, push, control, facing, airborne) is included
/// as well, so a state that arrives at a known position with different
/// momentum is not pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey {
    x: u64,
    y: u64,
    motion: Option<MotionKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MotionKey {
    vy: u64,
    push: u64,
    can_control: bool,
    facing: Direction,
    airborne: bool,
}

/// Exact bit pattern with `-0.0` folded into `0.0`.
fn exact(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

fn coordinate(v: f64, simple: bool) -> u64 {
    if simple {
        v.round() as i64 as u64
    } else {
        exact(v)
    }
}

impl StateKey {
    pub fn of(state: &ActorState, settings: &SearchSettings) -> Self {
        let simple = settings.simple_geometry;
        let motion = settings.track_velocity.then(|| MotionKey {
            vy: exact(state.vy),
            push: exact(state.push),
            can_control: state.can_control,
            facing: state.facing,
            airborne: state.airborne,
        });
        Self {
            x: coordinate(state.x, simple),
            y: coordinate(state.y, simple),
            motion,
        }
    }
}
