//! Simulation snapshot and restore with BLAKE3 hashing.
//!
//! A [`SimulationSnapshot`] holds everything that determines future ticks
//! besides the static world and the configuration: the actor state, the tick
//! counter and the queued playback steps. Its `hash` is the BLAKE3 hex digest
//! of that data, so two simulations with equal hashes tick identically.
//!
//! ```
//! use strider_core::prelude::*;
//! use strider_engine::prelude::*;
//!
//! let ground = Polygon::rect(-500.0, -64.0, 500.0, -16.0).unwrap();
//! let world = StaticWorld::new(vec![StaticObject::wall(ground)]);
//! let mut sim = Simulation::new(world, ActorState::grounded(0.0, 0.0), EngineConfig::default());
//!
//! let snapshot = sim.capture_snapshot();
//! assert_eq!(snapshot.hash.len(), 64);
//!
//! sim.tick(&TickInput::pressing(&[Key::Right]));
//! assert_ne!(sim.state_hash(), snapshot.hash);
//!
//! sim.restore_from_snapshot(&snapshot).unwrap();
//! assert_eq!(sim.state_hash(), snapshot.hash);
//! ```
//!
//! Not captured: the static world, the configuration (including settings
//! queued for the next tick), the last tick input and the out-of-sync flag.

use serde::{Deserialize, Serialize};
use strider_core::actor::ActorState;
use strider_core::moves::MacroStep;

use crate::simulation::Simulation;

/// A serializable copy of the dynamic simulation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub actor: ActorState,
    pub tick_counter: u64,
    /// Queued playback steps, front first.
    pub forced: Vec<MacroStep>,
    /// BLAKE3 hex digest (64 lowercase hex chars) of the fields above.
    pub hash: String,
}

/// BLAKE3 over a fixed little-endian encoding of the dynamic state.
///
/// Floats are hashed by bit pattern, so `0.0` and `-0.0` differ just as they
/// can make later ticks differ. Layout: tick counter, x, y, vx, vy, push, then
/// one byte each for control, airborne, facing and hazard, then the queue
/// length and two bytes (move, run) per queued step.
fn compute_hash(actor: &ActorState, tick_counter: u64, forced: &[MacroStep]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&tick_counter.to_le_bytes());
    for value in [actor.x, actor.y, actor.vx, actor.vy, actor.push] {
        hasher.update(&value.to_bits().to_le_bytes());
    }
    let hazard = actor.hazard.map_or(0, |kind| kind as u8 + 1);
    hasher.update(&[
        u8::from(actor.can_control),
        u8::from(actor.airborne),
        actor.facing as u8,
        hazard,
    ]);
    hasher.update(&(forced.len() as u64).to_le_bytes());
    for queued in forced {
        hasher.update(&[queued.mv as u8, u8::from(queued.run)]);
    }
    hasher.finalize().to_hex().to_string()
}

impl Simulation {
    pub fn capture_snapshot(&self) -> SimulationSnapshot {
        let actor = *self.actor();
        let tick_counter = self.tick_count();
        let forced: Vec<MacroStep> = self.queued_steps().copied().collect();
        let hash = compute_hash(&actor, tick_counter, &forced);
        SimulationSnapshot {
            actor,
            tick_counter,
            forced,
            hash,
        }
    }

    /// Restore the dynamic state from `snapshot`.
    ///
    /// # Errors
    ///
    /// Fails without touching `self` if the recorded hash does not match the
    /// snapshot's contents, or if the actor state is not finite.
    pub fn restore_from_snapshot(
        &mut self,
        snapshot: &SimulationSnapshot,
    ) -> Result<(), anyhow::Error> {
        let a = &snapshot.actor;
        anyhow::ensure!(
            [a.x, a.y, a.vx, a.vy, a.push].iter().all(|v| v.is_finite()),
            "snapshot at tick {} has a non-finite actor state: {:?}",
            snapshot.tick_counter,
            snapshot.actor
        );

        let recomputed = compute_hash(&snapshot.actor, snapshot.tick_counter, &snapshot.forced);
        anyhow::ensure!(
            recomputed == snapshot.hash,
            "snapshot at tick {} does not match its hash (stored {}, contents hash to {})",
            snapshot.tick_counter,
            snapshot.hash,
            recomputed
        );

        self.restore_parts(
            snapshot.actor,
            snapshot.tick_counter,
            snapshot.forced.iter().copied(),
        );
        Ok(())
    }

    /// BLAKE3 digest of the current dynamic state, equal to
    /// `capture_snapshot().hash`.
    pub fn state_hash(&self) -> String {
        let forced: Vec<MacroStep> = self.queued_steps().copied().collect();
        compute_hash(self.actor(), self.tick_count(), &forced)
    }
}
