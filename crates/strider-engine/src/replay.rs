//! Recorded runs and their re-verification.
//!
//! A [`Recording`] is a starting snapshot plus, for every tick, the
//! [`MacroStep`] the physics actually ran (after playback and forced input
//! were resolved) and the actor state it produced. [`replay`] restores the
//! snapshot and plays the steps again, checking every tick with the same
//! field diff the transition validator uses. A recording is therefore a
//! chain of transitions that can be validated end to end, and its steps
//! double as a key macro.
//!
//! ```
//! use strider_core::prelude::*;
//! use strider_engine::prelude::*;
//!
//! let ground = Polygon::rect(-500.0, -64.0, 500.0, -16.0).unwrap();
//! let world = StaticWorld::new(vec![StaticObject::wall(ground)]);
//! let mut sim = Simulation::new(world, ActorState::grounded(0.0, 0.0), EngineConfig::default());
//!
//! let mut recorder = Recorder::start(&sim);
//! recorder.tick(&mut sim, &TickInput::pressing(&[Key::Up, Key::Right]).with_run(true));
//! recorder.tick(&mut sim, &TickInput::pressing(&[Key::Right]));
//! let recording = recorder.finish();
//! assert_eq!(recording.macro_text(), "WD* D");
//!
//! let report = replay(&mut sim, &recording).unwrap();
//! assert!(report.is_faithful());
//! assert_eq!(report.ticks_replayed, 2);
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use strider_core::actor::ActorState;
use strider_core::moves::MacroStep;

use crate::input::TickInput;
use crate::simulation::Simulation;
use crate::snapshot::SimulationSnapshot;
use crate::validate::TransitionReport;

/// One recorded tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordedTick {
    pub step: MacroStep,
    /// Actor state after the tick.
    pub state: ActorState,
}

/// A run that can be replayed and checked tick by tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub start: SimulationSnapshot,
    /// Ticks in order; the first one is `start.tick_counter`.
    pub ticks: Vec<RecordedTick>,
}

impl Recording {
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// State after the last tick, or the starting state of an empty recording.
    pub fn end_state(&self) -> &ActorState {
        self.ticks.last().map_or(&self.start.actor, |t| &t.state)
    }

    /// The recorded steps as a key macro, readable by
    /// [`Simulation::enqueue_macro`].
    pub fn macro_text(&self) -> String {
        let tokens: Vec<String> = self
            .ticks
            .iter()
            .map(|t| {
                let token = t.step.mv.token();
                if t.step.run {
                    format!("{token}*")
                } else {
                    token.to_owned()
                }
            })
            .collect();
        tokens.join(" ")
    }
}

/// Captures a [`Recording`] by driving a [`Simulation`].
pub struct Recorder {
    recording: Recording,
}

impl Recorder {
    /// Begin recording from `sim`'s current state.
    pub fn start(sim: &Simulation) -> Self {
        Self {
            recording: Recording {
                start: sim.capture_snapshot(),
                ticks: Vec::new(),
            },
        }
    }

    /// Tick `sim` with `input` and record what ran.
    pub fn tick(&mut self, sim: &mut Simulation, input: &TickInput) -> ActorState {
        let state = sim.tick(input);
        if let Some(step) = sim.last_step() {
            self.recording.ticks.push(RecordedTick { step, state });
        }
        state
    }

    pub fn finish(self) -> Recording {
        self.recording
    }
}

/// Where a replay first disagreed with its recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDivergence {
    pub tick: u64,
    pub step: MacroStep,
    /// `expected` is the replayed value, `observed` the recorded one.
    pub report: TransitionReport,
}

/// Outcome of [`replay`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Ticks executed, including a diverging one.
    pub ticks_replayed: u64,
    pub divergence: Option<ReplayDivergence>,
}

impl ReplayReport {
    /// Every recorded tick was reproduced.
    pub fn is_faithful(&self) -> bool {
        self.divergence.is_none()
    }
}

/// Restore `recording.start` on `sim` and play the recorded steps, stopping
/// at the first tick whose x, y, vx or vy differ from the recording.
///
/// The queued playback restored from the snapshot is cleared first: the
/// recorded steps already include whatever it played. An empty recording
/// restores the snapshot and replays nothing.
///
/// # Errors
///
/// Fails without touching `sim` if the starting snapshot does not restore
/// (hash mismatch or non-finite state).
pub fn replay(sim: &mut Simulation, recording: &Recording) -> Result<ReplayReport, anyhow::Error> {
    sim.restore_from_snapshot(&recording.start)
        .context("cannot restore the recording's starting snapshot")?;
    sim.clear_queue();

    let mut ticks_replayed = 0;
    for recorded in &recording.ticks {
        let tick = sim.tick_count();
        let replayed = sim.play_step(recorded.step);
        ticks_replayed += 1;

        let report = TransitionReport::compare(&replayed, &recorded.state);
        if !report.matches {
            tracing::warn!(
                tick,
                mv = recorded.step.mv.token(),
                run = recorded.step.run,
                fields = report.diffs.len(),
                "replay diverged from recording"
            );
            return Ok(ReplayReport {
                ticks_replayed,
                divergence: Some(ReplayDivergence {
                    tick,
                    step: recorded.step,
                    report,
                }),
            });
        }
    }

    Ok(ReplayReport {
        ticks_replayed,
        divergence: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::input::Key;
    use crate::validate::Field;
    use strider_core::geometry::Polygon;
    use strider_core::moves::Move;
    use strider_core::world::{StaticObject, StaticWorld};

    fn world() -> StaticWorld {
        StaticWorld::new(vec![
            StaticObject::wall(Polygon::rect(-1000.0, -64.0, 1000.0, -16.0).unwrap()),
            StaticObject::wall(Polygon::rect(120.0, -16.0, 200.0, 40.0).unwrap()),
        ])
    }

    fn sim() -> Simulation {
        Simulation::new(world(), ActorState::grounded(0.0, 0.0), EngineConfig::default())
    }

    fn input_for(i: u64) -> TickInput {
        match i % 5 {
            0 => TickInput::pressing(&[Key::Up, Key::Right]).with_run(true),
            1 | 2 => TickInput::pressing(&[Key::Right]),
            3 => TickInput::idle(),
            _ => TickInput::pressing(&[Key::Left]),
        }
    }

    fn record(sim: &mut Simulation, ticks: u64) -> Recording {
        let mut recorder = Recorder::start(sim);
        for i in 0..ticks {
            recorder.tick(sim, &input_for(i));
        }
        recorder.finish()
    }

    #[test]
    fn recorded_run_replays_exactly() {
        let mut sim = sim();
        let recording = record(&mut sim, 60);
        let end = *sim.actor();

        let report = replay(&mut sim, &recording).unwrap();
        assert!(report.is_faithful());
        assert_eq!(report.ticks_replayed, 60);
        assert_eq!(*sim.actor(), end);
        assert_eq!(*recording.end_state(), end);
    }

    #[test]
    fn queued_playback_is_recorded_as_played() {
        let mut sim = sim();
        sim.enqueue_macro("D* D* WD*");
        let recording = record_idle(&mut sim, 4);
        assert_eq!(recording.macro_text(), "D* D* WD* N");
        assert_eq!(recording.start.forced.len(), 3);

        let report = replay(&mut sim, &recording).unwrap();
        assert!(report.is_faithful());
        assert_eq!(sim.queue_len(), 0);
    }

    fn record_idle(sim: &mut Simulation, ticks: u64) -> Recording {
        let mut recorder = Recorder::start(sim);
        for _ in 0..ticks {
            recorder.tick(sim, &TickInput::idle());
        }
        recorder.finish()
    }

    #[test]
    fn edited_state_is_reported_at_its_tick() {
        let mut sim = sim();
        let mut recording = record(&mut sim, 20);
        recording.ticks[10].state.x += 0.5;

        let report = replay(&mut sim, &recording).unwrap();
        assert!(!report.is_faithful());
        assert_eq!(report.ticks_replayed, 11);
        let divergence = report.divergence.unwrap();
        assert_eq!(divergence.tick, 10);
        assert_eq!(divergence.report.diffs.len(), 1);
        assert_eq!(divergence.report.diffs[0].field, Field::X);
    }

    #[test]
    fn empty_recording_only_restores() {
        let mut sim = sim();
        let recording = Recorder::start(&sim).finish();
        sim.run_idle(5);

        let report = replay(&mut sim, &recording).unwrap();
        assert!(report.is_faithful());
        assert_eq!(report.ticks_replayed, 0);
        assert_eq!(sim.tick_count(), 0);
        assert_eq!(recording.macro_text(), "");
        assert_eq!(recording.end_state(), &recording.start.actor);
    }

    #[test]
    fn corrupt_start_is_rejected_before_touching_sim() {
        let mut sim = sim();
        let mut recording = record(&mut sim, 5);
        recording.start.tick_counter += 1;
        let before = sim.state_hash();

        let err = replay(&mut sim, &recording).unwrap_err();
        assert!(format!("{err:#}").contains("does not match its hash"));
        assert_eq!(sim.state_hash(), before);
    }

    #[test]
    fn recording_macro_drives_an_identical_run() {
        let mut sim = sim();
        let recording = record(&mut sim, 30);

        let mut other = self::sim();
        assert_eq!(other.enqueue_macro(&recording.macro_text()), 30);
        other.run_idle(30);
        assert_eq!(other.actor(), recording.end_state());
    }

    #[test]
    fn recording_survives_json() {
        let mut sim = sim();
        let recording = record(&mut sim, 15);
        let json = serde_json::to_string(&recording).unwrap();
        let back: Recording = serde_json::from_str(&json).unwrap();
        assert_eq!(back, recording);
        assert!(replay(&mut sim, &back).unwrap().is_faithful());
        assert_eq!(back.ticks[0].step.mv, Move::WD);
    }
}
