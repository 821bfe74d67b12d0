//! The authoritative fixed-timestep tick loop for one actor.
//!
//! [`Simulation`] owns the actor state and advances it with exactly one call
//! to [`strider_core::physics::step`] per tick. Each tick:
//!
//! 1. Settings queued with [`Simulation::queue_settings`] are applied.
//! 2. The input for the tick is chosen. A forced input is used as-is and
//!    leaves queued playback alone. A player input with any key held cancels
//!    queued playback. Otherwise the next queued step (if any) is played.
//! 3. The physics step runs and the tick counter advances.
//!
//! Planned routes and key macros are played back through the same queue, so
//! they go through the same code path as live input.
//!
//! # Example
//!
//! ```
//! use strider_core::prelude::*;
//! use strider_engine::prelude::*;
//!
//! let ground = Polygon::rect(-500.0, -64.0, 500.0, -16.0).unwrap();
//! let world = StaticWorld::new(vec![StaticObject::wall(ground)]);
//! let mut sim = Simulation::new(world, ActorState::grounded(0.0, 0.0), EngineConfig::default());
//!
//! sim.enqueue_macro("D* D* D*");
//! for _ in 0..3 {
//!     sim.tick(&TickInput::idle());
//! }
//! assert_eq!(sim.actor().x, 12.0);
//! assert_eq!(sim.tick_count(), 3);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use strider_core::actor::ActorState;
use strider_core::geometry::Point;
use strider_core::moves::{parse_macro, MacroStep};
use strider_core::physics::step;
use strider_core::settings::TICK_S;
use strider_core::world::StaticWorld;
use strider_search::planner::plan;
use strider_search::SearchError;

use crate::config::EngineConfig;
use crate::input::TickInput;
use crate::validate::TransitionReport;

/// Single-actor deterministic simulation.
pub struct Simulation {
    /// Level geometry used for gameplay ticks.
    world: Arc<StaticWorld>,
    /// Level geometry the planner sees (hazards extended).
    search_world: Arc<StaticWorld>,
    actor: ActorState,
    config: EngineConfig,
    /// Settings to apply at the start of the next tick.
    pending_config: Option<EngineConfig>,
    tick_counter: u64,
    /// Queued playback (plans and macros), one step per tick.
    forced: VecDeque<MacroStep>,
    /// Input of the most recent tick.
    current_input: TickInput,
    /// Step the physics actually ran on the most recent tick.
    last_step: Option<MacroStep>,
    /// Set on the first mismatching transition; cleared only explicitly.
    out_of_sync: bool,
    last_report: Option<TransitionReport>,
}

impl Simulation {
    pub fn new(world: impl Into<Arc<StaticWorld>>, actor: ActorState, config: EngineConfig) -> Self {
        let world = world.into();
        let search_world = build_search_world(&world, config.extend_deadly_hitbox);
        Self {
            world,
            search_world,
            actor,
            config,
            pending_config: None,
            tick_counter: 0,
            forced: VecDeque::new(),
            current_input: TickInput::default(),
            last_step: None,
            out_of_sync: false,
            last_report: None,
        }
    }

    // -- tick -----------------------------------------------------------------

    fn begin_tick(&mut self) {
        if let Some(config) = self.pending_config.take() {
            if config.extend_deadly_hitbox != self.config.extend_deadly_hitbox {
                self.search_world = build_search_world(&self.world, config.extend_deadly_hitbox);
            }
            tracing::info!(tick = self.tick_counter, "applied queued settings");
            self.config = config;
        }
    }

    /// Pick the step to play this tick, updating the playback queue.
    fn select_step(&mut self, input: &TickInput) -> MacroStep {
        if input.force_keys {
            return input.to_macro();
        }
        if !input.is_empty() {
            if !self.forced.is_empty() {
                tracing::info!(
                    dropped = self.forced.len(),
                    "player input cancelled queued playback"
                );
                self.forced.clear();
            }
            return input.to_macro();
        }
        self.forced.pop_front().unwrap_or_else(|| input.to_macro())
    }

    /// Advance one tick with `input` and return the new actor state.
    pub fn tick(&mut self, input: &TickInput) -> ActorState {
        self.begin_tick();
        let chosen = self.select_step(input);
        self.advance(chosen, input.clone())
    }

    /// Advance one tick running exactly `chosen`, bypassing input selection.
    /// Queued playback is left untouched.
    pub fn play_step(&mut self, chosen: MacroStep) -> ActorState {
        self.begin_tick();
        self.advance(chosen, TickInput::forced(chosen))
    }

    fn advance(&mut self, chosen: MacroStep, input: TickInput) -> ActorState {
        self.actor = step(
            &self.actor,
            &self.world,
            chosen.mv,
            chosen.run,
            &self.config.physics,
        );
        self.current_input = input;
        self.last_step = Some(chosen);
        self.tick_counter += 1;
        self.actor
    }

    /// Advance one tick whose result was already computed by a client.
    ///
    /// The client's state is adopted either way. With
    /// `validate_transitions` on, the canonical result is diffed against it
    /// and a mismatch marks the simulation out of sync.
    pub fn tick_observed(
        &mut self,
        input: &TickInput,
        observed: &ActorState,
    ) -> Option<&TransitionReport> {
        self.begin_tick();
        let chosen = self.select_step(input);

        if self.config.validate_transitions {
            let expected = step(
                &self.actor,
                &self.world,
                chosen.mv,
                chosen.run,
                &self.config.physics,
            );
            let report = TransitionReport::compare(&expected, observed);
            if !report.matches {
                for diff in &report.diffs {
                    tracing::warn!(
                        tick = self.tick_counter,
                        field = diff.field.name(),
                        expected = diff.expected,
                        observed = diff.observed,
                        "transition out of sync"
                    );
                }
                self.out_of_sync = true;
            }
            self.last_report = Some(report);
        }

        self.actor = *observed;
        self.current_input = input.clone();
        self.last_step = Some(chosen);
        self.tick_counter += 1;
        if self.config.validate_transitions {
            self.last_report.as_ref()
        } else {
            None
        }
    }

    /// Run `count` ticks with no player input.
    pub fn run_idle(&mut self, count: u64) -> ActorState {
        let idle = TickInput::idle();
        for _ in 0..count {
            self.tick(&idle);
        }
        self.actor
    }

    // -- playback -------------------------------------------------------------

    /// Plan a route from the current state to `target` and queue it,
    /// replacing any queued playback. Returns the number of queued ticks.
    ///
    /// # Errors
    ///
    /// Any [`SearchError`]; the queue is left untouched in that case.
    pub fn plan_to(&mut self, target: Point) -> Result<usize, SearchError> {
        let settings = self.config.search_settings();
        let route = plan(&self.actor, target, &self.search_world, &settings)?;
        self.forced.clear();
        self.forced.extend(route.macro_steps());
        tracing::info!(
            ticks = route.ticks(),
            target_x = target.x,
            target_y = target.y,
            "queued planned route"
        );
        Ok(route.ticks())
    }

    /// Queue the steps of a key macro after any queued playback. Returns the
    /// number of steps queued; malformed tokens are skipped.
    pub fn enqueue_macro(&mut self, text: &str) -> usize {
        let steps = parse_macro(text);
        let count = steps.len();
        self.forced.extend(steps);
        count
    }

    /// Queue raw steps after any queued playback.
    pub fn enqueue_steps<I: IntoIterator<Item = MacroStep>>(&mut self, steps: I) {
        self.forced.extend(steps);
    }

    pub fn clear_queue(&mut self) {
        self.forced.clear();
    }

    pub fn queued_steps(&self) -> impl Iterator<Item = &MacroStep> + '_ {
        self.forced.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.forced.len()
    }

    // -- settings -------------------------------------------------------------

    /// Replace the configuration at the next tick boundary. A later call
    /// before that tick overwrites an earlier one.
    pub fn queue_settings(&mut self, config: EngineConfig) {
        self.pending_config = Some(config);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn has_pending_settings(&self) -> bool {
        self.pending_config.is_some()
    }

    // -- sync state -----------------------------------------------------------

    /// Whether any validated transition has mismatched.
    pub fn is_out_of_sync(&self) -> bool {
        self.out_of_sync
    }

    pub fn last_report(&self) -> Option<&TransitionReport> {
        self.last_report.as_ref()
    }

    /// Clear the out-of-sync flag after the caller has surfaced it.
    pub fn acknowledge_desync(&mut self) {
        self.out_of_sync = false;
    }

    // -- accessors ------------------------------------------------------------

    pub fn actor(&self) -> &ActorState {
        &self.actor
    }

    pub fn world(&self) -> &StaticWorld {
        &self.world
    }

    /// The world the planner searches, with hazards extended by
    /// `extend_deadly_hitbox`.
    pub fn search_world(&self) -> &StaticWorld {
        &self.search_world
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulation time in seconds, computed from the tick count.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * TICK_S
    }

    pub fn current_input(&self) -> &TickInput {
        &self.current_input
    }

    /// The move and run flag the most recent tick ran with, after playback
    /// and forced input were resolved.
    pub fn last_step(&self) -> Option<MacroStep> {
        self.last_step
    }

    pub(crate) fn restore_parts(
        &mut self,
        actor: ActorState,
        tick_counter: u64,
        forced: impl IntoIterator<Item = MacroStep>,
    ) {
        self.actor = actor;
        self.tick_counter = tick_counter;
        self.forced = forced.into_iter().collect();
        self.current_input = TickInput::default();
        self.last_step = None;
    }
}

fn build_search_world(world: &Arc<StaticWorld>, margin: f64) -> Arc<StaticWorld> {
    if margin > 0.0 {
        Arc::new(world.with_extended_hazards(margin))
    } else {
        Arc::clone(world)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
