//! Best-first route planner.
//!
//! Every edge is one tick: a frontier node is expanded by running
//! [`strider_core::physics::step`] once per allowed (move, run) pair. Nodes
//! are ranked by `ticks + weight * distance_to_target` and pruned by a
//! dominance map from [`StateKey`] to the fewest ticks seen for it. A child
//! is kept only if it strictly improves on that entry.
//!
//! # Parallel expansion
//!
//! With `state_batch_size > 1`, up to that many nodes are popped at once and
//! expanded on the rayon pool. Workers only read the shared world and the
//! node arena. Their children are merged on the calling thread in batch
//! order, then move order, so the dominance map has a single writer and the
//! result does not depend on thread scheduling.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strider_core::actor::ActorState;
use strider_core::geometry::Point;
use strider_core::hitbox::ACTOR_HALF_EXTENT;
use strider_core::moves::{MacroStep, Move};
use strider_core::physics::step;
use strider_core::world::StaticWorld;

use crate::key::StateKey;
use crate::settings::SearchSettings;
use crate::SearchError;

/// A state within this distance of the target on both axes is a goal.
pub const GOAL_TOLERANCE: f64 = ACTOR_HALF_EXTENT;

/// Iterations between progress log lines.
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Iterations between wall-clock checks.
const DEADLINE_CHECK_INTERVAL: u64 = 1_000;

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// One tick of a plan: the input to hold and the state it produces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub mv: Move,
    pub run: bool,
    pub state: ActorState,
}

impl PlanStep {
    pub fn as_macro(&self) -> MacroStep {
        MacroStep {
            mv: self.mv,
            run: self.run,
        }
    }
}

/// A successful search result.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Inputs in playback order. Empty if the start was already a goal.
    pub steps: Vec<PlanStep>,
    /// Frontier nodes expanded.
    pub iterations: u64,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl Plan {
    /// Ticks needed to play the plan back.
    pub fn ticks(&self) -> usize {
        self.steps.len()
    }

    /// State after the last step.
    pub fn final_state(&self) -> Option<&ActorState> {
        self.steps.last().map(|s| &s.state)
    }

    /// Inputs only, without the predicted states.
    pub fn macro_steps(&self) -> Vec<MacroStep> {
        self.steps.iter().map(PlanStep::as_macro).collect()
    }
}

// ---------------------------------------------------------------------------
// Search internals
// ---------------------------------------------------------------------------

struct Node {
    state: ActorState,
    key: StateKey,
    ticks: u32,
    parent: Option<usize>,
    via: Option<MacroStep>,
}

struct Child {
    state: ActorState,
    via: MacroStep,
}

/// Min-heap entry: lowest priority first, then insertion order.
struct FrontierEntry {
    priority: f64,
    seq: u64,
    node: usize,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

struct Search<'a> {
    world: &'a StaticWorld,
    settings: &'a SearchSettings,
    target: Point,
    nodes: Vec<Node>,
    frontier: BinaryHeap<FrontierEntry>,
    best_ticks: HashMap<StateKey, u32>,
    next_seq: u64,
    iterations: u64,
}

impl<'a> Search<'a> {
    fn new(world: &'a StaticWorld, settings: &'a SearchSettings, target: Point) -> Self {
        Self {
            world,
            settings,
            target,
            nodes: Vec::new(),
            frontier: BinaryHeap::new(),
            best_ticks: HashMap::new(),
            next_seq: 0,
            iterations: 0,
        }
    }

    fn seed(&mut self, start: ActorState) {
        let key = StateKey::of(&start, self.settings);
        self.best_ticks.insert(key, 0);
        self.nodes.push(Node {
            state: start,
            key,
            ticks: 0,
            parent: None,
            via: None,
        });
        self.push_frontier(0);
    }

    fn push_frontier(&mut self, index: usize) {
        let node = &self.nodes[index];
        let distance = node.state.position().distance(self.target);
        let priority = f64::from(node.ticks) + self.settings.distance_weight() * distance;
        self.frontier.push(FrontierEntry {
            priority,
            seq: self.next_seq,
            node: index,
        });
        self.next_seq += 1;
    }

    /// A node is stale once a cheaper node with the same key was recorded.
    fn is_stale(&self, index: usize) -> bool {
        let node = &self.nodes[index];
        self.best_ticks
            .get(&node.key)
            .is_some_and(|&best| best < node.ticks)
    }

    fn pop_batch(&mut self) -> Vec<usize> {
        let size = self.settings.batch_size();
        let mut batch = Vec::with_capacity(size);
        while batch.len() < size {
            let Some(entry) = self.frontier.pop() else {
                break;
            };
            if self.is_stale(entry.node) {
                continue;
            }
            batch.push(entry.node);
        }
        batch
    }

    fn expand(&self, index: usize) -> Vec<Child> {
        let parent = &self.nodes[index];
        if self
            .settings
            .max_ticks
            .is_some_and(|max| parent.ticks >= max)
        {
            return Vec::new();
        }

        let mut children = Vec::new();
        for &mv in self.settings.moves() {
            for &run in self.settings.run_variants(mv) {
                let state = step(&parent.state, self.world, mv, run, &self.settings.physics);
                if state.hazard.is_some() {
                    continue;
                }
                children.push(Child {
                    state,
                    via: MacroStep { mv, run },
                });
            }
        }
        children
    }

    fn expand_batch(&self, batch: &[usize]) -> Vec<Vec<Child>> {
        if batch.len() > 1 {
            batch.par_iter().map(|&i| self.expand(i)).collect()
        } else {
            batch.iter().map(|&i| self.expand(i)).collect()
        }
    }

    /// Record `child` unless dominated. Returns its index if it is a goal.
    fn admit(&mut self, parent: usize, child: Child) -> Option<usize> {
        let ticks = self.nodes[parent].ticks + 1;
        let key = StateKey::of(&child.state, self.settings);
        if self
            .best_ticks
            .get(&key)
            .is_some_and(|&best| best <= ticks)
        {
            return None;
        }
        self.best_ticks.insert(key, ticks);

        let index = self.nodes.len();
        self.nodes.push(Node {
            state: child.state,
            key,
            ticks,
            parent: Some(parent),
            via: Some(child.via),
        });

        if child.state.within(self.target, GOAL_TOLERANCE) {
            return Some(index);
        }
        self.push_frontier(index);
        None
    }

    fn reconstruct(&self, goal: usize) -> Vec<PlanStep> {
        let mut steps = Vec::new();
        let mut cursor = Some(goal);
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            if let Some(via) = node.via {
                steps.push(PlanStep {
                    mv: via.mv,
                    run: via.run,
                    state: node.state,
                });
            }
            cursor = node.parent;
        }
        steps.reverse();
        steps
    }

    fn run(&mut self, started: Instant) -> Result<Vec<PlanStep>, SearchError> {
        let deadline = started + self.settings.timeout_duration();
        let mut next_check = DEADLINE_CHECK_INTERVAL;
        let mut next_report = PROGRESS_INTERVAL;

        loop {
            let batch = self.pop_batch();
            if batch.is_empty() {
                return Err(SearchError::Exhausted {
                    iterations: self.iterations,
                });
            }
            self.iterations += batch.len() as u64;

            if self.iterations >= next_report {
                next_report = self.iterations + PROGRESS_INTERVAL;
                tracing::debug!(
                    iterations = self.iterations,
                    frontier = self.frontier.len(),
                    known_states = self.best_ticks.len(),
                    "planner progress"
                );
            }
            if self.iterations >= next_check {
                next_check = self.iterations + DEADLINE_CHECK_INTERVAL;
                if Instant::now() >= deadline {
                    return Err(SearchError::TimedOut {
                        iterations: self.iterations,
                        elapsed: started.elapsed(),
                    });
                }
            }

            let expanded = self.expand_batch(&batch);
            for (parent, children) in batch.into_iter().zip(expanded) {
                for child in children {
                    if let Some(goal) = self.admit(parent, child) {
                        return Ok(self.reconstruct(goal));
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Search for the fewest-tick input sequence that brings `start` within
/// [`GOAL_TOLERANCE`] of `target`.
///
/// The world is used as given; callers that want a safety margin around
/// hazards pass a copy built with [`StaticWorld::with_extended_hazards`].
///
/// # Errors
///
/// [`SearchError::TimedOut`] when the deadline passes and
/// [`SearchError::Exhausted`] when no unexplored state remains. Both mean
/// "no path found".
pub fn plan(
    start: &ActorState,
    target: Point,
    world: &StaticWorld,
    settings: &SearchSettings,
) -> Result<Plan, SearchError> {
    let started = Instant::now();
    tracing::info!(
        start_x = start.x,
        start_y = start.y,
        target_x = target.x,
        target_y = target.y,
        moves = settings.moves().len(),
        heuristic_weight = settings.heuristic_weight,
        batch = settings.batch_size(),
        "planner started"
    );

    if start.within(target, GOAL_TOLERANCE) {
        return Ok(Plan {
            steps: Vec::new(),
            iterations: 0,
            elapsed: started.elapsed(),
        });
    }

    let mut search = Search::new(world, settings, target);
    search.seed(*start);

    match search.run(started) {
        Ok(steps) => {
            let plan = Plan {
                steps,
                iterations: search.iterations,
                elapsed: started.elapsed(),
            };
            tracing::info!(
                ticks = plan.ticks(),
                iterations = plan.iterations,
                elapsed_ms = plan.elapsed.as_millis() as u64,
                "path found"
            );
            Ok(plan)
        }
        Err(e) => {
            tracing::info!(error = %e, "path not found");
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
