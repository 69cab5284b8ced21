//! Predictive hybrid scheduler.
//!
//! [`HybridScheduler`] owns the device's [`ResourceState`] and decides, for
//! the current [`TaskQueue`], whether to execute a task, idle, or shed one.
//!
//! # Decision procedure
//! 1. The first `breadth` entries are the candidates.
//! 2. Each candidate is executed on a private copy of state and queue, then
//!    a greedy [`rollout`] of depth `horizon - 1` projects its future cost.
//! 3. Candidates projecting an infinite cost are discarded.  If none are
//!    left the **crisis protocol** drops the lowest-priority candidate.
//! 4. If every candidate is high-priority (**emergency**) the cheapest one
//!    is executed; idling is not an option.
//! 5. Otherwise the cost of idling one step is compared with the cheapest
//!    candidate.  Idle wins only if strictly cheaper.
//!
//! # Design decisions
//!
//! | Topic | Choice |
//! |---|---|
//! | Decision value | `Decision` sum type — `Execute` / `Idle` / `Drop` |
//! | Entry identity | `EntryId` assigned at enqueue; removal by id, never by value |
//! | Branch isolation | Every branch clones state and queue; rollouts take ownership |
//! | Rollout | Iterative with an explicit depth counter |
//! | Configuration | `SchedulerConfig` + shared `Arc<TaskCatalog>`, fixed for the run |
//!
//! # Example
//! ```rust
//! use std::sync::Arc;
//! use sentry_sched::config::{SchedulerConfig, TaskCatalog};
//! use sentry_sched::scheduler::{Decision, HybridScheduler};
//! use sentry_sched::task::TaskQueue;
//!
//! let mut scheduler = HybridScheduler::new(Arc::new(TaskCatalog::greenhouse()), SchedulerConfig::default());
//! let mut queue = TaskQueue::new();
//! queue.push("MONITOR_WATER_LEVEL", 10);
//!
//! let decision = scheduler.decide(&queue, false).unwrap();
//! assert!(matches!(decision, Decision::Execute(_)));
//! scheduler.apply(&decision, &mut queue);
//! assert!(queue.is_empty());
//! ```

pub mod cost;
pub mod decision;
pub mod error;
pub mod rollout;
pub mod strategy;

pub use cost::{cost, cost_breakdown, is_overloaded, CostBreakdown};
pub use decision::Decision;
pub use error::{SchedulerError, SimulationError};
pub use rollout::rollout;
pub use strategy::Strategy;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{SchedulerConfig, TaskCatalog};
use crate::task::{EntryId, QueueEntry, ResourceState, TaskQueue};

// ── State transitions ─────────────────────────────────────────────────────────

/// Execute the entry `id`: charge its cost, decay, remove it, age the rest.
///
/// Returns the removed entry, or `None` (and changes nothing) if `id` is no
/// longer queued.
pub fn execute_transition(
    state: &mut ResourceState,
    queue: &mut TaskQueue,
    id: EntryId,
    catalog: &TaskCatalog,
    config: &SchedulerConfig,
) -> Option<QueueEntry> {
    let entry = queue.remove(id)?;
    state.charge(catalog.profile(&entry.type_name));
    state.decay(config.decay);
    queue.age();
    Some(entry)
}

/// Let one step pass without running anything.
pub fn idle_transition(state: &mut ResourceState, queue: &mut TaskQueue, config: &SchedulerConfig) {
    state.decay(config.decay);
    queue.age();
}

// ── Narration ─────────────────────────────────────────────────────────────────

/// Diagnostic lines produced while reaching one decision.
///
/// Consumed once; call [`HybridScheduler::explain`] again for a fresh copy.
#[derive(Debug)]
pub struct Narration(std::vec::IntoIter<String>);

impl Iterator for Narration {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Narration {}

/// Where narration goes.  Never influences the decision.
enum Narrator {
    Silent,
    Log,
    Collect(Vec<String>),
}

impl Narrator {
    fn say(&mut self, line: fmt::Arguments<'_>) {
        match self {
            Narrator::Silent => {}
            Narrator::Log => info!("  - {}", line),
            Narrator::Collect(lines) => lines.push(line.to_string()),
        }
    }
}

struct CandidateOutcome {
    entry: QueueEntry,
    projected_cost: f64,
}

// ── HybridScheduler ───────────────────────────────────────────────────────────

/// Rollout-based scheduler with emergency and patience rules.
///
/// The resource state is exclusively owned; concurrent comparisons must use
/// separate instances.
#[derive(Debug, Clone)]
pub struct HybridScheduler {
    state: ResourceState,
    catalog: Arc<TaskCatalog>,
    config: SchedulerConfig,
}

impl HybridScheduler {
    /// Create a scheduler for an idle device.
    pub fn new(catalog: Arc<TaskCatalog>, config: SchedulerConfig) -> Self {
        Self {
            state: ResourceState::default(),
            catalog,
            config,
        }
    }

    /// Start from a given load instead of an idle device.
    pub fn with_state(mut self, state: ResourceState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // ── Public entry points ───────────────────────────────────────────────────

    /// Decide the next action for `queue`.
    ///
    /// Returns `None` only when the queue is empty.  With `verbose` the
    /// reasoning is logged at `info` level.
    pub fn decide(&self, queue: &TaskQueue, verbose: bool) -> Option<Decision> {
        let mut narrator = if verbose {
            Narrator::Log
        } else {
            Narrator::Silent
        };
        self.evaluate(queue, &mut narrator)
    }

    /// Like [`decide`](Self::decide), but hands the reasoning back as lines.
    pub fn explain(&self, queue: &TaskQueue) -> (Option<Decision>, Narration) {
        let mut narrator = Narrator::Collect(Vec::new());
        let decision = self.evaluate(queue, &mut narrator);
        let lines = match narrator {
            Narrator::Collect(lines) => lines,
            _ => Vec::new(),
        };
        (decision, Narration(lines.into_iter()))
    }

    /// Carry out `decision` on the held state and `queue`.
    ///
    /// Returns the entry that left the queue (executed or dropped), if any.
    /// A decision naming an entry that is no longer queued changes nothing.
    pub fn apply(&mut self, decision: &Decision, queue: &mut TaskQueue) -> Option<QueueEntry> {
        match decision {
            Decision::Execute(entry) => self.execute(queue, entry.id),
            Decision::Idle => {
                self.idle(queue);
                None
            }
            Decision::Drop(entry) => queue.remove(entry.id),
        }
    }

    pub fn execute(&mut self, queue: &mut TaskQueue, id: EntryId) -> Option<QueueEntry> {
        execute_transition(&mut self.state, queue, id, &self.catalog, &self.config)
    }

    pub fn idle(&mut self, queue: &mut TaskQueue) {
        idle_transition(&mut self.state, queue, &self.config);
    }

    // ── Policy ────────────────────────────────────────────────────────────────

    fn evaluate(&self, queue: &TaskQueue, narrator: &mut Narrator) -> Option<Decision> {
        let candidates = queue.candidates(self.config.breadth);
        if candidates.is_empty() {
            return None;
        }

        let outcomes: Vec<CandidateOutcome> = candidates
            .iter()
            .map(|entry| {
                let projected_cost = self.project(queue, entry.id);
                narrator.say(format_args!(
                    "Simulating '{}'... leads to future cost: {:.2}",
                    entry.type_name, projected_cost
                ));
                CandidateOutcome {
                    entry: entry.clone(),
                    projected_cost,
                }
            })
            .collect();

        let best = outcomes
            .iter()
            .filter(|o| o.projected_cost.is_finite())
            .min_by(|a, b| a.projected_cost.total_cmp(&b.projected_cost));

        // ── Crisis protocol ───────────────────────────────────────────────────
        let Some(best) = best else {
            let victim = candidates.iter().min_by_key(|e| e.priority)?;
            narrator.say(format_args!(
                "EXPLAIN: All task paths predict overload. Activating crisis protocol, shedding '{}' (P:{}).",
                victim.type_name, victim.priority
            ));
            debug!(task = %victim.type_name, id = %victim.id, "crisis protocol: drop");
            return Some(Decision::Drop(victim.clone()));
        };

        // ── Emergency: act now ────────────────────────────────────────────────
        let is_emergency = candidates
            .iter()
            .all(|e| e.priority >= self.config.emergency_threshold);
        if is_emergency {
            narrator.say(format_args!(
                "EXPLAIN: Emergency detected (all candidates are high-priority). Acting aggressively."
            ));
            debug!(task = %best.entry.type_name, cost = best.projected_cost, "emergency: execute");
            return Some(Decision::Execute(best.entry.clone()));
        }

        // ── Patience vs action ────────────────────────────────────────────────
        let idle = self.idle_cost(queue);
        narrator.say(format_args!(
            "Simulating 'IDLE'... leads to future cost: {:.2} (Load: {:.2}, Wait: {:.2})",
            idle.total, idle.load, idle.wait
        ));

        if idle.total < best.projected_cost {
            narrator.say(format_args!(
                "EXPLAIN: Cost to IDLE ({:.2}) is less than cost to act ({:.2}). Choosing patience.",
                idle.total, best.projected_cost
            ));
            debug!(idle = idle.total, act = best.projected_cost, "idle");
            Some(Decision::Idle)
        } else {
            narrator.say(format_args!(
                "EXPLAIN: Cost to act ({:.2}) is less than/equal to cost to IDLE ({:.2}). Taking action.",
                best.projected_cost, idle.total
            ));
            debug!(task = %best.entry.type_name, act = best.projected_cost, idle = idle.total, "execute");
            Some(Decision::Execute(best.entry.clone()))
        }
    }

    /// Execute `id` on a private branch, then roll out the remaining horizon.
    fn project(&self, queue: &TaskQueue, id: EntryId) -> f64 {
        let mut state = self.state;
        let mut branch = queue.clone();
        execute_transition(&mut state, &mut branch, id, &self.catalog, &self.config);
        rollout(
            state,
            branch,
            self.config.horizon.saturating_sub(1),
            &self.catalog,
            &self.config,
        )
    }

    /// Cost one idle step from now, scored directly (no rollout).
    fn idle_cost(&self, queue: &TaskQueue) -> CostBreakdown {
        let mut state = self.state;
        let mut branch = queue.clone();
        idle_transition(&mut state, &mut branch, &self.config);
        cost_breakdown(&state, &branch, &self.config)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
