//! Simulation harness.
//!
//! Drives one [`Strategy`] against a private copy of a task queue until the
//! queue drains, and reports aggregate [`Metrics`].  The caller's queue is
//! never modified.
//!
//! Each run builds its own [`HybridScheduler`], so runs comparing several
//! strategies never share resource state.

pub mod generator;
pub mod metrics;

pub use generator::{generate_queue, generate_seeded_queue};
pub use metrics::{Metrics, MetricsCollector};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{SchedulerConfig, TaskCatalog};
use crate::scheduler::{Decision, HybridScheduler, SimulationError, Strategy};
use crate::task::TaskQueue;

/// Decisions allowed per queued entry before a run counts as stalled.
///
/// Every step either removes an entry or idles; only an endless run of idles
/// can exhaust this.
const STEP_BUDGET_PER_ENTRY: usize = 1_000;

/// Run `strategy` over a copy of `queue` until it is empty.
///
/// # Errors
/// * [`SimulationError::Scheduler`] if `config` fails validation.
/// * [`SimulationError::NoDecision`] if the strategy gives up while work is
///   still queued.
/// * [`SimulationError::Stalled`] if the step budget is exhausted.
pub fn run(
    strategy: Strategy,
    queue: &TaskQueue,
    catalog: Arc<TaskCatalog>,
    config: &SchedulerConfig,
) -> Result<Metrics, SimulationError> {
    config.validate()?;

    let mut queue = queue.clone();
    let mut scheduler = HybridScheduler::new(catalog, *config);
    let mut collector = MetricsCollector::new();
    let budget = queue.len().saturating_mul(STEP_BUDGET_PER_ENTRY);
    let mut steps = 0usize;

    info!(strategy = %strategy, task_count = queue.len(), "=== simulation started ===");

    while !queue.is_empty() {
        if steps >= budget {
            warn!(strategy = %strategy, steps, pending = queue.len(), "simulation stalled");
            return Err(SimulationError::Stalled {
                steps,
                pending: queue.len(),
            });
        }
        steps += 1;

        collector.sample(&scheduler.state());

        let Some(decision) = strategy.select(&scheduler, &queue) else {
            return Err(SimulationError::NoDecision {
                pending: queue.len(),
            });
        };

        debug!(step = steps, decision = %decision, "decision");

        apply_and_record(&mut scheduler, &decision, &mut queue, &mut collector);
    }

    let metrics = collector.finish();
    info!(
        strategy = %strategy,
        steps = metrics.steps,
        executed = metrics.executed_count,
        dropped = metrics.drop_count,
        overloads = metrics.overload_count,
        "=== simulation complete ==="
    );
    Ok(metrics)
}

/// Apply one decision and count what actually happened.
///
/// Executions and drops are counted only when an entry actually left the
/// queue.
fn apply_and_record(
    scheduler: &mut HybridScheduler,
    decision: &Decision,
    queue: &mut TaskQueue,
    collector: &mut MetricsCollector,
) {
    let config = *scheduler.config();
    match decision {
        Decision::Drop(_) => {
            if scheduler.apply(decision, queue).is_some() {
                collector.record_drop();
            }
        }
        Decision::Idle => {
            scheduler.apply(decision, queue);
            collector.record_idle();
        }
        Decision::Execute(entry) => {
            let high_priority = entry.priority >= config.emergency_threshold;
            let Some(executed) = scheduler.apply(decision, queue) else {
                warn!(task = %entry.type_name, id = %entry.id, "execute named an entry that is no longer queued");
                return;
            };
            if high_priority {
                collector.record_high_priority_wait(executed.time_in_queue);
            }
            collector.record_execution();

            let state = scheduler.state();
            if state.processing_load > config.processing_limit {
                warn!(
                    task = %executed.type_name,
                    processing_load = state.processing_load,
                    "overload after execution"
                );
                collector.record_overload();
            }
        }
    }
}

/// [`run`] with the strategy given by name.
///
/// Accepts `"RoundRobin"`, `"StrictPriority"`, `"Hybrid"` and the long-form
/// labels understood by [`Strategy`]'s `FromStr` impl.
pub fn run_simulation(
    strategy_name: &str,
    queue: &TaskQueue,
    catalog: Arc<TaskCatalog>,
    config: &SchedulerConfig,
) -> Result<Metrics, SimulationError> {
    let strategy: Strategy = strategy_name.parse()?;
    run(strategy, queue, catalog, config)
}

/// Run every strategy on the same queue, each on its own scheduler.
pub fn compare(
    queue: &TaskQueue,
    catalog: Arc<TaskCatalog>,
    config: &SchedulerConfig,
) -> Result<Vec<(Strategy, Metrics)>, SimulationError> {
    Strategy::ALL
        .into_iter()
        .map(|s| run(s, queue, Arc::clone(&catalog), config).map(|m| (s, m)))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SchedulerError;
    use crate::task::{ResourceState, TaskProfile};

    fn heavy_catalog() -> Arc<TaskCatalog> {
        Arc::new(TaskCatalog::default().with_task("Heavy", TaskProfile::new(200.0, 0.0), 1))
    }

    #[test]
    fn empty_queue_reports_all_zero() {
        let cfg = SchedulerConfig::default();
        for s in Strategy::ALL {
            let m = run(s, &TaskQueue::new(), Arc::new(TaskCatalog::greenhouse()), &cfg).unwrap();
            assert_eq!(m.overload_count, 0);
            assert_eq!(m.drop_count, 0);
            assert_eq!(m.peak_processing_load, 0.0);
            assert_eq!(m.peak_memory_load, 0.0);
            assert_eq!(m.avg_high_priority_wait, 0.0);
        }
    }

    #[test]
    fn hybrid_sheds_a_single_heavy_task() {
        let cfg = SchedulerConfig::default();
        let mut q = TaskQueue::new();
        q.push("Heavy", 1);

        let m = run(Strategy::Hybrid, &q, heavy_catalog(), &cfg).unwrap();
        assert_eq!(m.drop_count, 1);
        assert_eq!(m.executed_count, 0);
        assert_eq!(m.overload_count, 0);
        assert_eq!(m.steps, 1);
    }

    #[test]
    fn round_robin_runs_the_heavy_task_and_overloads() {
        let cfg = SchedulerConfig::default();
        let mut q = TaskQueue::new();
        q.push("Heavy", 1);

        let m = run(Strategy::RoundRobin, &q, heavy_catalog(), &cfg).unwrap();
        assert_eq!(m.drop_count, 0);
        assert_eq!(m.overload_count, 1, "200 · 0.6 = 120 > 100");
        // peaks are sampled before each decision, so the overload is not a peak
        assert_eq!(m.peak_processing_load, 0.0);
    }

    #[test]
    fn overload_is_a_signal_and_the_run_continues() {
        let cfg = SchedulerConfig::default();
        let mut q = TaskQueue::new();
        q.push("Heavy", 1);
        q.push("Heavy", 1);

        let m = run(Strategy::StrictPriority, &q, heavy_catalog(), &cfg).unwrap();
        assert_eq!(m.executed_count, 2);
        assert_eq!(m.overload_count, 2);
        assert!((m.peak_processing_load - 120.0).abs() < 1e-9);
    }

    #[test]
    fn hybrid_waits_out_an_overloaded_projection_then_runs_it() {
        // Big projects 108 then cools to 64.8 behind Zero, so the hybrid
        // idles while the waiting cost (20, 40, 60) stays below 64.8, runs
        // Big once idling would cost 80 (overloading at 108), then runs Zero.
        let catalog = Arc::new(
            TaskCatalog::default()
                .with_task("Big", TaskProfile::new(180.0, 0.0), 1)
                .with_task("Zero", TaskProfile::default(), 1),
        );
        let cfg = SchedulerConfig::default();
        let mut q = TaskQueue::new();
        q.push("Big", 1);
        q.push("Zero", 1);

        let m = run(Strategy::Hybrid, &q, catalog, &cfg).unwrap();
        assert_eq!(m.idle_steps, 3);
        assert_eq!(m.drop_count, 0);
        assert_eq!(m.executed_count, 2);
        assert_eq!(m.overload_count, 1);
        assert_eq!(m.steps, 5);
        assert!((m.peak_processing_load - 108.0).abs() < 1e-9);
    }

    #[test]
    fn stale_decisions_are_not_counted() {
        let catalog = heavy_catalog();
        let mut scheduler = HybridScheduler::new(catalog, SchedulerConfig::default());
        let mut q = TaskQueue::new();
        let id = q.push("Heavy", 10);
        let entry = q.get(id).unwrap().clone();
        q.remove(id);
        q.push("Heavy", 1);

        let mut collector = MetricsCollector::new();
        apply_and_record(&mut scheduler, &Decision::Execute(entry.clone()), &mut q, &mut collector);
        apply_and_record(&mut scheduler, &Decision::Drop(entry), &mut q, &mut collector);

        let m = collector.finish();
        assert_eq!(m.executed_count, 0);
        assert_eq!(m.drop_count, 0);
        assert_eq!(m.overload_count, 0);
        assert_eq!(m.avg_high_priority_wait, 0.0);
        assert_eq!(q.len(), 1);
        assert_eq!(scheduler.state(), ResourceState::default());
    }

    #[test]
    fn high_priority_waits_are_averaged() {
        let cfg = SchedulerConfig::default();
        let mut q = TaskQueue::new();
        q.push("P10", 10);
        q.push("P1", 1);
        q.push("P9", 9);

        // Round robin: P10 waits 0, P9 waits 2 → mean 1.0; P1 is not sampled
        let m = run(Strategy::RoundRobin, &q, Arc::new(TaskCatalog::default()), &cfg).unwrap();
        assert!((m.avg_high_priority_wait - 1.0).abs() < 1e-9);
    }

    #[test]
    fn callers_queue_is_left_untouched() {
        let cfg = SchedulerConfig::default();
        let catalog = Arc::new(TaskCatalog::greenhouse());
        let q = generate_seeded_queue(&catalog.task_names(), 12, &catalog, 9);
        let before = q.entries().to_vec();

        compare(&q, catalog, &cfg).unwrap();
        assert_eq!(q.entries(), before.as_slice());
    }

    #[test]
    fn run_simulation_resolves_names() {
        let cfg = SchedulerConfig::default();
        let mut q = TaskQueue::new();
        q.push("Heavy", 1);

        let m = run_simulation("Intelligent", &q, heavy_catalog(), &cfg).unwrap();
        assert_eq!(m.drop_count, 1);

        let err = run_simulation("FIFO", &q, heavy_catalog(), &cfg).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Scheduler(SchedulerError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let cfg = SchedulerConfig {
            horizon: 0,
            ..Default::default()
        };
        let mut q = TaskQueue::new();
        q.push("Heavy", 1);
        let err = run(Strategy::Hybrid, &q, heavy_catalog(), &cfg).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Scheduler(SchedulerError::InvalidConfig { field: "horizon", .. })
        ));
    }

    #[test]
    fn compare_returns_one_result_per_strategy() {
        let cfg = SchedulerConfig::default();
        let mut q = TaskQueue::new();
        q.push("Heavy", 1);
        let results = compare(&q, heavy_catalog(), &cfg).unwrap();
        let names: Vec<_> = results.iter().map(|(s, _)| *s).collect();
        assert_eq!(names, Strategy::ALL.to_vec());
    }
}
