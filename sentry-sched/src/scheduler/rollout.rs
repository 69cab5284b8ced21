/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Bounded-depth greedy rollout.
//!
//! Estimates the future cost of a branch by repeatedly executing the greedy
//! best of the first `breadth` entries until the queue drains or the depth
//! runs out.  Each rollout owns its state and queue; callers hand in clones.
//!
//! Work per call is bounded by `breadth × depth` cost evaluations,
//! independent of queue length.

use crate::config::{SchedulerConfig, TaskCatalog};
use crate::task::{EntryId, ResourceState, TaskQueue};

use super::cost::{cost, is_overloaded};

/// Projected cost of continuing greedily from `(state, queue)` for at most
/// `depth` steps.
///
/// Returns `f64::INFINITY` as soon as a simulated step leaves the device
/// overloaded after decay.  The state passed in is only scored, never
/// pruned: an overloaded start that a further step cools down stays finite.
pub fn rollout(
    mut state: ResourceState,
    mut queue: TaskQueue,
    depth: usize,
    catalog: &TaskCatalog,
    config: &SchedulerConfig,
) -> f64 {
    let mut remaining = depth;

    loop {
        if queue.is_empty() || remaining == 0 {
            return cost(&state, &queue, config);
        }

        let Some(entry) = greedy_move(&state, &queue, catalog, config).and_then(|id| queue.remove(id))
        else {
            return cost(&state, &queue, config);
        };

        state.charge(catalog.profile(&entry.type_name));
        state.decay(config.decay);
        if is_overloaded(&state, config) {
            return f64::INFINITY;
        }
        queue.age();
        remaining -= 1;
    }
}

/// Pick the candidate whose immediate execution scores lowest.
///
/// Only the load changes in each trial; the queue is scored as it stands.
/// Ties keep the earliest entry, and if every trial is infinite the head of
/// the queue is chosen.
pub(crate) fn greedy_move(
    state: &ResourceState,
    queue: &TaskQueue,
    catalog: &TaskCatalog,
    config: &SchedulerConfig,
) -> Option<EntryId> {
    let mut best = None;
    let mut min_cost = f64::INFINITY;

    for entry in queue.candidates(config.breadth) {
        let mut trial = *state;
        trial.charge(catalog.profile(&entry.type_name));
        let c = cost(&trial, queue, config);
        if c < min_cost {
            min_cost = c;
            best = Some(entry.id);
        }
    }

    best.or_else(|| queue.head().map(|e| e.id))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
