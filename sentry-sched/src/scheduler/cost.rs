/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cost model: scores a `(state, queue)` pair.
//!
//! ```text
//! load  = W_load · processing_load + W_mem · memory_load
//! wait  = W_wait · Σ priority · time_in_queue
//! total = load + wait
//! ```
//!
//! An overloaded state scores `f64::INFINITY`, which compares greater than
//! every finite cost.

use crate::config::SchedulerConfig;
use crate::task::{ResourceState, TaskQueue};

/// The three components of a cost evaluation, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub load: f64,
    /// Already multiplied by `W_wait`.
    pub wait: f64,
    pub total: f64,
}

impl CostBreakdown {
    pub const OVERLOADED: CostBreakdown = CostBreakdown {
        load: f64::INFINITY,
        wait: f64::INFINITY,
        total: f64::INFINITY,
    };

    pub fn is_finite(&self) -> bool {
        self.total.is_finite()
    }
}

/// `true` if processing load exceeds the limit or memory load exceeds the
/// capacity.  Loads exactly at the threshold are still acceptable.
pub fn is_overloaded(state: &ResourceState, config: &SchedulerConfig) -> bool {
    state.processing_load > config.processing_limit || state.memory_load > config.memory_capacity
}

pub fn cost_breakdown(
    state: &ResourceState,
    queue: &TaskQueue,
    config: &SchedulerConfig,
) -> CostBreakdown {
    if is_overloaded(state, config) {
        return CostBreakdown::OVERLOADED;
    }
    let load =
        config.weight_load * state.processing_load + config.weight_memory * state.memory_load;
    let wait = config.weight_wait * queue.wait_sum();
    CostBreakdown {
        load,
        wait,
        total: load + wait,
    }
}

pub fn cost(state: &ResourceState, queue: &TaskQueue, config: &SchedulerConfig) -> f64 {
    cost_breakdown(state, queue, config).total
}

// ── Tests ─────────────────────────────────────────────────────────────────────
