/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Interchangeable selection rules.
//!
//! All three share one contract: given the queue, return the next
//! [`Decision`], or `None` only when the queue is empty.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use crate::task::TaskQueue;

use super::{Decision, HybridScheduler, SchedulerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// First come, first served: always the head of the queue.
    RoundRobin,
    /// Highest priority first, longest wait breaking ties.
    StrictPriority,
    /// Rollout-based prediction with emergency and crisis handling.
    Hybrid,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::RoundRobin,
        Strategy::StrictPriority,
        Strategy::Hybrid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::RoundRobin => "RoundRobin",
            Strategy::StrictPriority => "StrictPriority",
            Strategy::Hybrid => "Hybrid",
        }
    }

    /// Pick the next action.  Only `Hybrid` consults the scheduler's state.
    pub fn select(self, scheduler: &HybridScheduler, queue: &TaskQueue) -> Option<Decision> {
        match self {
            Strategy::RoundRobin => round_robin(queue),
            Strategy::StrictPriority => strict_priority(queue),
            Strategy::Hybrid => scheduler.decide(queue, false),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = SchedulerError;

    /// Accepts the canonical names and the long-form labels
    /// (`"Round Robin"`, `"Strict Priority"`, `"Intelligent"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "RoundRobin" | "Round Robin" => Ok(Strategy::RoundRobin),
            "StrictPriority" | "Strict Priority" => Ok(Strategy::StrictPriority),
            "Hybrid" | "Intelligent" => Ok(Strategy::Hybrid),
            other => Err(SchedulerError::UnknownStrategy(other.to_string())),
        }
    }
}

pub fn round_robin(queue: &TaskQueue) -> Option<Decision> {
    queue.head().cloned().map(Decision::Execute)
}

/// Largest `(priority, time_in_queue)`; the earliest entry wins exact ties.
pub fn strict_priority(queue: &TaskQueue) -> Option<Decision> {
    queue
        .iter()
        .min_by_key(|e| (Reverse(e.priority), Reverse(e.time_in_queue)))
        .cloned()
        .map(Decision::Execute)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
