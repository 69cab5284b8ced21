/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the Edge Sentry scheduler.
//!
//! Two error enums model the two failure layers:
//!
//! * [`SchedulerError`] — bad input to the scheduler itself (unknown strategy
//!   name, unusable tuning parameters).
//! * [`SimulationError`] — a harness run that could not complete.
//!
//! Overload is **not** an error anywhere in this crate.  It is encoded as an
//! infinite cost and handled by the crisis protocol.

use thiserror::Error;

// ── Scheduler errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The strategy name passed to `run_simulation()` is not recognised.
    #[error("unknown scheduling strategy: '{0}' (valid: RoundRobin, StrictPriority, Hybrid)")]
    UnknownStrategy(String),

    /// A tuning parameter is outside the range the policy is defined for.
    #[error("invalid scheduler configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

// ── Simulation errors ─────────────────────────────────────────────────────────

/// Failure of one harness run.
///
/// `NoDecision` and `Stalled` are invariant violations: a correct strategy
/// always makes progress while work is pending.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// The strategy returned no decision although entries were still queued.
    #[error("strategy returned no decision with {pending} task(s) still queued")]
    NoDecision { pending: usize },

    /// The step budget ran out before the queue drained.
    #[error("simulation stalled after {steps} step(s) with {pending} task(s) still queued")]
    Stalled { steps: usize, pending: usize },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
