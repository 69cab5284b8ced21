/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Edge Sentry – resource-aware predictive task scheduler
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── config/       – task catalog, scheduler tuning, scenarios (YAML)
//! ├── task          – resource state, task profiles, queue entries
//! ├── scheduler/    – cost model, rollout, hybrid policy, strategies
//! └── simulation/   – harness, metrics, random queue generation
//! ```

pub mod config;
pub mod scheduler;
pub mod simulation;
pub mod task;

pub use config::{SchedulerConfig, TaskCatalog};
pub use scheduler::{Decision, HybridScheduler, Strategy};
pub use simulation::{run_simulation, Metrics};
pub use task::{QueueEntry, ResourceState, TaskProfile, TaskQueue};
