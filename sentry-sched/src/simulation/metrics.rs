/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::fmt;

use crate::task::ResourceState;

/// Aggregate outcome of one harness run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    /// Highest processing load seen before any decision (percent).
    pub peak_processing_load: f64,
    /// Highest memory load seen before any decision (bytes).
    pub peak_memory_load: f64,
    /// Executions that left the processing load above the limit.
    pub overload_count: u32,
    /// Entries shed by the crisis protocol.
    pub drop_count: u32,
    /// Mean wait (steps) of executed entries at or above the emergency
    /// threshold; `0.0` if there were none.
    pub avg_high_priority_wait: f64,
    pub executed_count: u32,
    pub idle_steps: u32,
    /// Decisions taken in total.
    pub steps: usize,
}

impl Metrics {
    /// `(label, value)` pairs in report order, with units.
    pub fn rows(&self) -> [(&'static str, String); 5] {
        [
            ("Peak CPU", format!("{:.2}%", self.peak_processing_load)),
            ("Peak Memory", format!("{:.2} bytes", self.peak_memory_load)),
            ("Overloads", self.overload_count.to_string()),
            ("Tasks Dropped", self.drop_count.to_string()),
            (
                "Avg Wait (Prio >= 9)",
                format!("{:.2} steps", self.avg_high_priority_wait),
            ),
        ]
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.rows();
        for (i, (label, value)) in rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{label}: {value}")?;
        }
        Ok(())
    }
}

/// Accumulates [`Metrics`] while a run is in progress.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: Metrics,
    high_priority_waits: Vec<u32>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Peak tracking; called before every decision.
    pub fn sample(&mut self, state: &ResourceState) {
        let m = &mut self.metrics;
        m.peak_processing_load = m.peak_processing_load.max(state.processing_load);
        m.peak_memory_load = m.peak_memory_load.max(state.memory_load);
        m.steps += 1;
    }

    pub fn record_drop(&mut self) {
        self.metrics.drop_count += 1;
    }

    pub fn record_idle(&mut self) {
        self.metrics.idle_steps += 1;
    }

    pub fn record_execution(&mut self) {
        self.metrics.executed_count += 1;
    }

    pub fn record_high_priority_wait(&mut self, time_in_queue: u32) {
        self.high_priority_waits.push(time_in_queue);
    }

    pub fn record_overload(&mut self) {
        self.metrics.overload_count += 1;
    }

    pub fn finish(self) -> Metrics {
        let mut metrics = self.metrics;
        if !self.high_priority_waits.is_empty() {
            let total: f64 = self.high_priority_waits.iter().map(|&w| f64::from(w)).sum();
            metrics.avg_high_priority_wait = total / self.high_priority_waits.len() as f64;
        }
        metrics
    }
}
