/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core data structures for the Edge Sentry scheduler.
//!
//! ```text
//! TaskCatalog ──(profile / priority lookup)──►  QueueEntry ──(scheduler)──►  Decision
//!                                                  ↑ pending work               ↑ Execute / Idle / Drop
//!                                                  owned by one TaskQueue
//! ```
//!
//! # Ownership model
//! A [`TaskQueue`] is **owned** by exactly one scheduler run.  Every simulated
//! branch of the rollout clones both the [`ResourceState`] and the queue, so no
//! branch ever observes another branch's mutations.
//!
//! Entries are identified by an [`EntryId`] handed out by the queue at
//! insertion time.  Removal is always by id: two entries with the same name,
//! priority and wait are still distinct units of work.

use std::fmt;

use serde::Deserialize;

// ── Resource state ────────────────────────────────────────────────────────────

/// Two-field utilisation gauge of the device being scheduled.
///
/// `processing_load` is in percent of capacity, `memory_load` in bytes.
/// Both are nominally `≥ 0`; overload is decided by the thresholds in
/// [`SchedulerConfig`](crate::config::SchedulerConfig).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceState {
    pub processing_load: f64,
    pub memory_load: f64,
}

impl ResourceState {
    pub fn new(processing_load: f64, memory_load: f64) -> Self {
        Self {
            processing_load,
            memory_load,
        }
    }

    /// Add the resource cost of one task execution.
    pub fn charge(&mut self, profile: TaskProfile) {
        self.processing_load += profile.processing_cost;
        self.memory_load += profile.memory_cost;
    }

    /// Cool-down between two scheduling steps: both fields shrink by `decay`.
    pub fn decay(&mut self, decay: f64) {
        self.processing_load *= 1.0 - decay;
        self.memory_load *= 1.0 - decay;
    }
}

// ── Task profile ──────────────────────────────────────────────────────────────

/// Resource cost of executing one task of a given type.
///
/// Unknown task types resolve to the zero profile (see
/// [`TaskCatalog::profile`](crate::config::TaskCatalog::profile)).
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskProfile {
    #[serde(default)]
    pub processing_cost: f64,
    #[serde(default)]
    pub memory_cost: f64,
}

impl TaskProfile {
    pub fn new(processing_cost: f64, memory_cost: f64) -> Self {
        Self {
            processing_cost,
            memory_cost,
        }
    }
}

// ── Queue entries ─────────────────────────────────────────────────────────────

/// Stable identity of a queue entry, unique within its [`TaskQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pending unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub id: EntryId,

    /// Task type name, used to look up the [`TaskProfile`].
    pub type_name: String,

    /// Fixed priority (larger = more important).  Defaults to `1` for task
    /// types missing from the priority table.
    pub priority: i32,

    /// Number of scheduling steps this entry has spent waiting.
    pub time_in_queue: u32,
}

impl QueueEntry {
    /// `priority × time_in_queue` — this entry's share of the wait cost.
    pub fn wait_weight(&self) -> f64 {
        f64::from(self.priority) * f64::from(self.time_in_queue)
    }
}

// ── TaskQueue ─────────────────────────────────────────────────────────────────

/// Ordered sequence of pending [`QueueEntry`]s.
///
/// Insertion order is preserved.  It is the service order for round robin
/// and the tie-breaking order for every other strategy.
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    entries: Vec<QueueEntry>,
    next_id: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fresh entry (`time_in_queue = 0`) and return its id.
    pub fn push(&mut self, type_name: impl Into<String>, priority: i32) -> EntryId {
        self.push_waiting(type_name, priority, 0)
    }

    /// Append an entry that has already waited `time_in_queue` steps.
    pub fn push_waiting(
        &mut self,
        type_name: impl Into<String>,
        priority: i32,
        time_in_queue: u32,
    ) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(QueueEntry {
            id,
            type_name: type_name.into(),
            priority,
            time_in_queue,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueueEntry> {
        self.entries.iter()
    }

    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.first()
    }

    pub fn get(&self, id: EntryId) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    /// The first `breadth` entries in queue order.
    ///
    /// Entries beyond this window are never decision candidates, whatever
    /// their priority or wait.
    pub fn candidates(&self, breadth: usize) -> &[QueueEntry] {
        &self.entries[..breadth.min(self.entries.len())]
    }

    /// Remove the entry with `id`, preserving the order of the rest.
    ///
    /// Returns `None` if the entry is no longer queued.
    pub fn remove(&mut self, id: EntryId) -> Option<QueueEntry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    /// One scheduling step passes for every queued entry.
    pub fn age(&mut self) {
        for entry in &mut self.entries {
            entry.time_in_queue = entry.time_in_queue.saturating_add(1);
        }
    }

    /// Σ `priority × time_in_queue` over all entries (unweighted wait cost).
    pub fn wait_sum(&self) -> f64 {
        self.entries.iter().map(QueueEntry::wait_weight).sum()
    }
}

impl<'a> IntoIterator for &'a TaskQueue {
    type Item = &'a QueueEntry;
    type IntoIter = std::slice::Iter<'a, QueueEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
