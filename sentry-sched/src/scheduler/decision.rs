/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::fmt;

use crate::task::QueueEntry;

/// Outcome of one scheduling decision.
///
/// `Execute` and `Drop` carry a snapshot of the chosen entry; the entry is
/// removed from the live queue by its [`EntryId`](crate::task::EntryId).
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Run the entry now.
    Execute(QueueEntry),
    /// Do nothing this step; load decays and every entry waits one more step.
    Idle,
    /// Shed the entry without running it.
    Drop(QueueEntry),
}

impl Decision {
    /// The entry acted upon, if any.
    pub fn entry(&self) -> Option<&QueueEntry> {
        match self {
            Decision::Execute(e) | Decision::Drop(e) => Some(e),
            Decision::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Decision::Idle)
    }

    pub fn is_drop(&self) -> bool {
        matches!(self, Decision::Drop(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Execute(e) => write!(f, "Executing '{}' ({})", e.type_name, e.id),
            Decision::Idle => write!(f, "IDLE"),
            Decision::Drop(e) => write!(
                f,
                "LOAD SHEDDING. Dropping '{}' ({})",
                e.type_name, e.id
            ),
        }
    }
}
