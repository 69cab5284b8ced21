/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Random task queue generation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::TaskCatalog;
use crate::task::TaskQueue;

/// Draw `length` task types from `pool` with replacement.
///
/// Each entry gets the catalog priority of its type (default `1`) and a wait
/// of zero.  An empty pool yields an empty queue.
pub fn generate_queue<R: Rng + ?Sized>(
    pool: &[String],
    length: usize,
    catalog: &TaskCatalog,
    rng: &mut R,
) -> TaskQueue {
    let mut queue = TaskQueue::new();
    for _ in 0..length {
        let Some(name) = pool.choose(rng) else {
            break;
        };
        queue.push(name.clone(), catalog.priority(name));
    }
    queue
}

/// Deterministic variant of [`generate_queue`] for reproducible runs.
pub fn generate_seeded_queue(
    pool: &[String],
    length: usize,
    catalog: &TaskCatalog,
    seed: u64,
) -> TaskQueue {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_queue(pool, length, catalog, &mut rng)
}
