// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Chunk pool statistics for profiling and tuning.
//!
//! [`PoolStats`] counts how chunks flow through the pool: how many
//! acquisitions were served from a free list, how many needed fresh
//! memory, and what happened to released chunks. These numbers are the
//! main input when choosing `pooled_size` and `max_size`.

/// Cumulative counters describing chunk pool usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    /// Total number of `acquire` calls.
    pub acquires: u64,
    /// Acquisitions served from a free list.
    pub hits: u64,
    /// Acquisitions that allocated a fresh chunk.
    pub misses: u64,
    /// Total number of non-empty chunks passed to `release`.
    pub releases: u64,
    /// Released chunks that were kept in a free list.
    pub pooled: u64,
    /// Released chunks that were dropped (too small, no matching class,
    /// or class full).
    pub discarded: u64,
}

impl PoolStats {
    /// Returns the fraction of acquisitions served from a free list, in
    /// `[0.0, 1.0]`. Returns `0.0` before the first acquisition.
    pub fn hit_ratio(&self) -> f64 {
        if self.acquires == 0 {
            return 0.0;
        }
        self.hits as f64 / self.acquires as f64
    }

    pub(crate) fn record_hit(&mut self) {
        self.acquires += 1;
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.acquires += 1;
        self.misses += 1;
    }

    pub(crate) fn record_pooled(&mut self) {
        self.releases += 1;
        self.pooled += 1;
    }

    pub(crate) fn record_discarded(&mut self) {
        self.releases += 1;
        self.discarded += 1;
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Chunks: {} acquired ({} hits, {} misses, {:.0}% hit rate), \
             {} released ({} pooled, {} discarded)",
            self.acquires,
            self.hits,
            self.misses,
            self.hit_ratio() * 100.0,
            self.releases,
            self.pooled,
            self.discarded,
        )
    }
}
