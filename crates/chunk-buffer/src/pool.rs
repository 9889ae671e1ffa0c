// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Size-classed chunk reuse pool.
//!
//! The [`ChunkPool`] is the allocator behind every [`Buffer`](crate::Buffer).
//! It:
//!
//! 1. Keeps one free list per size class, keyed by *exact* chunk capacity.
//!    A request is only served from the list whose class equals the
//!    requested capacity; there is no first-fit search.
//! 2. Drops chunks smaller than `pooled_size` instead of pooling them.
//! 3. Tracks [`PoolStats`] for tuning.
//!
//! # Thread Safety
//! `ChunkPool` is a cheap `Clone` handle around shared state and is
//! `Send + Sync`: many writers and recyclers may acquire and release
//! concurrently. Free lists are guarded by a single mutex, so a chunk is
//! never handed out twice.

use crate::{BufferError, PoolConfig, PoolStats};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mutable pool state, guarded as a unit.
struct PoolState {
    config: PoolConfig,
    /// size class → idle chunks of exactly that capacity.
    free: HashMap<usize, Vec<Vec<u8>>>,
    stats: PoolStats,
}

impl PoolState {
    fn new(config: PoolConfig) -> Self {
        Self {
            free: empty_free_lists(&config),
            config,
            stats: PoolStats::default(),
        }
    }
}

/// Shared handle to a set of size-classed chunk free lists.
///
/// # Example
/// ```
/// use chunk_buffer::{ChunkPool, PoolConfig};
///
/// let pool = ChunkPool::new(PoolConfig::new(4, 8, 16)).unwrap();
///
/// let chunk = pool.acquire(8);
/// let addr = chunk.as_ptr();
/// pool.release(chunk);
/// assert_eq!(pool.free_chunks(8), 1);
///
/// // The same allocation comes back for the same size class.
/// assert_eq!(pool.acquire(8).as_ptr(), addr);
/// ```
#[derive(Clone)]
pub struct ChunkPool {
    inner: Arc<Mutex<PoolState>>,
}

impl ChunkPool {
    /// Creates a pool after validating `config`.
    pub fn new(config: PoolConfig) -> Result<Self, BufferError> {
        config.validate()?;
        tracing::debug!(
            start_size = config.start_size,
            pooled_size = config.pooled_size,
            max_size = config.max_size,
            "chunk pool created"
        );
        Ok(Self {
            inner: Arc::new(Mutex::new(PoolState::new(config))),
        })
    }

    // Every mutation under the lock is a single push or pop, so the state
    // is consistent even if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns an empty chunk whose capacity is exactly `capacity`.
    ///
    /// If `capacity` is a size class with an idle chunk, that chunk is
    /// reused (length 0, contents not zeroed). Otherwise a fresh chunk is
    /// allocated.
    pub fn acquire(&self, capacity: usize) -> Vec<u8> {
        {
            let mut guard = self.lock();
            let state = &mut *guard;
            if capacity >= state.config.pooled_size {
                if let Some(chunk) = state.free.get_mut(&capacity).and_then(Vec::pop) {
                    state.stats.record_hit();
                    return chunk;
                }
            }
            state.stats.record_miss();
        }
        Vec::with_capacity(capacity)
    }

    /// Returns a chunk to the free list for its exact capacity.
    ///
    /// Zero-capacity chunks are ignored. Chunks below `pooled_size`, with
    /// a capacity that is not a current size class, or whose class already
    /// holds `max_free_per_class` idle chunks are dropped.
    pub fn release(&self, mut chunk: Vec<u8>) {
        let capacity = chunk.capacity();
        if capacity == 0 {
            return;
        }

        let mut guard = self.lock();
        let state = &mut *guard;
        if capacity >= state.config.pooled_size {
            if let Some(list) = state.free.get_mut(&capacity) {
                if list.len() < state.config.max_free_per_class {
                    chunk.clear();
                    list.push(chunk);
                    state.stats.record_pooled();
                    return;
                }
            }
        }
        state.stats.record_discarded();
    }

    /// Releases every chunk yielded by `chunks`.
    pub fn release_all<I>(&self, chunks: I)
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        for chunk in chunks {
            self.release(chunk);
        }
    }

    /// Replaces the configuration and rebuilds empty free lists for the
    /// new size classes. Idle chunks are dropped; chunks already handed out
    /// are only pooled later if their capacity matches a new class.
    pub fn configure(&self, config: PoolConfig) -> Result<(), BufferError> {
        config.validate()?;
        let mut state = self.lock();
        state.free = empty_free_lists(&config);
        state.config = config;
        tracing::debug!(
            start_size = config.start_size,
            pooled_size = config.pooled_size,
            max_size = config.max_size,
            "chunk pool reconfigured"
        );
        Ok(())
    }

    /// Returns the active configuration.
    pub fn config(&self) -> PoolConfig {
        self.lock().config
    }

    /// Returns the size classes in ascending order.
    pub fn size_classes(&self) -> Vec<usize> {
        self.lock().config.size_classes()
    }

    /// Returns the number of idle chunks held for the size class `capacity`.
    pub fn free_chunks(&self, capacity: usize) -> usize {
        self.lock().free.get(&capacity).map_or(0, Vec::len)
    }

    /// Returns the total capacity of all idle chunks, in bytes.
    pub fn free_bytes(&self) -> usize {
        self.lock()
            .free
            .iter()
            .map(|(class, list)| class * list.len())
            .sum()
    }

    /// Drops every idle chunk, keeping the configuration and size classes.
    ///
    /// Useful under memory pressure; chunks in use are unaffected.
    pub fn shrink(&self) {
        let mut state = self.lock();
        let dropped: usize = state.free.values().map(Vec::len).sum();
        for list in state.free.values_mut() {
            list.clear();
        }
        tracing::debug!(dropped, "chunk pool shrunk");
    }

    /// Returns a snapshot of pool statistics.
    pub fn stats(&self) -> PoolStats {
        self.lock().stats.clone()
    }
}

impl Default for ChunkPool {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PoolState::new(PoolConfig::default()))),
        }
    }
}

impl std::fmt::Debug for ChunkPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ChunkPool")
            .field("config", &state.config)
            .field("free_chunks", &state.free.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

fn empty_free_lists(config: &PoolConfig) -> HashMap<usize, Vec<Vec<u8>>> {
    config
        .size_classes()
        .into_iter()
        .map(|class| (class, Vec::new()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn small_pool() -> ChunkPool {
        ChunkPool::new(PoolConfig::new(4, 8, 16)).unwrap()
    }

    #[test]
    fn test_acquire_fresh_has_exact_capacity() {
        let pool = small_pool();
        let chunk = pool.acquire(8);
        assert_eq!(chunk.len(), 0);
        assert!(chunk.capacity() >= 8);
        assert_eq!(pool.stats().misses, 1);
    }

    #[test]
    fn test_release_and_reuse_by_identity() {
        let pool = small_pool();
        let mut chunk = pool.acquire(16);
        chunk.extend_from_slice(b"dirty");
        let addr = chunk.as_ptr();
        pool.release(chunk);
        assert_eq!(pool.free_chunks(16), 1);

        let again = pool.acquire(16);
        assert_eq!(again.as_ptr(), addr);
        assert!(again.is_empty());
        assert_eq!(pool.free_chunks(16), 0);

        let stats = pool.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_small_chunks_are_dropped() {
        let pool = small_pool();
        pool.release(Vec::with_capacity(4));
        assert_eq!(pool.free_bytes(), 0);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_zero_capacity_release_is_noop() {
        let pool = small_pool();
        pool.release(Vec::new());
        assert_eq!(pool.stats().releases, 0);
    }

    #[test]
    fn test_non_class_capacity_is_dropped() {
        let pool = small_pool();
        pool.release(Vec::with_capacity(12));
        pool.release(Vec::with_capacity(64));
        assert_eq!(pool.free_bytes(), 0);
        assert_eq!(pool.stats().discarded, 2);
    }

    #[test]
    fn test_acquire_below_pooled_size_never_hits() {
        let pool = ChunkPool::new(PoolConfig::new(4, 8, 16)).unwrap();
        pool.release(pool.acquire(8));
        // 4 is not a size class, so the idle 8-byte chunk is not used.
        let chunk = pool.acquire(4);
        assert!(chunk.capacity() >= 4);
        assert_eq!(pool.free_chunks(8), 1);
    }

    #[test]
    fn test_retention_cap() {
        let config = PoolConfig {
            max_free_per_class: 2,
            ..PoolConfig::new(4, 8, 16)
        };
        let pool = ChunkPool::new(config).unwrap();
        for _ in 0..3 {
            pool.release(Vec::with_capacity(8));
        }
        assert_eq!(pool.free_chunks(8), 2);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_configure_rebuilds_free_lists() {
        let pool = small_pool();
        let held = pool.acquire(16);
        pool.release(pool.acquire(8));
        assert_eq!(pool.free_chunks(8), 1);

        pool.configure(PoolConfig::new(16, 32, 64)).unwrap();
        assert_eq!(pool.free_chunks(8), 0);
        assert_eq!(pool.size_classes(), vec![32, 64]);

        // Allocated under the old config, no longer a size class.
        pool.release(held);
        assert_eq!(pool.free_bytes(), 0);
    }

    #[test]
    fn test_configure_keeps_chunks_matching_new_class() {
        let pool = small_pool();
        let held = pool.acquire(16);

        pool.configure(PoolConfig::new(16, 16, 64)).unwrap();
        assert_eq!(pool.size_classes(), vec![16, 32, 64]);

        pool.release(held);
        assert_eq!(pool.free_chunks(16), 1);
        assert_eq!(pool.stats().pooled, 1);
    }

    #[test]
    fn test_configure_rejects_invalid() {
        let pool = small_pool();
        assert!(pool.configure(PoolConfig::new(32, 8, 16)).is_err());
        assert_eq!(pool.config(), PoolConfig::new(4, 8, 16));
    }

    #[test]
    fn test_new_rejects_invalid() {
        assert!(matches!(
            ChunkPool::new(PoolConfig::new(4, 32, 16)),
            Err(BufferError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_shrink() {
        let pool = small_pool();
        pool.release(Vec::with_capacity(8));
        pool.release(Vec::with_capacity(16));
        assert_eq!(pool.free_bytes(), 24);

        pool.shrink();
        assert_eq!(pool.free_bytes(), 0);
        assert_eq!(pool.size_classes(), vec![8, 16]);
    }

    #[test]
    fn test_default_pool() {
        let pool = ChunkPool::default();
        assert_eq!(pool.config(), PoolConfig::default());
        assert_eq!(pool.size_classes().len(), 7);
    }

    #[test]
    fn test_concurrent_acquire_never_duplicates() {
        let pool = ChunkPool::new(PoolConfig::new(8, 8, 64)).unwrap();
        for _ in 0..32 {
            pool.release(Vec::with_capacity(64));
        }

        let held: Vec<Vec<Vec<u8>>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let pool = pool.clone();
                    s.spawn(move || (0..4).map(|_| pool.acquire(64)).collect::<Vec<_>>())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let addrs: HashSet<usize> = held
            .iter()
            .flatten()
            .map(|chunk| chunk.as_ptr() as usize)
            .collect();
        assert_eq!(addrs.len(), 32);
        assert_eq!(pool.free_chunks(64), 0);
        assert_eq!(pool.stats().hits, 32);
    }

    #[test]
    fn test_pool_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChunkPool>();
    }

    #[test]
    fn test_debug_format() {
        let pool = ChunkPool::default();
        let debug = format!("{pool:?}");
        assert!(debug.contains("ChunkPool"));
        assert!(debug.contains("config"));
    }
}
