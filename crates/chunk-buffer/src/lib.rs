// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # chunk-buffer
//!
//! A write-optimized byte buffer for serialization output, backed by a
//! size-classed chunk pool, with one-shot and shared (recyclable) readers.
//!
//! # Key Components
//!
//! - [`ChunkPool`]: free lists of byte chunks keyed by exact capacity,
//!   configured by a [`PoolConfig`] and instrumented with [`PoolStats`].
//! - [`Buffer`]: an append-only chain of chunks. Appends never move
//!   existing bytes; chunk capacity doubles up to `max_size`.
//! - [`OneShotReader`]: consumes the finalized chunks once, releasing each
//!   chunk as soon as it is drained.
//! - [`RecyclableReader`]: a cursor over a reference-counted chunk set.
//!   Clones share the bytes; the last `recycle` returns them to the pool.
//!
//! # Data Flow
//!
//! ```text
//!  append_*() ──► Buffer ──┬─► to_contiguous_bytes()  ─► Vec<u8>
//!                  ▲       ├─► flush_to(sink)
//!                  │       ├─► to_one_shot_reader()   ─► OneShotReader
//!   ChunkPool ─────┘       └─► to_recyclable_reader() ─► RecyclableReader ×N
//!       ▲                                                      │
//!       └──────────────── chunks released ◄────────────────────┘
//! ```
//!
//! # Example
//! ```
//! use chunk_buffer::{Buffer, ChunkPool, PoolConfig};
//! use std::io::Read;
//!
//! let pool = ChunkPool::new(PoolConfig::new(4, 8, 16)).unwrap();
//! let mut buf = Buffer::new(pool.clone());
//! buf.append_str("hell");
//! buf.append_str("o wo");
//! buf.append_str("rld!");
//!
//! let mut reader = buf.to_recyclable_reader();
//! let mut copy = reader.clone();
//!
//! let mut text = String::new();
//! copy.read_to_string(&mut text).unwrap();
//! assert_eq!(text, "hello world!");
//!
//! copy.recycle();
//! reader.recycle();
//! // The 8-byte chunk is pooled; the 4-byte one was below `pooled_size`.
//! assert_eq!(pool.free_chunks(8), 1);
//! ```

mod buffer;
pub mod config;
mod error;
pub mod pool;
mod reader;
mod shared;
pub mod size;
mod stats;
mod vectored;

pub use buffer::{Buffer, READ_BLOCK_SIZE};
pub use config::PoolConfig;
pub use error::BufferError;
pub use pool::ChunkPool;
pub use reader::OneShotReader;
pub use shared::RecyclableReader;
pub use stats::PoolStats;
