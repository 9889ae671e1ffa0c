// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shared, reference-counted chunk sets and the cursors that read them.
//!
//! # Ownership Model
//!
//! ```text
//! Buffer::to_recyclable_reader()
//!       │
//!       ▼
//!   RecyclableReader ──clone()──► RecyclableReader ──clone()──► ...
//!       │  (cursor)                   │  (cursor)
//!       └──────────┬──────────────────┘
//!                  ▼
//!        Arc<SharedChunks>   ◄─── read-only chunks, one strong count per cursor
//!                  │
//!                  │  last recycle() / drop
//!                  ▼
//!        ChunkPool::release()  ──► free lists
//! ```
//!
//! Every cursor holds one share of the set. `recycle` gives the share up;
//! the `Arc` strong count is the share count, and `SharedChunks::drop`
//! runs exactly once, when the last share goes, returning every chunk to
//! the pool. `close` is independent: it only stops *this* cursor from
//! reading.

use crate::vectored::write_all_vectored;
use crate::{BufferError, ChunkPool};
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Finalized chunks shared by any number of cursors. Never mutated.
struct SharedChunks {
    chunks: Vec<Vec<u8>>,
    pool: ChunkPool,
}

impl Drop for SharedChunks {
    fn drop(&mut self) {
        let chunks = std::mem::take(&mut self.chunks);
        tracing::debug!(chunks = chunks.len(), "shared chunk set released to pool");
        self.pool.release_all(chunks);
    }
}

/// Read position of one cursor.
#[derive(Debug, Clone, Copy, Default)]
struct Position {
    index: usize,
    offset: usize,
    consumed: usize,
}

impl Position {
    fn advance(&mut self, chunks: &[Vec<u8>], n: usize) {
        self.consumed += n;
        let mut n = n;
        while n > 0 {
            let Some(chunk) = chunks.get(self.index) else {
                break;
            };
            let available = chunk.len() - self.offset;
            if n < available {
                self.offset += n;
                return;
            }
            n -= available;
            self.index += 1;
            self.offset = 0;
        }
    }

    fn unread<'a>(&self, chunks: &'a [Vec<u8>]) -> impl Iterator<Item = &'a [u8]> {
        let offset = self.offset;
        chunks
            .get(self.index..)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(move |(i, chunk)| if i == 0 { &chunk[offset..] } else { &chunk[..] })
    }
}

/// A clonable cursor over a shared, reference-counted chunk set.
///
/// Clones read the same physical bytes independently. Chunks go back to
/// the pool only when every cursor has been recycled (or dropped).
///
/// # Example
/// ```
/// use chunk_buffer::{Buffer, ChunkPool};
/// use std::io::Read;
///
/// let mut buf = Buffer::new(ChunkPool::default());
/// buf.append_str("abcdef");
///
/// let mut a = buf.to_recyclable_reader();
/// let mut b = a.clone();
///
/// let mut head = [0u8; 3];
/// a.read_exact(&mut head).unwrap();
/// assert_eq!(&head, b"abc");
///
/// let mut all = Vec::new();
/// b.read_to_end(&mut all).unwrap();
/// assert_eq!(all, b"abcdef");
///
/// a.recycle();
/// b.recycle();
/// ```
pub struct RecyclableReader {
    /// This cursor's share; `None` once recycled.
    shared: Option<Arc<SharedChunks>>,
    pos: Position,
    len: OnceLock<usize>,
    closed: AtomicBool,
}

impl RecyclableReader {
    /// Wraps `chunks` in a new shared set with a single share.
    pub(crate) fn new(chunks: Vec<Vec<u8>>, pool: ChunkPool) -> Self {
        let (chunks, empty): (Vec<_>, Vec<_>) =
            chunks.into_iter().partition(|chunk| !chunk.is_empty());
        pool.release_all(empty);
        Self::from_shared(Some(Arc::new(SharedChunks { chunks, pool })))
    }

    fn from_shared(shared: Option<Arc<SharedChunks>>) -> Self {
        Self {
            shared,
            pos: Position::default(),
            len: OnceLock::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn chunks(&self) -> &[Vec<u8>] {
        match self.shared.as_deref() {
            Some(shared) => &shared.chunks,
            None => &[],
        }
    }

    /// Total number of bytes in the shared set. Computed on first use and
    /// cached for the lifetime of this cursor.
    pub fn len(&self) -> usize {
        *self
            .len
            .get_or_init(|| self.chunks().iter().map(Vec::len).sum())
    }

    /// Returns `true` if the shared set holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes consumed by this cursor since creation or the last reset.
    pub fn position(&self) -> usize {
        self.pos.consumed
    }

    /// Bytes this cursor has not consumed yet.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.pos.consumed)
    }

    /// Number of cursors currently holding a share of the set, or zero if
    /// this cursor has been recycled.
    pub fn share_count(&self) -> usize {
        self.shared.as_ref().map_or(0, Arc::strong_count)
    }

    /// Rewinds this cursor to the start of the shared data. Other cursors
    /// and the share count are unaffected.
    pub fn reset(&mut self) {
        self.pos = Position::default();
    }

    /// Marks this cursor closed. Later reads and writes fail with
    /// [`BufferError::ReaderClosed`]. Idempotent; does not give up the
    /// share.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Gives up this cursor's share. When it is the last share, every chunk
    /// returns to the pool. Only the first call has any effect.
    ///
    /// A recycled cursor reports a length of zero.
    pub fn recycle(&mut self) {
        self.shared = None;
        self.len = OnceLock::new();
    }

    /// Returns `true` once this cursor has been recycled.
    pub fn is_recycled(&self) -> bool {
        self.shared.is_none()
    }

    /// Writes the unread bytes to `sink` with vectored writes, advancing the
    /// cursor by what the sink accepted. Chunks are never released here.
    pub fn write_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<u64, BufferError> {
        if self.is_closed() {
            return Err(BufferError::ReaderClosed);
        }
        let Some(shared) = self.shared.as_deref() else {
            return Ok(0);
        };

        let result = write_all_vectored(sink, self.pos.unread(&shared.chunks));
        let written = match &result {
            Ok(n) => *n,
            Err(e) => e.bytes_transferred(),
        };
        self.pos.advance(&shared.chunks, written as usize);
        result
    }

    /// Copies the entire shared content, regardless of this cursor's
    /// position. The position is not changed.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.build_bytes(Vec::with_capacity(self.len()))
    }

    /// Appends the entire shared content to `reuse` and returns it.
    pub fn build_bytes(&self, mut reuse: Vec<u8>) -> Vec<u8> {
        reuse.reserve(self.len());
        for chunk in self.chunks() {
            reuse.extend_from_slice(chunk);
        }
        reuse
    }

    /// Returns the entire shared content as one slice, borrowing the chunk
    /// directly when the set has a single chunk and copying otherwise.
    pub fn contiguous(&self) -> Cow<'_, [u8]> {
        match self.chunks() {
            [] => Cow::Borrowed(&[]),
            [single] => Cow::Borrowed(single.as_slice()),
            _ => Cow::Owned(self.to_bytes()),
        }
    }

    /// Lossy UTF-8 view of [`contiguous`](Self::contiguous).
    pub fn string_view(&self) -> Cow<'_, str> {
        match self.contiguous() {
            Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes),
            Cow::Owned(bytes) => Cow::Owned(
                String::from_utf8(bytes)
                    .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
            ),
        }
    }
}

impl Clone for RecyclableReader {
    /// Takes a new share of the same set and returns a fresh cursor at
    /// position 0, open, whatever the state of `self`. Cloning a recycled
    /// cursor yields an empty, recycled cursor.
    fn clone(&self) -> Self {
        Self::from_shared(self.shared.clone())
    }
}

impl Read for RecyclableReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Err(BufferError::ReaderClosed.into());
        }
        let Some(shared) = self.shared.as_deref() else {
            return Ok(0);
        };
        let chunks = shared.chunks.as_slice();

        let mut n = 0;
        while n < out.len() {
            let Some(chunk) = chunks.get(self.pos.index) else {
                break;
            };
            let src = &chunk[self.pos.offset..];
            let x = src.len().min(out.len() - n);
            out[n..n + x].copy_from_slice(&src[..x]);
            n += x;
            self.pos.advance(chunks, x);
        }
        Ok(n)
    }
}

impl fmt::Debug for RecyclableReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecyclableReader")
            .field("len", &self.len())
            .field("position", &self.pos.consumed)
            .field("shares", &self.share_count())
            .field("closed", &self.is_closed())
            .field("recycled", &self.is_recycled())
            .finish()
    }
}
