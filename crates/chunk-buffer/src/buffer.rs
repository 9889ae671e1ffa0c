// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Growable chunked buffer for serialization output.
//!
//! A [`Buffer`] collects many small appends into a list of chunks drawn
//! from a [`ChunkPool`]. Only the *active* chunk receives bytes; when it
//! fills up it is spilled to the chunk list and a chunk of twice its
//! capacity (capped at `max_size`) becomes active. Existing bytes are
//! never moved, so the number of allocations is logarithmic in the final
//! size.
//!
//! ```text
//!  spilled: [ 128 ][ 256 ][ 512 ]   active: [ 1024 ....... ]
//!                                              ▲ appends land here
//! ```
//!
//! Every finalization (`to_contiguous_bytes`, `flush_to`,
//! `to_one_shot_reader`, `to_recyclable_reader`) hands the chunks on and
//! leaves the buffer empty and ready for reuse.

use crate::reader::OneShotReader;
use crate::shared::RecyclableReader;
use crate::vectored::write_all_vectored;
use crate::{BufferError, ChunkPool};
use std::fmt;
use std::io::{self, Read, Write};

/// Working block size used by [`Buffer::read_from`].
pub const READ_BLOCK_SIZE: usize = 4096;

/// An append-only byte buffer made of pooled chunks.
///
/// Not safe for concurrent writers; move it between threads freely.
///
/// # Example
/// ```
/// use chunk_buffer::{Buffer, ChunkPool};
///
/// let pool = ChunkPool::default();
/// let mut buf = Buffer::new(pool);
/// buf.append_byte(b'{');
/// buf.append_str("\"id\":");
/// buf.append_bytes(b"42");
/// buf.append_byte(b'}');
///
/// assert_eq!(buf.size(), 9);
/// assert_eq!(buf.to_contiguous_bytes(None), b"{\"id\":42}");
/// assert!(buf.is_empty());
/// ```
pub struct Buffer {
    pool: ChunkPool,
    /// Full chunks, in write order. Never mutated after spilling.
    spilled: Vec<Vec<u8>>,
    /// The only chunk receiving appends. Never grown past its capacity,
    /// so it stays the allocation the pool handed out.
    active: Vec<u8>,
    /// Capacity `active` had when it was acquired.
    active_capacity: usize,
}

impl Buffer {
    /// Creates an empty buffer. No chunk is allocated until the first
    /// append.
    pub fn new(pool: ChunkPool) -> Self {
        Self {
            pool,
            spilled: Vec::new(),
            active: Vec::new(),
            active_capacity: 0,
        }
    }

    /// Returns the pool this buffer draws chunks from.
    pub fn pool(&self) -> &ChunkPool {
        &self.pool
    }

    /// Returns the active chunk for in-place serialization.
    ///
    /// Call [`ensure_space`](Self::ensure_space) first and write at most
    /// that many bytes. The chunk must not grow past its capacity: pushing
    /// beyond it reallocates, and the chunk would no longer belong to its
    /// size class.
    ///
    /// ```
    /// use chunk_buffer::{Buffer, ChunkPool};
    /// use std::io::Write;
    ///
    /// let mut buf = Buffer::new(ChunkPool::default());
    /// buf.ensure_space(20);
    /// write!(buf.active_mut(), "{}", u64::MAX).unwrap();
    /// assert_eq!(buf.bytes(), b"18446744073709551615");
    /// ```
    pub fn active_mut(&mut self) -> &mut Vec<u8> {
        &mut self.active
    }

    #[inline]
    fn free_space(&self) -> usize {
        self.active.capacity() - self.active.len()
    }

    /// Makes sure the active chunk has at least `n` free bytes, spilling
    /// it and acquiring a larger one if needed.
    #[inline]
    pub fn ensure_space(&mut self, n: usize) {
        if self.free_space() < n {
            self.grow(n);
        }
    }

    fn grow(&mut self, needed: usize) {
        let config = self.pool.config();

        let previous = std::mem::take(&mut self.active);
        debug_assert_eq!(
            previous.capacity(),
            self.active_capacity,
            "active chunk grew past its acquired capacity"
        );
        if previous.is_empty() {
            self.pool.release(previous);
        } else {
            self.spilled.push(previous);
        }

        let next = match self.spilled.last() {
            Some(last) => last.capacity().saturating_mul(2),
            None => config.start_size,
        };
        let capacity = next.min(config.max_size).max(needed);
        self.active = self.pool.acquire(capacity);
        self.active_capacity = self.active.capacity();

        tracing::trace!(
            capacity,
            spilled = self.spilled.len(),
            "buffer acquired new active chunk"
        );
    }

    /// Appends a single byte.
    #[inline]
    pub fn append_byte(&mut self, byte: u8) {
        self.ensure_space(1);
        self.active.push(byte);
    }

    /// Appends a byte slice, splitting it across chunks when it does not
    /// fit in the active chunk.
    #[inline]
    pub fn append_bytes(&mut self, data: &[u8]) {
        if data.len() <= self.free_space() {
            self.active.extend_from_slice(data);
        } else {
            self.append_slow(data);
        }
    }

    /// Appends the UTF-8 bytes of a string.
    #[inline]
    pub fn append_str(&mut self, data: &str) {
        self.append_bytes(data.as_bytes());
    }

    fn append_slow(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            self.ensure_space(1);
            let n = self.free_space().min(data.len());
            let (head, tail) = data.split_at(n);
            self.active.extend_from_slice(head);
            data = tail;
        }
        debug_assert!(self.active.len() <= self.active.capacity());
    }

    /// Returns the number of bytes written so far.
    ///
    /// Sums the chunk lengths, so it is linear in the number of chunks,
    /// not in the number of bytes.
    pub fn size(&self) -> usize {
        self.active.len() + self.spilled.iter().map(Vec::len).sum::<usize>()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.spilled.is_empty()
    }

    /// Returns the number of chunks currently held, including an empty
    /// active chunk that has been allocated.
    pub fn chunk_count(&self) -> usize {
        self.spilled.len() + usize::from(self.active.capacity() > 0)
    }

    /// Copies the contents into a new vector without finalizing.
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        for chunk in &self.spilled {
            out.extend_from_slice(chunk);
        }
        out.extend_from_slice(&self.active);
        out
    }

    /// Moves all non-empty chunks out in write order, leaving the buffer
    /// empty. An empty active chunk goes back to the pool.
    fn take_chunks(&mut self) -> Vec<Vec<u8>> {
        let mut chunks = std::mem::take(&mut self.spilled);
        let active = std::mem::take(&mut self.active);
        self.active_capacity = 0;
        if active.is_empty() {
            self.pool.release(active);
        } else {
            chunks.push(active);
        }
        chunks
    }

    /// Discards the contents, returning every chunk to the pool.
    pub fn reset(&mut self) {
        let chunks = self.take_chunks();
        self.pool.release_all(chunks);
    }

    /// Returns the whole contents as one vector and resets the buffer.
    ///
    /// With a single chunk, that chunk is returned as is (no copy, the pool
    /// is not involved). Otherwise the chunks are copied into `reuse` if
    /// its capacity is large enough, or into a new vector, and are then
    /// released to the pool.
    pub fn to_contiguous_bytes(&mut self, reuse: Option<Vec<u8>>) -> Vec<u8> {
        if self.spilled.is_empty() {
            self.active_capacity = 0;
            return std::mem::take(&mut self.active);
        }

        let size = self.size();
        let mut out = match reuse {
            Some(mut buf) if buf.capacity() >= size => {
                buf.clear();
                buf
            }
            _ => Vec::with_capacity(size),
        };

        for chunk in self.take_chunks() {
            out.extend_from_slice(&chunk);
            self.pool.release(chunk);
        }
        out
    }

    /// Writes every chunk to `sink` in order and resets the buffer.
    ///
    /// Chunks are released to the pool whether or not the sink succeeds;
    /// a failed flush is not retried. On error, the number of bytes the
    /// sink accepted is reported in [`BufferError::Transfer`].
    pub fn flush_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<u64, BufferError> {
        let chunks = self.take_chunks();
        let result = write_all_vectored(sink, chunks.iter().map(Vec::as_slice));
        self.pool.release_all(chunks);
        result
    }

    /// Hands the chunks to a single-pass reader. No bytes are copied.
    pub fn to_one_shot_reader(&mut self) -> OneShotReader {
        OneShotReader::new(self.take_chunks(), self.pool.clone())
    }

    /// Wraps the chunks in a new shared set and returns the first reader
    /// over it. No bytes are copied.
    pub fn to_recyclable_reader(&mut self) -> RecyclableReader {
        RecyclableReader::new(self.take_chunks(), self.pool.clone())
    }

    /// Appends everything `source` yields until end of input.
    ///
    /// Data is pulled in [`READ_BLOCK_SIZE`] blocks; each full block is
    /// appended immediately. End of input is not an error. Any other error
    /// is returned after the bytes read so far have been appended.
    pub fn read_from<R: Read + ?Sized>(&mut self, source: &mut R) -> Result<u64, BufferError> {
        let mut block = [0u8; READ_BLOCK_SIZE];
        let mut filled = 0;
        let mut total: u64 = 0;

        loop {
            match source.read(&mut block[filled..]) {
                Ok(0) => {
                    self.append_bytes(&block[..filled]);
                    total += filled as u64;
                    return Ok(total);
                }
                Ok(n) => {
                    filled += n;
                    if filled == READ_BLOCK_SIZE {
                        self.append_bytes(&block);
                        total += READ_BLOCK_SIZE as u64;
                        filled = 0;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.append_bytes(&block[..filled]);
                    total += filled as u64;
                    return Err(BufferError::Transfer {
                        written: total,
                        source: e,
                    });
                }
            }
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.reset();
    }
}

impl Write for Buffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.append_bytes(data);
        Ok(data.len())
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.append_bytes(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append_str(s);
        Ok(())
    }

    fn write_char(&mut self, c: char) -> fmt::Result {
        let mut utf8 = [0u8; 4];
        self.append_str(c.encode_utf8(&mut utf8));
        Ok(())
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.size())
            .field("chunks", &self.chunk_count())
            .field("active_capacity", &self.active.capacity())
            .finish()
    }
}
