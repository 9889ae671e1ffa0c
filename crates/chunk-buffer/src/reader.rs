// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Single-pass, destructive reader over finalized chunks.

use crate::vectored::write_all_vectored;
use crate::{BufferError, ChunkPool};
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read, Write};

/// Streams the contents of a [`Buffer`](crate::Buffer) exactly once.
///
/// Each chunk goes back to the pool as soon as it has been fully read or
/// written out. Whatever is left when the reader is closed or dropped is
/// released too.
pub struct OneShotReader {
    chunks: VecDeque<Vec<u8>>,
    /// Read position inside the front chunk.
    offset: usize,
    pool: ChunkPool,
}

impl OneShotReader {
    pub(crate) fn new(chunks: Vec<Vec<u8>>, pool: ChunkPool) -> Self {
        let (chunks, empty): (Vec<_>, Vec<_>) =
            chunks.into_iter().partition(|chunk| !chunk.is_empty());
        pool.release_all(empty);
        Self {
            chunks: chunks.into(),
            offset: 0,
            pool,
        }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum::<usize>() - self.offset
    }

    /// Returns `true` once every byte has been consumed or the reader was
    /// closed.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Copies the unread bytes without consuming them.
    pub fn contents(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.remaining());
        for slice in self.unread() {
            out.extend_from_slice(slice);
        }
        out
    }

    fn unread(&self) -> impl Iterator<Item = &[u8]> {
        let offset = self.offset;
        self.chunks
            .iter()
            .enumerate()
            .map(move |(i, chunk)| if i == 0 { &chunk[offset..] } else { &chunk[..] })
    }

    /// Advances by `n` bytes, releasing every chunk that is fully drained.
    fn consume(&mut self, mut n: usize) {
        while n > 0 {
            let Some(front) = self.chunks.front() else {
                break;
            };
            let available = front.len() - self.offset;
            if n < available {
                self.offset += n;
                return;
            }
            n -= available;
            self.offset = 0;
            if let Some(drained) = self.chunks.pop_front() {
                self.pool.release(drained);
            }
        }
    }

    /// Writes all unread bytes to `sink` with vectored writes.
    ///
    /// Chunks are released as they are written. If the sink fails, the
    /// unwritten remainder stays in the reader until it is closed.
    pub fn write_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<u64, BufferError> {
        let result = write_all_vectored(sink, self.unread());
        let written = match &result {
            Ok(n) => *n,
            Err(e) => e.bytes_transferred(),
        };
        self.consume(written as usize);
        result
    }

    /// Releases all unread chunks. Safe to call any number of times.
    pub fn close(&mut self) {
        self.offset = 0;
        let chunks = std::mem::take(&mut self.chunks);
        self.pool.release_all(chunks);
    }
}

impl Read for OneShotReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        while n < out.len() {
            let copied = match self.chunks.front() {
                Some(front) => {
                    let src = &front[self.offset..];
                    let x = src.len().min(out.len() - n);
                    out[n..n + x].copy_from_slice(&src[..x]);
                    x
                }
                None => break,
            };
            n += copied;
            self.consume(copied);
        }
        Ok(n)
    }
}

impl Drop for OneShotReader {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for OneShotReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneShotReader")
            .field("chunks", &self.chunks.len())
            .field("remaining", &self.remaining())
            .finish()
    }
}
