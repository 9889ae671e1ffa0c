// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scatter-writes of chunk sequences.

use crate::BufferError;
use std::io::{self, IoSlice, Write};

/// Writes every slice to `sink` in order using vectored writes, retrying
/// short writes and `Interrupted` errors.
///
/// On failure the error carries the number of bytes the sink accepted
/// before it failed.
pub(crate) fn write_all_vectored<'a, W, I>(sink: &mut W, chunks: I) -> Result<u64, BufferError>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut slices: Vec<IoSlice<'a>> = chunks
        .into_iter()
        .filter(|chunk| !chunk.is_empty())
        .map(IoSlice::new)
        .collect();
    let mut remaining = &mut slices[..];
    let mut written: u64 = 0;

    while !remaining.is_empty() {
        match sink.write_vectored(remaining) {
            Ok(0) => {
                return Err(BufferError::Transfer {
                    written,
                    source: io::Error::new(io::ErrorKind::WriteZero, "sink accepted no bytes"),
                });
            }
            Ok(n) => {
                written += n as u64;
                IoSlice::advance_slices(&mut remaining, n);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(source) => return Err(BufferError::Transfer { written, source }),
        }
    }
    Ok(written)
}
