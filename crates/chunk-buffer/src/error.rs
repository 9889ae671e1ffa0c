// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the chunk buffer and its readers.

use std::io;

/// Errors that can occur while configuring the pool or moving bytes
/// in and out of buffers and readers.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// A read or scatter-write was attempted on a closed recyclable reader.
    #[error("reader is closed")]
    ReaderClosed,

    /// The sink or source failed part-way through a transfer.
    #[error("transfer failed after {written} bytes: {source}")]
    Transfer {
        written: u64,
        #[source]
        source: io::Error,
    },

    /// The pool configuration violates its size invariants.
    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),

    /// A human-readable size string could not be parsed.
    #[error("invalid size '{0}': expected a number followed by an optional suffix (B, K, M, G)")]
    InvalidSize(String),

    /// Reading, parsing or serialising a TOML configuration failed.
    #[error("configuration error: {0}")]
    ConfigParse(String),
}

impl BufferError {
    /// Returns `true` if an I/O error produced by one of this crate's
    /// `io::Read` implementations signals use of a closed reader.
    pub fn is_reader_closed(err: &io::Error) -> bool {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<BufferError>())
            .is_some_and(|e| matches!(e, BufferError::ReaderClosed))
    }

    /// Number of bytes moved before a transfer failed, or zero for every
    /// other kind of error.
    pub fn bytes_transferred(&self) -> u64 {
        match self {
            BufferError::Transfer { written, .. } => *written,
            _ => 0,
        }
    }
}

impl From<BufferError> for io::Error {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::Transfer { source, .. } => source,
            other => io::Error::other(other),
        }
    }
}
