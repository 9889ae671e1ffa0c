// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Human-readable chunk sizes.
//!
//! Pool sizes are small powers of two, so configuration files and CLI
//! flags accept them with binary suffixes:
//! - `"512"` or `"512B"` → 512 bytes
//! - `"32K"` or `"32KB"` → 32 × 1024 bytes
//! - `"1M"` or `"1MB"` → 1024² bytes
//! - `"1G"` or `"1GB"` → 1024³ bytes
//!
//! Parsing is case-insensitive and ignores surrounding whitespace.

use crate::BufferError;

const KIB: usize = 1024;
const MIB: usize = 1024 * 1024;
const GIB: usize = 1024 * 1024 * 1024;

/// Parses a human-readable size string into a byte count.
///
/// # Examples
/// ```
/// use chunk_buffer::size::parse_size;
///
/// assert_eq!(parse_size("32K").unwrap(), 32 * 1024);
/// assert_eq!(parse_size("128").unwrap(), 128);
/// ```
pub fn parse_size(s: &str) -> Result<usize, BufferError> {
    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();
    let digits_end = upper
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(upper.len());
    let (num_str, suffix) = upper.split_at(digits_end);

    let multiplier = match suffix.trim() {
        "" | "B" => 1,
        "K" | "KB" => KIB,
        "M" | "MB" => MIB,
        "G" | "GB" => GIB,
        _ => return Err(BufferError::InvalidSize(trimmed.to_string())),
    };

    let value: usize = num_str
        .parse()
        .map_err(|_| BufferError::InvalidSize(trimmed.to_string()))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| BufferError::InvalidSize(trimmed.to_string()))
}

/// Formats a byte count using the largest suffix that divides it exactly,
/// so the result always parses back to the same value.
pub fn format_size(bytes: usize) -> String {
    if bytes >= GIB && bytes % GIB == 0 {
        format!("{}G", bytes / GIB)
    } else if bytes >= MIB && bytes % MIB == 0 {
        format!("{}M", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}K", bytes / KIB)
    } else {
        bytes.to_string()
    }
}

/// Serde adapter for `usize` fields holding sizes: serialises as a
/// human-readable string, deserialises from either an integer or a string.
pub(crate) mod human {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u64),
        Text(String),
    }

    pub(crate) fn serialize<S: Serializer>(bytes: &usize, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_size(*bytes))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Int(n) => usize::try_from(n).map_err(serde::de::Error::custom),
            Repr::Text(s) => super::parse_size(&s).map_err(serde::de::Error::custom),
        }
    }
}
