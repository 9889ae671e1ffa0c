// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pool configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! start_size = "128"
//! pooled_size = "512"
//! max_size = "32K"
//! max_free_per_class = 1024
//! ```
//!
//! Sizes may be written as integers or human-readable strings. Missing
//! fields take their default values.

use crate::size::human;
use crate::BufferError;
use std::path::Path;

/// Default capacity of the first chunk of a fresh buffer.
pub const DEFAULT_START_SIZE: usize = 128;
/// Default minimum capacity eligible for reuse.
pub const DEFAULT_POOLED_SIZE: usize = 512;
/// Default ceiling for chunk growth.
pub const DEFAULT_MAX_SIZE: usize = 32768;
/// Default number of idle chunks retained per size class.
pub const DEFAULT_MAX_FREE_PER_CLASS: usize = 1024;

/// Allocation and reuse strategy for a [`ChunkPool`](crate::ChunkPool).
///
/// Size classes are the powers of two from `pooled_size` up to and
/// including `max_size`. Chunks smaller than `pooled_size` are never
/// pooled: managing them costs more than allocating them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Capacity of the first chunk allocated for a fresh buffer.
    #[serde(with = "human")]
    pub start_size: usize,
    /// Minimum chunk capacity that is returned to the pool for reuse.
    #[serde(with = "human")]
    pub pooled_size: usize,
    /// Maximum chunk capacity that growth will request.
    #[serde(with = "human")]
    pub max_size: usize,
    /// Idle chunks kept per size class; further releases are dropped.
    pub max_free_per_class: usize,
}

impl PoolConfig {
    /// Creates a configuration with the default retention cap.
    pub fn new(start_size: usize, pooled_size: usize, max_size: usize) -> Self {
        Self {
            start_size,
            pooled_size,
            max_size,
            max_free_per_class: DEFAULT_MAX_FREE_PER_CLASS,
        }
    }

    /// Checks `0 < start_size <= pooled_size <= max_size`.
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.start_size == 0 {
            return Err(BufferError::InvalidConfig(
                "start_size must be greater than zero".into(),
            ));
        }
        if self.start_size > self.pooled_size {
            return Err(BufferError::InvalidConfig(format!(
                "start_size ({}) exceeds pooled_size ({})",
                self.start_size, self.pooled_size
            )));
        }
        if self.pooled_size > self.max_size {
            return Err(BufferError::InvalidConfig(format!(
                "pooled_size ({}) exceeds max_size ({})",
                self.pooled_size, self.max_size
            )));
        }
        Ok(())
    }

    /// Returns the reuse size classes: `pooled_size`, doubling, up to
    /// `max_size` inclusive.
    pub fn size_classes(&self) -> Vec<usize> {
        let mut classes = Vec::new();
        if self.pooled_size == 0 {
            return classes;
        }
        let mut size = self.pooled_size;
        while size <= self.max_size {
            classes.push(size);
            match size.checked_mul(2) {
                Some(next) => size = next,
                None => break,
            }
        }
        classes
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, BufferError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BufferError::ConfigParse(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, BufferError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| BufferError::ConfigParse(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, BufferError> {
        toml::to_string_pretty(self)
            .map_err(|e| BufferError::ConfigParse(format!("TOML serialise error: {e}")))
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_START_SIZE, DEFAULT_POOLED_SIZE, DEFAULT_MAX_SIZE)
    }
}
