// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared CLI plumbing.

pub mod benchmark;
pub mod config;
pub mod fanout;
pub mod pipe;

use chunk_buffer::PoolConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Pool sizes given on the command line; each one overrides the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct SizeOverrides {
    pub start_size: Option<usize>,
    pub pooled_size: Option<usize>,
    pub max_size: Option<usize>,
}

/// Installs a stderr `tracing` subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chunk_buffer={level},chunkbuf={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `clap` value parser for human-readable sizes.
pub fn parse_size_arg(s: &str) -> Result<usize, String> {
    chunk_buffer::size::parse_size(s).map_err(|e| e.to_string())
}

/// Builds the pool configuration from an optional TOML file plus CLI
/// overrides, and validates the result.
pub fn resolve_config(path: Option<&Path>, overrides: &SizeOverrides) -> anyhow::Result<PoolConfig> {
    let mut config = match path {
        Some(path) => PoolConfig::from_file(path)?,
        None => PoolConfig::default(),
    };

    if let Some(start) = overrides.start_size {
        config.start_size = start;
    }
    if let Some(pooled) = overrides.pooled_size {
        config.pooled_size = pooled;
    }
    if let Some(max) = overrides.max_size {
        config.max_size = max;
    }

    config.validate()?;
    tracing::debug!(?config, "resolved pool configuration");
    Ok(config)
}

/// Formats a byte count for reports.
pub fn human_bytes(bytes: u64) -> String {
    let b = bytes as f64;
    if b >= 1024.0 * 1024.0 {
        format!("{:.2} MB", b / (1024.0 * 1024.0))
    } else if b >= 1024.0 {
        format!("{:.1} KB", b / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
