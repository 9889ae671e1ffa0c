// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # chunkbuf
//!
//! Command-line driver for the `chunk-buffer` crate.
//!
//! ## Usage
//! ```bash
//! # Stream stdin to stdout through a chunked buffer
//! cat big.json | chunkbuf pipe > copy.json
//!
//! # Measure append and finalization throughput
//! chunkbuf benchmark --records 20000 --max-size 64K
//!
//! # Share one payload between concurrent readers
//! chunkbuf fanout --input big.json --readers 8
//!
//! # Show the effective pool configuration
//! chunkbuf --config pool.toml config
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chunkbuf",
    about = "Chunked serialization buffer and chunk pool toolkit",
    version,
    author
)]
struct Cli {
    /// Path to a TOML pool configuration file.
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Capacity of the first chunk of each buffer (e.g. "128", "1K").
    #[arg(long, global = true, value_parser = commands::parse_size_arg)]
    start_size: Option<usize>,

    /// Minimum chunk capacity kept for reuse.
    #[arg(long, global = true, value_parser = commands::parse_size_arg)]
    pooled_size: Option<usize>,

    /// Maximum chunk capacity.
    #[arg(long, global = true, value_parser = commands::parse_size_arg)]
    max_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read an input into a buffer and flush it to an output.
    Pipe {
        /// Input file (defaults to stdin).
        #[arg(short, long)]
        input: Option<std::path::PathBuf>,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },

    /// Benchmark a synthetic serialization workload across finalization modes.
    Benchmark {
        /// Records encoded per round.
        #[arg(long, default_value_t = 10_000)]
        records: usize,

        /// Fields per record.
        #[arg(long, default_value_t = 8)]
        fields: usize,

        /// Rounds per finalization mode.
        #[arg(long, default_value_t = 5)]
        rounds: usize,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Share one payload between concurrent readers via recyclable clones.
    Fanout {
        /// Input file (defaults to a synthetic payload).
        #[arg(short, long)]
        input: Option<std::path::PathBuf>,

        /// Number of concurrent readers.
        #[arg(short, long, default_value_t = 4)]
        readers: usize,
    },

    /// Print the effective pool configuration and its size classes.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    let overrides = commands::SizeOverrides {
        start_size: cli.start_size,
        pooled_size: cli.pooled_size,
        max_size: cli.max_size,
    };
    let config = commands::resolve_config(cli.config.as_deref(), &overrides)?;

    match cli.command {
        Commands::Pipe { input, output } => commands::pipe::execute(config, input, output).await,
        Commands::Benchmark {
            records,
            fields,
            rounds,
            json,
        } => commands::benchmark::execute(config, records, fields, rounds, json).await,
        Commands::Fanout { input, readers } => {
            commands::fanout::execute(config, input, readers).await
        }
        Commands::Config => commands::config::execute(config).await,
    }
}
