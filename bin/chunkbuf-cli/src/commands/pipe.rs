// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `chunkbuf pipe` command: read a whole input into a chunked buffer, then
//! scatter-write it to the output.
//!
//! Stdout may carry the payload, so the report goes to stderr.

use anyhow::Context;
use chunk_buffer::{Buffer, ChunkPool, PoolConfig};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

pub async fn execute(
    config: PoolConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let pool = ChunkPool::new(config)?;
    let report = tokio::task::spawn_blocking(move || pipe(&pool, input, output)).await??;

    eprintln!("  ── Pipe ──────────────────────────────────────────────");
    eprintln!("   Read:     {}", super::human_bytes(report.read));
    eprintln!("   Written:  {}", super::human_bytes(report.written));
    eprintln!("   Chunks:   {}", report.chunks);
    eprintln!("   Elapsed:  {:.2}ms", report.elapsed_ms);
    eprintln!("   Pool:     {}", report.summary);
    Ok(())
}

#[derive(Debug)]
struct PipeReport {
    read: u64,
    written: u64,
    chunks: usize,
    elapsed_ms: f64,
    summary: String,
}

fn pipe(pool: &ChunkPool, input: Option<PathBuf>, output: Option<PathBuf>) -> anyhow::Result<PipeReport> {
    let started = Instant::now();
    let mut buf = Buffer::new(pool.clone());

    let read = match &input {
        Some(path) => {
            let mut file =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            buf.read_from(&mut file)?
        }
        None => buf.read_from(&mut io::stdin().lock())?,
    };
    let chunks = buf.chunk_count();
    tracing::debug!(read, chunks, "input buffered");

    let written = match &output {
        Some(path) => {
            let mut file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            buf.flush_to(&mut file)?
        }
        None => {
            let mut out = io::stdout().lock();
            let n = buf.flush_to(&mut out)?;
            out.flush()?;
            n
        }
    };
    tracing::info!(read, written, chunks, "pipe complete");

    Ok(PipeReport {
        read,
        written,
        chunks,
        elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        summary: pool.stats().summary(),
    })
}
