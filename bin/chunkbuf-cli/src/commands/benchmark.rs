// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `chunkbuf benchmark` command: encode a synthetic record stream and
//! finalize it every way the buffer supports.
//!
//! Each mode runs against its own pool with the same configuration, so the
//! reported hit ratio reflects that mode's reuse pattern alone.

use chunk_buffer::{Buffer, ChunkPool, PoolConfig, PoolStats};
use std::fmt::Write as _;
use std::io;
use std::time::{Duration, Instant};

/// Ways of turning a filled buffer into output.
const MODES: [Mode; 4] = [Mode::Contiguous, Mode::Flush, Mode::OneShot, Mode::Recyclable];

#[derive(Debug, Clone, Copy)]
enum Mode {
    Contiguous,
    Flush,
    OneShot,
    Recyclable,
}

impl Mode {
    fn name(self) -> &'static str {
        match self {
            Mode::Contiguous => "contiguous",
            Mode::Flush => "flush",
            Mode::OneShot => "one-shot",
            Mode::Recyclable => "recyclable",
        }
    }
}

#[derive(Debug)]
struct BenchResult {
    mode: Mode,
    bytes_per_round: usize,
    chunks_per_round: usize,
    best: Duration,
    mean: Duration,
    stats: PoolStats,
}

impl BenchResult {
    fn mb_per_sec(&self) -> f64 {
        let secs = self.best.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.bytes_per_round as f64 / (1024.0 * 1024.0) / secs
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "mode": self.mode.name(),
            "bytes_per_round": self.bytes_per_round,
            "chunks_per_round": self.chunks_per_round,
            "best_ms": self.best.as_secs_f64() * 1000.0,
            "mean_ms": self.mean.as_secs_f64() * 1000.0,
            "mb_per_sec": self.mb_per_sec(),
            "pool": self.stats,
        })
    }
}

pub async fn execute(
    config: PoolConfig,
    records: usize,
    fields: usize,
    rounds: usize,
    json: bool,
) -> anyhow::Result<()> {
    anyhow::ensure!(rounds > 0, "--rounds must be at least 1");

    let results = tokio::task::spawn_blocking(move || {
        MODES
            .iter()
            .map(|&mode| run_mode(config, mode, records, fields, rounds))
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await??;

    if json {
        let report = serde_json::json!({
            "config": config,
            "records": records,
            "fields": fields,
            "rounds": rounds,
            "results": results.iter().map(BenchResult::to_json).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           chunkbuf · Benchmark Suite                 ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!(
        "  Pool:     start {} · pooled {} · max {}",
        config.start_size, config.pooled_size, config.max_size,
    );
    println!("  Workload: {records} records × {fields} fields, {rounds} rounds per mode");
    println!();

    // ── Results Table ──────────────────────────────────────────
    println!(
        "  {:<12} {:>10} {:>7} {:>10} {:>10} {:>10} {:>8}",
        "Mode", "Bytes", "Chunks", "Best", "Mean", "MB/s", "Hit %",
    );
    println!("  {}", "-".repeat(74));

    for r in &results {
        println!(
            "  {:<12} {:>10} {:>7} {:>8.2}ms {:>8.2}ms {:>10.1} {:>7.1}%",
            r.mode.name(),
            super::human_bytes(r.bytes_per_round as u64),
            r.chunks_per_round,
            r.best.as_secs_f64() * 1000.0,
            r.mean.as_secs_f64() * 1000.0,
            r.mb_per_sec(),
            r.stats.hit_ratio() * 100.0,
        );
    }
    println!();

    // ── Summary ────────────────────────────────────────────────
    if let Some(fastest) = results.iter().max_by(|a, b| a.mb_per_sec().total_cmp(&b.mb_per_sec())) {
        println!(
            "  Fastest: {} ({:.1} MB/s)",
            fastest.mode.name(),
            fastest.mb_per_sec(),
        );
    }
    for r in &results {
        println!("   {:<12} {}", r.mode.name(), r.stats.summary());
    }
    println!();

    Ok(())
}

/// Runs every round of one mode against a fresh pool.
fn run_mode(
    config: PoolConfig,
    mode: Mode,
    records: usize,
    fields: usize,
    rounds: usize,
) -> anyhow::Result<BenchResult> {
    let pool = ChunkPool::new(config)?;
    let mut timings = Vec::with_capacity(rounds);
    let mut bytes_per_round = 0;
    let mut chunks_per_round = 0;
    let mut reuse = Vec::new();

    for _ in 0..rounds {
        let started = Instant::now();

        let mut buf = Buffer::new(pool.clone());
        encode_records(&mut buf, records, fields)?;
        bytes_per_round = buf.size();
        chunks_per_round = buf.chunk_count();

        let produced = match mode {
            Mode::Contiguous => {
                let out = buf.to_contiguous_bytes(Some(std::mem::take(&mut reuse)));
                let n = out.len();
                reuse = out;
                n as u64
            }
            Mode::Flush => buf.flush_to(&mut io::sink())?,
            Mode::OneShot => {
                let mut reader = buf.to_one_shot_reader();
                io::copy(&mut reader, &mut io::sink())?
            }
            Mode::Recyclable => {
                let mut reader = buf.to_recyclable_reader();
                let mut clone = reader.clone();
                let n = clone.write_to(&mut io::sink())?;
                clone.recycle();
                reader.recycle();
                n
            }
        };

        timings.push(started.elapsed());
        anyhow::ensure!(
            produced as usize == bytes_per_round,
            "{} produced {produced} bytes, expected {bytes_per_round}",
            mode.name(),
        );
    }

    let best = timings.iter().min().copied().unwrap_or_default();
    let mean = timings.iter().sum::<Duration>() / timings.len() as u32;
    let stats = pool.stats();
    tracing::info!(mode = mode.name(), ?best, hit_ratio = stats.hit_ratio(), "mode complete");

    Ok(BenchResult {
        mode,
        bytes_per_round,
        chunks_per_round,
        best,
        mean,
        stats,
    })
}

/// Writes `records` JSON lines with `fields` string fields each.
fn encode_records(buf: &mut Buffer, records: usize, fields: usize) -> std::fmt::Result {
    for id in 0..records {
        write!(buf, "{{\"id\":{id}")?;
        for f in 0..fields {
            write!(buf, ",\"field_{f}\":\"value-{id}-{f}\"")?;
        }
        buf.append_str("}\n");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_records() {
        let pool = ChunkPool::default();
        let mut buf = Buffer::new(pool);
        encode_records(&mut buf, 2, 1).unwrap();
        assert_eq!(
            buf.bytes(),
            b"{\"id\":0,\"field_0\":\"value-0-0\"}\n{\"id\":1,\"field_0\":\"value-1-0\"}\n"
        );
    }

    #[test]
    fn test_every_mode_round_trips() {
        let config = PoolConfig::new(16, 16, 256);
        for mode in MODES {
            let r = run_mode(config, mode, 50, 3, 2).unwrap();
            assert!(r.bytes_per_round > 0);
            assert!(r.chunks_per_round > 1);
            assert!(r.stats.hits > 0, "{} never reused a chunk", mode.name());
        }
    }
}
