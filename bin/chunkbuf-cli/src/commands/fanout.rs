// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `chunkbuf fanout` command: hand one finalized payload to several
//! concurrent consumers through recyclable reader clones.
//!
//! Every consumer runs on the blocking pool, reads its own cursor to the
//! end, checks the bytes against the source payload and recycles its clone. The
//! chunks return to the pool only once the last clone is gone.

use anyhow::Context;
use chunk_buffer::{Buffer, ChunkPool, PoolConfig, RecyclableReader};
use std::fmt::Write as _;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Size of the payload generated when no input file is given.
const SYNTHETIC_RECORDS: usize = 2_000;

pub async fn execute(
    config: PoolConfig,
    input: Option<PathBuf>,
    readers: usize,
) -> anyhow::Result<()> {
    anyhow::ensure!(readers > 0, "--readers must be at least 1");

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           chunkbuf · Reader Fan-out                  ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let pool = ChunkPool::new(config)?;
    let mut buf = Buffer::new(pool.clone());
    match &input {
        Some(path) => {
            let mut file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            buf.read_from(&mut file)?;
        }
        None => {
            println!("  No input given, using {SYNTHETIC_RECORDS} synthetic records.");
            synthetic_payload(&mut buf)?;
        }
    }

    let mut origin = buf.to_recyclable_reader();
    let expected: Arc<Vec<u8>> = Arc::new(origin.to_bytes());
    println!(
        "  Payload:  {} across {} readers",
        super::human_bytes(expected.len() as u64),
        readers,
    );
    println!();

    // ── Consumers ──────────────────────────────────────────────
    let started = Instant::now();
    let mut handles = Vec::with_capacity(readers);
    for id in 0..readers {
        let clone = origin.clone();
        let expected = Arc::clone(&expected);
        handles.push(tokio::task::spawn_blocking(move || consume(id, clone, &expected)));
    }

    let mut failures = 0;
    for handle in handles {
        let outcome = handle.await?;
        match outcome {
            Ok(c) => println!(
                "   reader {:>3}  {:>10}  {:>6} reads  {:>8.2}ms",
                c.id,
                super::human_bytes(c.bytes),
                c.reads,
                c.elapsed_ms,
            ),
            Err(e) => {
                failures += 1;
                println!("   reader FAILED: {e:#}");
            }
        }
    }
    println!();

    // ── Release ────────────────────────────────────────────────
    let held = origin.share_count();
    origin.recycle();
    println!("  Elapsed:     {:.2}ms", started.elapsed().as_secs_f64() * 1000.0);
    println!("  Held before final recycle: {held}");
    println!("  Pool free:   {}", super::human_bytes(pool.free_bytes() as u64));
    println!("  Pool:        {}", pool.stats().summary());
    println!();

    anyhow::ensure!(failures == 0, "{failures} of {readers} readers failed");
    Ok(())
}

#[derive(Debug)]
struct Consumed {
    id: usize,
    bytes: u64,
    reads: usize,
    elapsed_ms: f64,
}

/// Drains one clone in small reads and verifies what it saw.
fn consume(id: usize, mut reader: RecyclableReader, expected: &[u8]) -> anyhow::Result<Consumed> {
    let started = Instant::now();
    let mut seen = Vec::with_capacity(reader.len());
    let mut block = [0u8; 1024];
    let mut reads = 0;

    loop {
        let n = reader.read(&mut block)?;
        if n == 0 {
            break;
        }
        reads += 1;
        seen.extend_from_slice(&block[..n]);
    }
    reader.recycle();

    anyhow::ensure!(seen == expected, "reader {id} saw different bytes");
    tracing::debug!(id, bytes = seen.len(), reads, "reader drained");

    Ok(Consumed {
        id,
        bytes: seen.len() as u64,
        reads,
        elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
    })
}

fn synthetic_payload(buf: &mut Buffer) -> std::fmt::Result {
    for id in 0..SYNTHETIC_RECORDS {
        writeln!(buf, "{{\"id\":{id},\"name\":\"record-{id}\",\"score\":{}}}", id * 7 % 100)?;
    }
    Ok(())
}
