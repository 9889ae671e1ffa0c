// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `chunkbuf config` command: print the effective pool configuration.

use chunk_buffer::size::format_size;
use chunk_buffer::PoolConfig;

pub async fn execute(config: PoolConfig) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           chunkbuf · Pool Configuration              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── TOML ───────────────────────────────────────────────────
    for line in config.to_toml()?.lines() {
        println!("  {line}");
    }
    println!();

    // ── Size Classes ───────────────────────────────────────────
    let classes = config.size_classes();
    println!("  Size classes ({}):", classes.len());
    for class in &classes {
        println!("   {:>8}  up to {} free", format_size(*class), config.max_free_per_class);
    }
    println!();

    let retained = classes.iter().sum::<usize>().saturating_mul(config.max_free_per_class);
    println!("  Worst-case retention: {}", super::human_bytes(retained as u64));
    println!();

    Ok(())
}
