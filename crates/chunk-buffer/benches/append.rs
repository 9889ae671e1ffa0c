// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for buffer appends and finalization paths.

use chunk_buffer::{Buffer, ChunkPool};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Read;

const FIELD: &[u8] = b"\"name\":\"benchmark-field\",";

fn fill(buf: &mut Buffer, fields: usize) {
    for _ in 0..fields {
        buf.append_bytes(FIELD);
    }
}

fn bench_append(c: &mut Criterion) {
    let pool = ChunkPool::default();
    let mut group = c.benchmark_group("append");
    for fields in [16, 1024, 16 * 1024] {
        group.bench_function(format!("contiguous/{fields}"), |b| {
            b.iter(|| {
                let mut buf = Buffer::new(pool.clone());
                fill(&mut buf, fields);
                black_box(buf.to_contiguous_bytes(None))
            })
        });
        group.bench_function(format!("flush/{fields}"), |b| {
            let mut sink = Vec::new();
            b.iter(|| {
                sink.clear();
                let mut buf = Buffer::new(pool.clone());
                fill(&mut buf, fields);
                black_box(buf.flush_to(&mut sink).ok())
            })
        });
    }
    group.finish();
}

fn bench_recyclable(c: &mut Criterion) {
    let pool = ChunkPool::default();
    c.bench_function("recyclable/clone-read-4", |b| {
        let mut out = Vec::new();
        b.iter(|| {
            let mut buf = Buffer::new(pool.clone());
            fill(&mut buf, 1024);
            let mut reader = buf.to_recyclable_reader();
            for _ in 0..4 {
                let mut clone = reader.clone();
                out.clear();
                clone.read_to_end(&mut out).ok();
                clone.recycle();
            }
            reader.recycle();
            black_box(out.len())
        })
    });
}

criterion_group!(benches, bench_append, bench_recyclable);
criterion_main!(benches);
