// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: buffers, pools and readers working together.
//!
//! These tests drive the public API the way serialization code does:
//! many small appends, then one of the finalization paths, with pool
//! occupancy checked before and after chunks change hands.

use chunk_buffer::{Buffer, BufferError, ChunkPool, PoolConfig};
use std::io::Read;

// ── Helpers ────────────────────────────────────────────────────

fn small_pool() -> ChunkPool {
    ChunkPool::new(PoolConfig::new(4, 8, 16)).unwrap()
}

/// Emits a JSON-like record field by field, as generated encoders do.
fn encode_record(buf: &mut Buffer, id: usize, name: &str) {
    buf.append_byte(b'{');
    buf.append_str("\"id\":");
    buf.append_str(&id.to_string());
    buf.append_str(",\"name\":\"");
    buf.append_str(name);
    buf.append_str("\"}");
}

fn expected_record(id: usize, name: &str) -> String {
    format!("{{\"id\":{id},\"name\":\"{name}\"}}")
}

fn pieces() -> Vec<Vec<u8>> {
    (0..50)
        .map(|i| (0..(i * 7) % 41).map(|b| (b * 3 + i) as u8).collect())
        .collect()
}

// ── Buffer Finalization ────────────────────────────────────────

#[test]
fn test_contiguous_bytes_equals_concatenation() {
    let pool = ChunkPool::default();
    let mut buf = Buffer::new(pool);
    let mut expected = Vec::new();
    for piece in pieces() {
        buf.append_bytes(&piece);
        expected.extend_from_slice(&piece);
    }
    assert_eq!(buf.size(), expected.len());
    assert_eq!(buf.to_contiguous_bytes(None), expected);
}

#[test]
fn test_growth_cap_never_truncates() {
    let pool = small_pool();
    let mut buf = Buffer::new(pool.clone());
    let mut expected = Vec::new();
    for piece in pieces() {
        buf.append_bytes(&piece);
        expected.extend_from_slice(&piece);
    }
    assert!(expected.len() > pool.config().max_size);
    assert_eq!(buf.to_contiguous_bytes(None), expected);
}

#[test]
fn test_flush_equals_contiguous_bytes() {
    let pool = ChunkPool::default();
    let mut flushed = Buffer::new(pool.clone());
    let mut built = Buffer::new(pool);
    for i in 0..500 {
        encode_record(&mut flushed, i, "widget");
        encode_record(&mut built, i, "widget");
    }

    let mut sink = Vec::new();
    let n = flushed.flush_to(&mut sink).unwrap();
    assert_eq!(n as usize, sink.len());
    assert_eq!(sink, built.to_contiguous_bytes(None));
}

#[test]
fn test_encoded_records() {
    let mut buf = Buffer::new(ChunkPool::default());
    let mut expected = String::new();
    for i in 0..10 {
        encode_record(&mut buf, i, "gadget");
        expected.push_str(&expected_record(i, "gadget"));
    }
    assert_eq!(String::from_utf8(buf.to_contiguous_bytes(None)).unwrap(), expected);
}

#[test]
fn test_hello_world_pool_reuse() {
    let pool = small_pool();
    let mut buf = Buffer::new(pool.clone());
    for piece in ["hell", "o wo", "rld!"] {
        buf.append_str(piece);
    }
    assert_eq!(pool.stats().misses, 2);
    assert_eq!(buf.to_contiguous_bytes(None), b"hello world!");
    assert_eq!(pool.free_chunks(8), 1);

    // A second buffer draws the pooled chunk back out.
    let mut next = Buffer::new(pool.clone());
    next.append_str("0123456789ab");
    assert_eq!(pool.stats().hits, 1);
    assert_eq!(pool.free_chunks(8), 0);
}

// ── Readers ────────────────────────────────────────────────────

#[test]
fn test_one_shot_reader_streams_everything() {
    let pool = ChunkPool::default();
    let mut buf = Buffer::new(pool.clone());
    for i in 0..200 {
        encode_record(&mut buf, i, "streamed");
    }
    let expected = buf.bytes();

    let mut reader = buf.to_one_shot_reader();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, expected);
    assert!(pool.free_bytes() > 0);
}

#[test]
fn test_clone_bytes_identical_regardless_of_progress() {
    let mut buf = Buffer::new(small_pool());
    buf.append_str("the quick brown fox jumps over the lazy dog");
    let mut original = buf.to_recyclable_reader();

    let mut partial = [0u8; 10];
    original.read_exact(&mut partial).unwrap();
    let clone = original.clone();
    assert_eq!(clone.to_bytes(), original.to_bytes());
    assert_eq!(clone.position(), 0);
}

#[test]
fn test_recycle_all_but_one_frees_nothing() {
    let pool = small_pool();
    let mut buf = Buffer::new(pool.clone());
    buf.append_bytes(&[0x5A; 40]);

    let mut readers = vec![buf.to_recyclable_reader()];
    for _ in 0..4 {
        let clone = readers[0].clone();
        readers.push(clone);
    }
    let before = pool.free_bytes();

    let mut last = readers.pop().unwrap();
    for r in &mut readers {
        r.recycle();
    }
    assert_eq!(pool.free_bytes(), before);

    last.recycle();
    // Chunks of 4, 8, 16 and 16 bytes; the 4-byte chunk is never pooled.
    assert_eq!(pool.free_chunks(8), 1);
    assert_eq!(pool.free_chunks(16), 2);
    assert_eq!(pool.stats().pooled, 3);
    assert_eq!(pool.stats().discarded, 1);
}

#[test]
fn test_close_then_recycle() {
    let pool = small_pool();
    let mut buf = Buffer::new(pool.clone());
    buf.append_str("abcdef");
    let mut a = buf.to_recyclable_reader();
    let mut b = a.clone();

    a.close();
    let mut out = [0u8; 2];
    let err = a.read(&mut out).unwrap_err();
    assert!(BufferError::is_reader_closed(&err));
    assert!(matches!(a.write_to(&mut Vec::new()), Err(BufferError::ReaderClosed)));

    // The other clone is unaffected by the close.
    let mut rest = String::new();
    b.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "abcdef");

    a.recycle();
    assert_eq!(pool.free_chunks(8), 0);
    b.recycle();
    assert_eq!(pool.free_chunks(8), 1);
}

#[test]
fn test_clones_reset_scenario() {
    let mut buf = Buffer::new(ChunkPool::default());
    buf.append_str("abcdef");
    let mut a = buf.to_recyclable_reader();
    let mut b = a.clone();

    let mut three = [0u8; 3];
    a.read_exact(&mut three).unwrap();
    assert_eq!(&three, b"abc");

    let mut all = Vec::new();
    b.read_to_end(&mut all).unwrap();
    assert_eq!(all, b"abcdef");

    a.reset();
    let mut again = Vec::new();
    a.read_to_end(&mut again).unwrap();
    assert_eq!(again, b"abcdef");
}

#[test]
fn test_fan_out_across_threads() {
    let pool = ChunkPool::new(PoolConfig::new(16, 32, 256)).unwrap();
    let mut buf = Buffer::new(pool.clone());
    for i in 0..300 {
        encode_record(&mut buf, i, "fan-out");
    }
    let expected = buf.bytes();
    let reader = buf.to_recyclable_reader();

    std::thread::scope(|s| {
        for _ in 0..6 {
            let mut clone = reader.clone();
            let expected = &expected;
            s.spawn(move || {
                let mut sink = Vec::new();
                clone.write_to(&mut sink).unwrap();
                assert_eq!(&sink, expected);
                clone.recycle();
            });
        }
    });

    assert_eq!(reader.share_count(), 1);
    let pooled_before = pool.stats().pooled;
    drop(reader);
    assert!(pool.stats().pooled > pooled_before);
}

#[test]
fn test_pool_reconfigure_between_buffers() {
    let pool = small_pool();
    let mut buf = Buffer::new(pool.clone());
    buf.append_bytes(&[1u8; 30]);
    let held = buf.to_recyclable_reader();

    pool.configure(PoolConfig::new(32, 32, 128)).unwrap();
    // Chunks from the old configuration match no new class.
    drop(held);
    assert_eq!(pool.free_bytes(), 0);

    let mut fresh = Buffer::new(pool.clone());
    fresh.append_byte(1);
    assert_eq!(fresh.chunk_count(), 1);
    fresh.reset();
    assert_eq!(pool.free_chunks(32), 1);
}

#[test]
fn test_reconfigure_pools_in_flight_chunks_of_new_class() {
    let pool = small_pool();
    let mut buf = Buffer::new(pool.clone());
    // Chunks of 4, 8, 16 and 16 bytes.
    buf.append_bytes(&[7u8; 30]);
    let held = buf.to_recyclable_reader();

    pool.configure(PoolConfig::new(16, 16, 64)).unwrap();
    drop(held);
    assert_eq!(pool.free_chunks(16), 2);
    assert_eq!(pool.free_bytes(), 32);
}
