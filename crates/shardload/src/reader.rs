//! The Reader worker (§4.2): drains one Chunk of the input file, finds
//! record boundaries, routes each complete record to its shard's
//! Basket, and records the leading/trailing partial-record fragments for
//! the Reassembler.

use std::fs::File;
use std::os::unix::fs::FileExt;

use crate::basket::Basket;
use crate::chunk::Chunk;
use crate::err::ShardLoadError;
use crate::progress::ProgressCallback;
use crate::queue::QueueSender;
use crate::record::{field_by_index, parse_key};
use crate::remain::Remainder;
use crate::router::ShardRouter;

/// Tunables a Reader needs beyond its Chunk: the read-buffer size, the
/// Basket seal threshold, and the 1-based partition column index.
#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    pub io_read_size: usize,
    pub basket_tuple_size: usize,
    pub partition_field: usize,
    /// Per-reader record cap; `0` means unlimited.
    pub max_tuple_chunk: u64,
}

/// Runs Reader `id` over `chunk`, appending routed records to `senders`
/// (one [`QueueSender`] per shard) and returning the `(head, tail)`
/// fragments for the Reassembler.
pub fn run(
    id: usize,
    chunk: &Chunk,
    file: &File,
    cfg: &ReaderConfig,
    router: &dyn ShardRouter,
    senders: &[QueueSender],
    progress: &dyn ProgressCallback,
) -> Result<Remainder, ShardLoadError> {
    if chunk.length == 0 {
        return Ok(Remainder::default());
    }

    let mut baskets: Vec<Basket> = (0..senders.len()).map(|_| Basket::new()).collect();
    let end = chunk.end();

    // cap every read, including the first, at the chunk's own boundary so
    // reads never stray into the next Reader's territory.
    let first_want = ((end - chunk.offset) as usize).min(cfg.io_read_size);
    let mut buffer = vec![0u8; first_want];
    let first_read = read_at_most(file, chunk.offset, &mut buffer)?;
    progress.inc(first_read as u64);

    let mut carry: Vec<u8> = buffer[..first_read].to_vec();
    let mut cursor = chunk.offset + first_read as u64;

    let first_newline = memchr(b'\n', &carry).ok_or_else(|| {
        ShardLoadError::parse(
            id,
            "no newline found in first buffer read; buffersize is too small for the longest record",
        )
    })?;
    let head = carry[..=first_newline].to_vec();
    let mut start = first_newline + 1;
    let mut routed = 0u64;
    let mut capped = false;

    loop {
        while let Some(rel) = memchr(b'\n', &carry[start..]) {
            if cfg.max_tuple_chunk != 0 && routed >= cfg.max_tuple_chunk {
                capped = true;
                break;
            }
            let line_end = start + rel + 1;
            let record = &carry[start..line_end];
            route_record(id, record, cfg.partition_field, router, &mut baskets)?;
            maybe_seal(&mut baskets, cfg.basket_tuple_size, senders);
            start = line_end;
            routed += 1;
        }
        carry.drain(..start);
        start = 0;

        if capped || cursor >= end {
            break;
        }
        let want = ((end - cursor) as usize).min(cfg.io_read_size);
        let mut slab = vec![0u8; want];
        let n = read_at_most(file, cursor, &mut slab)?;
        progress.inc(n as u64);
        if n == 0 {
            break;
        }
        cursor += n as u64;
        carry.extend_from_slice(&slab[..n]);
    }

    let tail = carry;

    for (shard, basket) in baskets.into_iter().enumerate() {
        if !basket.is_empty() {
            senders[shard].put(basket);
        }
    }

    Ok(Remainder { head, tail })
}

fn route_record(
    reader: usize,
    record: &[u8],
    partition_field: usize,
    router: &dyn ShardRouter,
    baskets: &mut [Basket],
) -> Result<(), ShardLoadError> {
    let field = field_by_index(reader, record, partition_field)?;
    let key = parse_key(reader, field)?;
    let shard = router.route(key);
    baskets[shard].push_record(record);
    Ok(())
}

fn maybe_seal(baskets: &mut [Basket], threshold: usize, senders: &[QueueSender]) {
    for (shard, basket) in baskets.iter_mut().enumerate() {
        if basket.len() >= threshold {
            let sealed = std::mem::take(basket);
            senders[shard].put(sealed);
        }
    }
}

fn read_at_most(file: &File, offset: u64, buf: &mut [u8]) -> Result<usize, ShardLoadError> {
    let mut total = 0usize;
    loop {
        match file.read_at(&mut buf[total..], offset + total as u64) {
            Ok(0) => break,
            Ok(n) => {
                total += n;
                if total == buf.len() {
                    break;
                }
            }
            Err(e) => return Err(ShardLoadError::Io(e)),
        }
    }
    Ok(total)
}

fn memchr(needle: u8, haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}
