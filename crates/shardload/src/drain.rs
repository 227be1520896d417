//! The Drain worker (§4.4, §4.8): copies Baskets from one shard's
//! DataQueue into that shard's Sender-bound pipe, in fixed-size blocks,
//! until it observes the end-of-stream sentinel.

use std::io::Write;

use crate::basket::Basket;
use crate::err::ShardLoadError;
use crate::pipe::PipeWriter;
use crate::queue::QueueReceiver;

/// Size of the blocks a Drain copies a Basket's bytes into the pipe in.
const COPY_BLOCK: usize = 2 * 1024;

/// Runs the Drain for one shard: pulls Baskets off `queue` and writes
/// their bytes to `pipe` until the sentinel Basket closes the pipe.
pub fn run(shard: usize, queue: &QueueReceiver, mut pipe: PipeWriter) -> Result<(), ShardLoadError> {
    loop {
        let basket = queue.take().ok_or_else(|| {
            ShardLoadError::sink(shard, "data queue closed before the end-of-stream sentinel")
        })?;

        write_basket(shard, &basket, &mut pipe)?;

        if basket.is_last() {
            break;
        }
    }
    // Dropping `pipe` here closes the write end, which is how the
    // Sender's copy_from observes EOF.
    Ok(())
}

fn write_basket(shard: usize, basket: &Basket, pipe: &mut PipeWriter) -> Result<(), ShardLoadError> {
    let bytes = basket.as_bytes();
    for block in bytes.chunks(COPY_BLOCK) {
        pipe.write_all(block)
            .map_err(|e| ShardLoadError::sink(shard, e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::data_queue;
    use std::io::Read;

    #[test]
    fn copies_baskets_and_closes_pipe_on_sentinel() {
        let (tx, rx) = data_queue(4);
        let (pipe_w, mut pipe_r) = crate::pipe::pipe();

        let mut a = Basket::new();
        a.push_record(b"1,a\n");
        tx.put(a);
        tx.put(Basket::sentinel());

        let handle = std::thread::spawn(move || run(0, &rx, pipe_w));

        let mut out = Vec::new();
        pipe_r.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"1,a\n");

        handle.join().unwrap().unwrap();
    }

    #[test]
    fn block_splitting_preserves_byte_order() {
        let big = vec![b'x'; COPY_BLOCK * 3 + 7];
        let (tx, rx) = data_queue(4);
        let (pipe_w, mut pipe_r) = crate::pipe::pipe();

        let mut basket = Basket::new();
        basket.push_record(&big);
        tx.put(basket);
        tx.put(Basket::sentinel());

        let handle = std::thread::spawn(move || run(0, &rx, pipe_w));
        let mut out = Vec::new();
        pipe_r.read_to_end(&mut out).unwrap();
        assert_eq!(out.len(), big.len());
        handle.join().unwrap().unwrap();
    }
}
