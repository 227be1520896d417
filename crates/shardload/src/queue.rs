//! DataQueue: the per-shard handoff between Readers and a Drain.
//!
//! The design notes prefer a bounded blocking queue over the original's
//! mutex-guarded `Vec` polled with a fixed sleep (§9: "polling with
//! sleeps ... wastes CPU at low load"). [`DataQueue`] is built on a
//! `crossbeam_channel::bounded` pair: `send` blocks (applying
//! backpressure) once `max_data_queue_sync_size` Baskets are in flight,
//! and `recv` blocks until a Basket — or the end-of-stream sentinel — is
//! available, with no polling in either direction. The sentinel Basket
//! protocol itself is kept (§9: "legacy-compatible... treat as") because
//! testable property 6 requires every Drain to observe exactly one
//! sentinel.

use crossbeam::channel::{self, Receiver, Sender as ChannelSender};

use crate::basket::Basket;

/// The sending half of a shard's DataQueue, held by every Reader.
#[derive(Clone)]
pub struct QueueSender {
    inner: ChannelSender<Basket>,
}

impl QueueSender {
    /// Enqueues `basket`, blocking if the queue is at its high-watermark.
    /// Blocks forever only if the paired [`QueueReceiver`] has been
    /// dropped without consuming — which indicates a Drain died, a fatal
    /// condition the Job detects via the worker join, not via this call.
    pub fn put(&self, basket: Basket) {
        // A closed receiver means the Drain exited (fatally); dropping
        // the basket here is correct since the Job is already unwinding.
        let _ = self.inner.send(basket);
    }
}

/// The receiving half of a shard's DataQueue, held by exactly one Drain.
pub struct QueueReceiver {
    inner: Receiver<Basket>,
}

impl QueueReceiver {
    /// Blocks until the next Basket is available. Returns `None` only if
    /// every `QueueSender` was dropped without ever sending the sentinel
    /// — which should not happen in a well-formed Job and is treated by
    /// the Drain as an unexpected end-of-stream.
    pub fn take(&self) -> Option<Basket> {
        self.inner.recv().ok()
    }
}

/// Creates a shard's DataQueue: a bounded channel with room for
/// `high_watermark` Baskets before `put` blocks.
pub fn data_queue(high_watermark: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = channel::bounded(high_watermark.max(1));
    (QueueSender { inner: tx }, QueueReceiver { inner: rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_baskets_in_fifo_order() {
        let (tx, rx) = data_queue(4);
        let mut a = Basket::new();
        a.push_record(b"1,a\n");
        let mut b = Basket::new();
        b.push_record(b"2,b\n");
        tx.put(a);
        tx.put(b);

        let first = rx.take().unwrap();
        assert_eq!(first.as_bytes(), b"1,a\n");
        let second = rx.take().unwrap();
        assert_eq!(second.as_bytes(), b"2,b\n");
    }

    #[test]
    fn sentinel_is_observed_exactly_once() {
        let (tx, rx) = data_queue(4);
        tx.put(Basket::new());
        tx.put(Basket::sentinel());

        assert!(!rx.take().unwrap().is_last());
        let last = rx.take().unwrap();
        assert!(last.is_last());
    }

    #[test]
    fn put_blocks_past_high_watermark_and_drains_do_catch_up() {
        let (tx, rx) = data_queue(1);
        tx.put(Basket::new());
        let tx2 = tx.clone();
        let handle = std::thread::spawn(move || tx2.put(Basket::sentinel()));
        // The second put blocks until we take the first basket.
        let first = rx.take().unwrap();
        assert!(!first.is_last());
        handle.join().unwrap();
        let second = rx.take().unwrap();
        assert!(second.is_last());
    }
}
