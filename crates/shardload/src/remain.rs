//! RemainHolder and Reassembler (§4.7): stitching chunk-boundary records
//! back together after all Readers have exited.
//!
//! Each Reader writes exactly one `(head, tail)` pair into the
//! [`RemainHolder`] before it joins. Once every Reader has exited, the Job
//! runs [`RemainHolder::reassemble`] on its own thread to emit the
//! records that straddled chunk boundaries, route them, and enqueue them
//! before the end-of-stream sentinel goes out.

use crate::basket::Basket;
use crate::err::ShardLoadError;
use crate::queue::QueueSender;
use crate::record::{field_by_index, parse_key};
use crate::router::ShardRouter;

/// The leading and trailing partial-record fragments one Reader observed
/// at the edges of its chunk.
#[derive(Debug, Clone, Default)]
pub struct Remainder {
    /// Bytes from the start of the chunk up to and including the first
    /// `\n`. Empty only when the chunk itself is empty.
    pub head: Vec<u8>,
    /// Bytes after the last complete record in the chunk, with no
    /// trailing `\n`. Non-empty only when a record straddles into the
    /// next chunk.
    pub tail: Vec<u8>,
}

/// Collects one [`Remainder`] per Reader, indexed by Reader id.
pub struct RemainHolder {
    slots: Vec<Option<Remainder>>,
}

impl RemainHolder {
    /// Creates a holder sized for `readers` Reader ids.
    pub fn new(readers: usize) -> Self {
        RemainHolder {
            slots: vec![None; readers],
        }
    }

    /// Records Reader `i`'s head/tail fragments. Panics if called twice
    /// for the same `i` — each Reader writes its slot exactly once.
    pub fn set(&mut self, i: usize, remainder: Remainder) {
        assert!(self.slots[i].is_none(), "reader {i} already recorded a remainder");
        self.slots[i] = Some(remainder);
    }

    /// Joins adjacent `tail_{i-1} ⧺ head_i` fragments into whole records,
    /// parses each record's partition key, routes it to its shard's
    /// queue, and returns the count of boundary records emitted.
    ///
    /// Fails if any Reader never recorded a remainder, or if the last
    /// Reader's tail is non-empty (the file does not end with a
    /// newline).
    pub fn reassemble(
        &self,
        partition_field: usize,
        router: &dyn ShardRouter,
        senders: &[QueueSender],
    ) -> Result<usize, ShardLoadError> {
        let readers = self.slots.len();
        let mut frontpart: Vec<u8> = Vec::new();
        let mut emitted = 0usize;

        for i in 0..readers {
            let remainder = self.slots[i]
                .as_ref()
                .ok_or_else(|| ShardLoadError::Other(format!("reader {i} never recorded a remainder")))?;

            let record: Vec<u8> = if i == 0 {
                remainder.head.clone()
            } else {
                let mut joined = std::mem::take(&mut frontpart);
                joined.extend_from_slice(&remainder.head);
                joined
            };
            frontpart = remainder.tail.clone();

            if i + 1 == readers && !remainder.tail.is_empty() {
                return Err(ShardLoadError::Boundary { reader: i });
            }

            if record.is_empty() {
                continue;
            }

            let field = field_by_index(i, &record, partition_field)?;
            let key = parse_key(i, field)?;
            let shard = router.route(key);

            let mut basket = Basket::new();
            basket.push_record(&record);
            senders[shard].put(basket);
            emitted += 1;
        }

        Ok(emitted)
    }
}
