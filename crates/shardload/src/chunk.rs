//! Chunk planning: dividing an input file into disjoint byte ranges.
//!
//! [`plan_chunks`] is the Chunk Planner (§4.1): given a file size and a
//! reader count, it computes `R` contiguous `[offset, offset+length)`
//! ranges that partition `[0, F)` exactly, with no gaps or overlaps. The
//! planner never looks at file content — record boundaries inside a chunk
//! are reconciled later by the Reader and the Reassembler.

use crate::err::ShardLoadError;

/// A disjoint byte range of the input file, read by exactly one Reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Reader id, `0..readers`.
    pub id: usize,
    /// Byte offset of the first byte in this chunk.
    pub offset: u64,
    /// Number of bytes in this chunk. May be shorter than `chunk` for the
    /// last chunk.
    pub length: u64,
}

impl Chunk {
    /// Exclusive end offset of this chunk.
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Computes the chunk plan for a file of `file_size` bytes split across
/// `readers` Readers.
///
/// `chunk = ceil(file_size / readers)`; chunk `i` has `offset = i * chunk`
/// and `length = min(chunk, file_size - i * chunk)`. The last chunk may be
/// shorter. An empty file (`file_size == 0`) yields no chunks.
///
/// # Example
///
/// ```
/// # use shardload::chunk::plan_chunks;
/// let chunks = plan_chunks(12, 3).unwrap();
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[0].offset, 0);
/// assert_eq!(chunks[2].end(), 12);
/// ```
pub fn plan_chunks(file_size: u64, readers: usize) -> Result<Vec<Chunk>, ShardLoadError> {
    if readers == 0 {
        return Err(ShardLoadError::Config(
            "readers must be at least 1".to_string(),
        ));
    }
    if file_size == 0 {
        return Ok(Vec::new());
    }

    let chunk = file_size.div_ceil(readers as u64);
    let mut chunks = Vec::with_capacity(readers);

    for i in 0..readers {
        let offset = i as u64 * chunk;
        if offset >= file_size {
            break;
        }
        let length = chunk.min(file_size - offset);
        chunks.push(Chunk {
            id: i,
            offset,
            length,
        });
    }

    Ok(chunks)
}
