//! An in-process pipe connecting a Drain (writer) to a Sender (reader).
//!
//! The Drain copies Basket bytes into [`PipeWriter`] in fixed-size
//! blocks; the Sender's `BulkSinkSession::copy_from` reads from
//! [`PipeReader`] until EOF. Built on a bounded `crossbeam_channel` of
//! byte blocks rather than `std::io::pipe`, so it composes with the
//! same backpressure model as [`crate::queue::DataQueue`]: a full pipe
//! blocks the Drain's write, which is the "natural flow control from the
//! Sender" the design calls for (§5).

use std::io::{self, Read, Write};

use crossbeam::channel::{self, Receiver, Sender as ChannelSender};

/// Number of in-flight blocks the pipe buffers before a write blocks.
const PIPE_DEPTH: usize = 8;

/// The write end of a Drain→Sender pipe.
pub struct PipeWriter {
    inner: ChannelSender<Vec<u8>>,
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .send(buf.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader dropped"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The read end of a Drain→Sender pipe.
pub struct PipeReader {
    inner: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.pending.len() {
            match self.inner.recv() {
                Ok(block) => {
                    self.pending = block;
                    self.pos = 0;
                }
                Err(_) => return Ok(0), // writer closed: clean EOF
            }
        }
        let n = (self.pending.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Creates a linked `(writer, reader)` pair. Dropping the writer closes
/// the pipe, which the reader observes as EOF once buffered blocks are
/// drained — this is how the Drain signals end-of-stream (§4.8).
pub fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = channel::bounded(PIPE_DEPTH);
    (
        PipeWriter { inner: tx },
        PipeReader {
            inner: rx,
            pending: Vec::new(),
            pos: 0,
        },
    )
}
