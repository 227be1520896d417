//! The Sender worker (§4.6): holds one bulk-load session against one
//! shard for the lifetime of the Job, streaming bytes from its Drain's
//! pipe.
//!
//! The original blocks inside the copy call until EOF, then waits on a
//! one-shot shutdown channel before closing. With a pipe whose writer
//! (the Drain) already closes on the sentinel Basket, `copy_from`
//! returning is itself end-of-stream — there is nothing further to wait
//! on, so the shutdown tick collapses into simply closing the session
//! after the copy call returns.

use crate::err::ShardLoadError;
use crate::pipe::PipeReader;
use crate::sink::{BulkSink, BulkSinkSession};

/// Runs the Sender for shard `shard`: opens one session against `sink`,
/// streams `pipe` to EOF as the body of `command`, then closes the
/// session. Returns the row count the sink reports.
///
/// Any sink error here is fatal to the Job (§7); the caller does not
/// retry.
pub fn run<S: BulkSink>(
    shard: usize,
    sink: &S,
    command: &str,
    pipe: PipeReader,
) -> Result<u64, ShardLoadError> {
    let mut session = sink.open()?;
    let rows = session.copy_from(command, pipe)?;
    session.close()?;
    log::info!("sender[{shard}] copied {rows} rows");
    Ok(rows)
}
