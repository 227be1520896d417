//! Job orchestration (§2, §4.7, §4.8): wires the Chunk plan, Readers,
//! DataQueues, Drains, Senders, and the Reassembler into one run of a
//! single table against its shards.
//!
//! Cyclic back-references are avoided by design (§9): Readers only ever
//! receive a `Vec<QueueSender>` to push onto, and Senders only ever
//! receive their pipe's read end — nothing holds a reference back to the
//! Job itself.

use std::fs::File;
use std::sync::Arc;

use crate::chunk::plan_chunks;
use crate::config::{PrimaryConfig, SystemConfig, TableSpec};
use crate::drain;
use crate::err::ShardLoadError;
use crate::pipe::pipe;
use crate::progress::ProgressCallback;
use crate::queue::data_queue;
use crate::reader::{self, ReaderConfig};
use crate::remain::RemainHolder;
use crate::router::ShardRouter;
use crate::sender;
use crate::sink::{copy_command, BulkSink};

/// The immutable context shared by every worker in a Job, replacing the
/// original's process-wide mutable globals (§9).
pub struct JobContext {
    pub table: TableSpec,
    pub schema: String,
    pub csv_header: bool,
    pub encoding: Option<String>,
    pub readers: usize,
    pub shards: usize,
    pub io_read_size: usize,
    pub basket_tuple_size: usize,
    pub high_watermark: usize,
    /// Per-reader record cap (`maxtuplechunk / readers`); `0` means
    /// unlimited.
    pub max_tuple_chunk: u64,
}

impl JobContext {
    pub fn from_configs(primary: &PrimaryConfig, system: &SystemConfig, table: TableSpec) -> Self {
        JobContext {
            table,
            schema: primary.schema.clone(),
            csv_header: primary.csvheader,
            encoding: primary.encoding.clone(),
            readers: primary.readers,
            shards: primary.slicenum,
            io_read_size: system.io_read_size_bytes(primary.buffersize),
            basket_tuple_size: system.basket_tuple_size_bytes(),
            high_watermark: system.max_data_queue_sync_size(),
            max_tuple_chunk: primary.maxtuplechunk / primary.readers as u64,
        }
    }
}

/// Runs one Job: loads `ctx.table.datapath` and streams it into `sinks`
/// (one per shard, in shard-index order), returning the total row count
/// the sinks reported.
///
/// `router` is shared across every Reader thread and the Reassembler, so
/// it must be `Send + Sync + 'static` — an `Arc<dyn ShardRouter>` for a
/// boxed strategy, or any concrete router wrapped the same way.
pub fn run<S>(
    ctx: &JobContext,
    router: Arc<dyn ShardRouter>,
    sinks: Vec<S>,
    progress: Arc<dyn ProgressCallback>,
) -> Result<u64, ShardLoadError>
where
    S: BulkSink + Send + Sync + 'static,
    S::Session: Send,
{
    if sinks.len() != ctx.shards {
        return Err(ShardLoadError::Config(format!(
            "expected {} sinks, got {}",
            ctx.shards,
            sinks.len()
        )));
    }
    if router.shard_count() != ctx.shards {
        return Err(ShardLoadError::Config(format!(
            "router covers {} shards, job has {}",
            router.shard_count(),
            ctx.shards
        )));
    }

    progress.job_started(&ctx.table.tablename);

    let file = Arc::new(File::open(&ctx.table.datapath)?);
    let file_size = file.metadata()?.len();
    let chunks = plan_chunks(file_size, ctx.readers)?;

    let mut queue_senders = Vec::with_capacity(ctx.shards);
    let mut queue_receivers = Vec::with_capacity(ctx.shards);
    for _ in 0..ctx.shards {
        let (tx, rx) = data_queue(ctx.high_watermark);
        queue_senders.push(tx);
        queue_receivers.push(Some(rx));
    }

    let command = copy_command(
        &ctx.schema,
        &ctx.table.tablename,
        &ctx.table.column_list(),
        ctx.csv_header,
        ctx.encoding.as_deref(),
    );

    // Spawn Drains and Senders first so they're ready to consume as soon
    // as Readers start producing.
    let mut drain_handles = Vec::with_capacity(ctx.shards);
    let mut sender_handles = Vec::with_capacity(ctx.shards);

    for (shard, sink) in sinks.into_iter().enumerate() {
        let (pipe_w, pipe_r) = pipe();
        let receiver = queue_receivers[shard].take().unwrap();

        let drain_handle = std::thread::Builder::new()
            .name(format!("shardload-drain-{shard}"))
            .spawn(move || drain::run(shard, &receiver, pipe_w))
            .map_err(|e| ShardLoadError::Other(e.to_string()))?;
        drain_handles.push(drain_handle);

        let command_owned = command.clone();
        let sender_handle = std::thread::Builder::new()
            .name(format!("shardload-sender-{shard}"))
            .spawn(move || sender::run(shard, &sink, &command_owned, pipe_r))
            .map_err(|e| ShardLoadError::Other(e.to_string()))?;
        sender_handles.push(sender_handle);
    }

    // Spawn Readers, each with its own chunk, a clone of the queue
    // senders (cheap: crossbeam channel handles are `Clone`), and a
    // shared file handle and router.
    let mut reader_handles = Vec::with_capacity(chunks.len());
    for chunk in chunks.iter().copied() {
        let file = Arc::clone(&file);
        let router = Arc::clone(&router);
        let progress = Arc::clone(&progress);
        let senders_for_reader = queue_senders.clone();
        let reader_cfg = ReaderConfig {
            io_read_size: ctx.io_read_size,
            basket_tuple_size: ctx.basket_tuple_size,
            partition_field: ctx.table.partition_field,
            max_tuple_chunk: ctx.max_tuple_chunk,
        };

        let handle = std::thread::Builder::new()
            .name(format!("shardload-reader-{}", chunk.id))
            .spawn(move || {
                reader::run(
                    chunk.id,
                    &chunk,
                    &file,
                    &reader_cfg,
                    router.as_ref(),
                    &senders_for_reader,
                    progress.as_ref(),
                )
            })
            .map_err(|e| ShardLoadError::Other(e.to_string()))?;
        reader_handles.push(handle);
    }

    // Join Readers, collecting each one's boundary remainder. The first
    // fatal error from any Reader is propagated; this still joins the
    // rest so their threads don't outlive the Job.
    let mut remain_holder = RemainHolder::new(chunks.len());
    let mut first_error: Option<ShardLoadError> = None;
    for (i, handle) in reader_handles.into_iter().enumerate() {
        match join(handle) {
            Ok(remainder) => remain_holder.set(i, remainder),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    // Reassembler (§4.7): runs on this thread, after every Reader has
    // joined and before the end-of-stream sentinels go out. A fatal error
    // here (e.g. a missing trailing newline) is propagated without
    // posting sentinels; per §7 this collapses the whole process, which
    // is what actually reclaims the now-blocked Drain/Sender threads.
    remain_holder.reassemble(ctx.table.partition_field, router.as_ref(), &queue_senders)?;

    // End-of-stream protocol (§4.8): one sentinel Basket per shard.
    for tx in &queue_senders {
        tx.put(crate::basket::Basket::sentinel());
    }

    for handle in drain_handles {
        join(handle)?;
    }

    let mut total_rows = 0u64;
    for handle in sender_handles {
        total_rows += join(handle)?;
    }

    Ok(total_rows)
}

fn join<T>(handle: std::thread::JoinHandle<Result<T, ShardLoadError>>) -> Result<T, ShardLoadError> {
    match handle.join() {
        Ok(result) => result,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "worker thread panicked with a non-string payload".to_string());
            Err(ShardLoadError::WorkerPanic(message))
        }
    }
}
