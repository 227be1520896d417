//! Progress reporting trait for job feedback.
//!
//! The [`ProgressCallback`] trait lets callers receive progress updates as
//! Readers ingest bytes, without coupling the library to any specific
//! progress bar implementation. The CLI crate provides an `indicatif`-based
//! implementation; the Job itself only logs at INFO (§7: "Progress lines at
//! INFO").
///
/// Implement this trait to display a progress bar, log progress, or perform
/// any other action when a Reader makes forward progress through its chunk.
///
/// # Example
///
/// ```
/// use shardload::ProgressCallback;
///
/// struct LogProgress;
///
/// impl ProgressCallback for LogProgress {
///     fn inc(&self, n: u64) {
///         println!("Ingested {n} more bytes");
///     }
///     fn job_started(&self, table: &str) {
///         println!("Loading table: {table}");
///     }
/// }
/// ```
pub trait ProgressCallback: Send + Sync {
    /// Called to report that `n` additional bytes have been read from the
    /// input file by some Reader.
    fn inc(&self, n: u64);

    /// Called once when a Job begins processing the named table.
    fn job_started(&self, table: &str);
}

/// A [`ProgressCallback`] that does nothing, for callers (and tests) that
/// don't want progress output.
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn inc(&self, _n: u64) {}
    fn job_started(&self, _table: &str) {}
}
