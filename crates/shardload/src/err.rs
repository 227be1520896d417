//! Error types for the shardload crate.
//!
//! [`ShardLoadError`] is the single error type threaded through config
//! loading, chunk planning, record parsing, routing, queueing, and sink
//! I/O. Every kind in the error taxonomy (`Config`, `Io`, `Parse`,
//! `Boundary`, `Sink`) is fatal to the Job: there is no variant a caller is
//! expected to retry on, by design (§7 of the design notes).

/// The main error type for the shardload crate.
#[derive(Debug, thiserror::Error)]
pub enum ShardLoadError {
    /// Missing or invalid configuration (file not found, bad YAML, a
    /// cross-field check such as `slicenum == nodes.len()` failing).
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error: file open, positional read, file not found, pipe failure.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error while loading a config file.
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON error (used only for the optional config-dump debug path).
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Path resolution error.
    #[error("{0}")]
    PathAbs(#[from] path_abs::Error),

    /// Buffer too small (no newline found in the first read), unmatched
    /// quote, or empty field where a field was expected.
    #[error("parse error in reader {reader}: {message}")]
    Parse {
        /// Which Reader hit the error.
        reader: usize,
        /// Human-readable description.
        message: String,
    },

    /// Non-integer partition key where an integer was required.
    #[error("{0}")]
    IntConversion(#[from] std::num::ParseIntError),

    /// The final Reader's trailing fragment was non-empty: the file does
    /// not end with a newline.
    #[error("boundary error: file does not end with a newline (reader {reader})")]
    Boundary {
        /// The last Reader, whose tail should have been empty.
        reader: usize,
    },

    /// Connect failure, bulk-load command failure, or a mid-stream
    /// transport error against a shard.
    #[error("sink error on shard {shard}: {message}")]
    Sink {
        /// The shard index that failed.
        shard: usize,
        /// Human-readable description.
        message: String,
    },

    /// Error from the `postgres` crate, wrapped with the shard it affected.
    #[error("postgres error on shard {shard}: {source}")]
    Postgres {
        /// The shard index that failed.
        shard: usize,
        /// Underlying driver error.
        #[source]
        source: postgres::Error,
    },

    /// A worker thread panicked; the panic payload could not be joined
    /// into a more specific error.
    #[error("worker thread panicked: {0}")]
    WorkerPanic(String),

    /// Catch-all for conditions that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl ShardLoadError {
    /// Build a [`ShardLoadError::Parse`] for the given Reader id.
    pub fn parse(reader: usize, message: impl Into<String>) -> Self {
        ShardLoadError::Parse {
            reader,
            message: message.into(),
        }
    }

    /// Build a [`ShardLoadError::Sink`] for the given shard index.
    pub fn sink(shard: usize, message: impl Into<String>) -> Self {
        ShardLoadError::Sink {
            shard,
            message: message.into(),
        }
    }
}
