//! Parallel, hash-sharded streaming CSV bulk loader.
//!
//! For one configured table, a [`job::run`] call divides the input file
//! into `R` byte ranges (the [`chunk`] planner), drains each range with a
//! Reader that extracts a partition-key field (the [`record`] parser),
//! routes it to a shard (the [`router`]), and appends it to that shard's
//! [`basket::Basket`]. Sealed Baskets flow through a per-shard
//! [`queue::DataQueue`] to a [`drain`] worker, which streams them through
//! a [`pipe`] to a [`sender`] worker holding a persistent bulk-load
//! session (the [`sink`] trait) against that shard. After every Reader
//! exits, the [`remain`] module's Reassembler joins the chunk-boundary
//! fragments it left behind into whole records and routes those too,
//! before the Job posts one end-of-stream sentinel per shard.
//!
//! ```text
//! File → (R Readers) → Basket[shard] → DataQueue[shard] → Drain[shard]
//!      → pipe → Sender[shard] → bulk sink
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use shardload::config::{PrimaryConfig, SystemConfig};
//! use shardload::job::{self, JobContext};
//! use shardload::progress::NoopProgress;
//! use shardload::router::{Modulo, ShardRouter};
//! use shardload::sink::PostgresSink;
//!
//! # fn main() -> Result<(), shardload::err::ShardLoadError> {
//! let primary = PrimaryConfig::load(Path::new("config.yaml"))?;
//! let system = SystemConfig::load(None)?;
//!
//! for table in primary.tables.clone() {
//!     let ctx = JobContext::from_configs(&primary, &system, table);
//!     let router: Arc<dyn ShardRouter> = Arc::new(Modulo::new(primary.slicenum)?);
//!     let sinks: Vec<PostgresSink> = primary
//!         .conn_strings()
//!         .into_iter()
//!         .enumerate()
//!         .map(|(i, c)| PostgresSink::new(i, c))
//!         .collect();
//!     job::run(&ctx, router, sinks, Arc::new(NoopProgress))?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod basket;
pub mod chunk;
pub mod config;
pub mod drain;
pub mod err;
pub mod job;
pub mod maint;
pub mod pipe;
pub mod progress;
pub mod queue;
pub mod reader;
pub mod record;
pub mod remain;
pub mod router;
pub mod sender;
pub mod sink;

pub use err::ShardLoadError;
pub use progress::ProgressCallback;
