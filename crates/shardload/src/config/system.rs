//! The optional system configuration file (§6): internal tunables that
//! override the primary config's defaults. Most jobs don't need one.

use std::path::Path;

use serde::Deserialize;

use crate::err::ShardLoadError;

const DEFAULT_BASKET_TUPLE_SIZE_MIB: usize = 4;
const DEFAULT_MAX_DATA_QUEUE_SYNC_SIZE: usize = 32;

/// Raw shape of the system config file; every field is optional so a
/// partial override is valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemConfig {
    /// MiB; overrides the primary config's `buffersize` when present.
    pub io_read_size: Option<usize>,
    /// MiB; the Basket seal threshold.
    pub basket_tuple_size: Option<usize>,
    /// DataQueue high-watermark, in Baskets.
    pub max_data_queue_sync_size: Option<usize>,
}

impl SystemConfig {
    /// Loads a system config file, or returns the all-defaults value if
    /// `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ShardLoadError> {
        match path {
            None => Ok(SystemConfig::default()),
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                Ok(serde_yaml::from_str(&raw)?)
            }
        }
    }

    /// The I/O read size in bytes, falling back to `buffersize` (from
    /// the primary config, in MiB) when unset.
    pub fn io_read_size_bytes(&self, primary_buffersize_mib: usize) -> usize {
        mib(self.io_read_size.unwrap_or(primary_buffersize_mib))
    }

    /// The Basket seal threshold in bytes.
    pub fn basket_tuple_size_bytes(&self) -> usize {
        mib(self.basket_tuple_size.unwrap_or(DEFAULT_BASKET_TUPLE_SIZE_MIB))
    }

    /// The DataQueue high-watermark in Baskets.
    pub fn max_data_queue_sync_size(&self) -> usize {
        self.max_data_queue_sync_size.unwrap_or(DEFAULT_MAX_DATA_QUEUE_SYNC_SIZE)
    }
}

fn mib(n: usize) -> usize {
    n * 1024 * 1024
}
