//! The primary YAML configuration file (§6): shard credentials, the
//! reader/shard topology, logging, and the tables to load.

use std::path::Path;

use path_abs::{PathAbs, PathInfo};
use serde::Deserialize;

use crate::config::shard::NodeSpec;
use crate::config::table::TableSpec;
use crate::err::ShardLoadError;

/// Top-level shape of the primary config file.
#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryConfig {
    pub dbname: String,
    pub schema: String,
    pub user: String,
    pub password: String,

    /// `R`, the Reader count.
    pub readers: usize,
    /// `S`, the shard count; must equal `nodes.len()`.
    pub slicenum: usize,
    /// Per-Reader I/O buffer size, MiB.
    pub buffersize: usize,
    /// Optional per-job record cap; `0` means unlimited.
    #[serde(default)]
    pub maxtuplechunk: u64,
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
    /// Optional sink-side encoding string (e.g. `"UTF8"`).
    #[serde(default)]
    pub encoding: Option<String>,
    /// Whether the bulk-load command appends `HEADER`.
    #[serde(default)]
    pub csvheader: bool,

    /// Hash-router strategy: `"modulo"` or `"rangebound"`.
    #[serde(default = "default_router_policy")]
    pub routerpolicy: String,
    /// Explicit `[lo, hi)` shard bounds for the `"rangebound"` policy, one
    /// per shard in shard-index order. Ignored by `"modulo"`; when absent
    /// under `"rangebound"` the key space is split evenly.
    #[serde(default)]
    pub routerbounds: Option<Vec<(i64, i64)>>,

    pub nodes: Vec<NodeSpec>,
    pub tables: Vec<TableSpec>,
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_router_policy() -> String {
    "modulo".to_string()
}

impl PrimaryConfig {
    /// Loads and validates a primary config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ShardLoadError> {
        let abs = PathAbs::new(path)?;
        if !abs.exists() {
            return Err(ShardLoadError::Config(format!(
                "config file {} does not exist",
                abs.as_path().display()
            )));
        }
        let raw = std::fs::read_to_string(abs.as_path())?;
        let cfg: PrimaryConfig = serde_yaml::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks constraints that span multiple fields.
    fn validate(&self) -> Result<(), ShardLoadError> {
        if self.readers == 0 {
            return Err(ShardLoadError::Config("readers must be at least 1".to_string()));
        }
        if self.slicenum != self.nodes.len() {
            return Err(ShardLoadError::Config(format!(
                "slicenum ({}) must equal the number of nodes ({})",
                self.slicenum,
                self.nodes.len()
            )));
        }
        if self.slicenum == 0 {
            return Err(ShardLoadError::Config("slicenum must be at least 1".to_string()));
        }
        if self.buffersize == 0 {
            return Err(ShardLoadError::Config("buffersize must be at least 1 MiB".to_string()));
        }
        if !matches!(self.loglevel.as_str(), "debug" | "info" | "warning" | "error") {
            return Err(ShardLoadError::Config(format!(
                "loglevel {} must be one of debug|info|warning|error",
                self.loglevel
            )));
        }
        if self.tables.is_empty() {
            return Err(ShardLoadError::Config("tables must name at least one table".to_string()));
        }
        if !matches!(self.routerpolicy.as_str(), "modulo" | "rangebound") {
            return Err(ShardLoadError::Config(format!(
                "routerpolicy {} must be one of modulo|rangebound",
                self.routerpolicy
            )));
        }
        if let Some(bounds) = &self.routerbounds {
            if bounds.len() != self.slicenum {
                return Err(ShardLoadError::Config(format!(
                    "routerbounds has {} entries but slicenum is {}",
                    bounds.len(),
                    self.slicenum
                )));
            }
        }
        for table in &self.tables {
            table.validate()?;
        }
        Ok(())
    }

    /// Per-shard `postgres`-crate connection strings, in shard-index
    /// order.
    pub fn conn_strings(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|n| n.conn_string(&self.dbname, &self.user, &self.password))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml(tmp_datapath: &str) -> String {
        format!(
            r#"
dbname: bench
schema: public
user: loader
password: secret
readers: 2
slicenum: 2
buffersize: 4
loglevel: info
csvheader: true
nodes:
  - host: shard-a
    port: 5432
  - host: shard-b
    port: 5432
tables:
  - tablename: orders
    columns: "id, amount"
    datapath: "{tmp_datapath}"
    partitionField: 1
"#
        )
    }

    #[test]
    fn parses_and_validates_a_well_formed_config() {
        let data_file = tempfile::NamedTempFile::new().unwrap();
        let path_str = data_file.path().to_str().unwrap();
        let cfg: PrimaryConfig = serde_yaml::from_str(&sample_yaml(path_str)).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.conn_strings().len(), 2);
    }

    #[test]
    fn rejects_slicenum_mismatch_with_node_count() {
        let data_file = tempfile::NamedTempFile::new().unwrap();
        let path_str = data_file.path().to_str().unwrap();
        let mut yaml = sample_yaml(path_str);
        yaml = yaml.replacen("slicenum: 2", "slicenum: 3", 1);
        let cfg: PrimaryConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(cfg.validate().is_err());
    }
}
