//! A single destination node (§3's ShardSpec, minus credentials which
//! live on the primary [`super::PrimaryConfig`]).

use serde::Deserialize;

/// One entry of the primary config's `nodes` list: shard `i` binds to
/// `nodes[i]`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    pub host: String,
    pub port: u16,
}

impl NodeSpec {
    /// Builds a `postgres`-crate connection string for this node, given
    /// the shared credentials and database name from the primary config.
    pub fn conn_string(&self, dbname: &str, user: &str, password: &str) -> String {
        format!(
            "host={} port={} user={} password={} dbname={} sslmode=disable",
            self.host, self.port, user, password, dbname
        )
    }
}
