//! CLI argument types for the shardload binary.

use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// 🐘 Parallel, hash-sharded streaming CSV bulk loader
#[derive(Parser, Debug)]
#[command(version)]
#[command(propagate_version = true)]
pub struct ShardLoadCli {
    /// Path to the primary YAML config file
    #[arg(value_hint = ValueHint::FilePath, value_parser)]
    pub config_path: Option<PathBuf>,
    /// Suppress the interactive confirmation prompt and progress output
    #[arg(action, short = 'q', long)]
    pub quiet: bool,
    /// Path to the optional system config file
    #[arg(long, value_hint = ValueHint::FilePath, value_parser)]
    pub system_config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<ShardLoadCliCommands>,
}

/// CLI subcommands for shardload. Loading a table is the bare (no
/// subcommand) invocation: `shardload <config_path> [-q]`.
#[derive(Debug, Subcommand)]
pub enum ShardLoadCliCommands {
    /// Print the DELETE + VACUUM statements a cleanup run would issue, without executing them
    DeletePlan {
        /// Schema prefix shared by every slice schema (e.g. "public" for "public_0", "public_1", ...)
        #[arg(long)]
        schema: String,
        /// Table name to clear in every slice
        #[arg(long)]
        table: String,
        /// Number of slice schemas
        #[arg(long)]
        slices: usize,
    },
    /// Print the per-slice rewrite of a query that targets the unsharded table, without executing it
    FanoutQuery {
        /// Schema prefix shared by every slice schema
        #[arg(long)]
        schema: String,
        /// Number of slice schemas
        #[arg(long)]
        slices: usize,
        /// The query to rewrite, e.g. "select * from orders where id = 1"
        query: String,
    },
}
