//! CLI dispatch logic for the shardload binary.

use std::sync::Arc;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use shardload::config::{PrimaryConfig, SystemConfig};
use shardload::job::{self, JobContext};
use shardload::maint;
use shardload::router::{self, ShardRouter};
use shardload::sink::PostgresSink;
use shardload::{ProgressCallback, ShardLoadError};

use crate::cli::{ShardLoadCli, ShardLoadCliCommands};

/// [`ProgressCallback`] implementation backed by an `indicatif::ProgressBar`.
struct IndicatifProgress {
    pb: ProgressBar,
}

impl ProgressCallback for IndicatifProgress {
    fn inc(&self, n: u64) {
        self.pb.inc(n);
    }

    fn job_started(&self, table: &str) {
        if let Ok(style) =
            ProgressStyle::default_spinner().template("[{spinner:.green} {elapsed_precise}] {msg}")
        {
            self.pb.set_style(style);
        }
        self.pb.set_message(format!("Loading table: {table}"));
        self.pb.enable_steady_tick(std::time::Duration::from_millis(120));
    }
}

/// Builds the progress callback for a load run: a real spinner unless
/// `quiet` is set.
fn create_progress(quiet: bool) -> Arc<dyn ProgressCallback> {
    if quiet {
        return Arc::new(shardload::progress::NoopProgress);
    }
    let pb = ProgressBar::new_spinner();
    Arc::new(IndicatifProgress { pb })
}

/// Executes the CLI command specified by the parsed [`ShardLoadCli`] arguments.
pub fn run(args: ShardLoadCli) -> Result<(), ShardLoadError> {
    env_logger::init();

    match args.command {
        None => {
            let config_path = args.config_path.ok_or_else(|| {
                ShardLoadError::Config("a config file path is required".to_string())
            })?;
            load(&config_path, args.system_config.as_deref(), args.quiet)
        }
        Some(ShardLoadCliCommands::DeletePlan { schema, table, slices }) => {
            for stmt in maint::delete_plan(&schema, &table, slices) {
                println!("{stmt};");
            }
            println!("{};", maint::vacuum_statement());
            Ok(())
        }
        Some(ShardLoadCliCommands::FanoutQuery { schema, slices, query }) => {
            for stmt in maint::fanout_plan(&query, &schema, slices)? {
                println!("{stmt}");
            }
            Ok(())
        }
    }
}

fn load(
    config_path: &std::path::Path,
    system_config_path: Option<&std::path::Path>,
    quiet: bool,
) -> Result<(), ShardLoadError> {
    let primary = PrimaryConfig::load(config_path)?;
    let system = SystemConfig::load(system_config_path)?;

    if !quiet {
        println!(
            "{} tables against {} shards",
            primary.tables.len().to_string().bright_cyan(),
            primary.slicenum.to_string().bright_cyan()
        );
        println!("press enter to continue...");
        let mut discard = String::new();
        std::io::stdin().read_line(&mut discard)?;
    }

    let router: Arc<dyn ShardRouter> =
        router::build(&primary.routerpolicy, primary.slicenum, primary.routerbounds.clone())?;
    let conn_strings = primary.conn_strings();

    for table in primary.tables.clone() {
        debug!("starting job for table {}", table.tablename);
        let ctx = JobContext::from_configs(&primary, &system, table);

        let sinks: Vec<PostgresSink> = conn_strings
            .iter()
            .enumerate()
            .map(|(i, c)| PostgresSink::new(i, c.clone()))
            .collect();

        let progress = create_progress(quiet);
        let rows = job::run(&ctx, Arc::clone(&router), sinks, progress)?;
        if !quiet {
            println!("loaded {} rows into {} shards", rows, primary.slicenum);
        }
    }

    Ok(())
}
