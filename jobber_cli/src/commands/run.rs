//! The `run` subcommand: schedule every feed until interrupted.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use jobber_lib::Scheduler;

use super::{build_pipeline, load_config};

#[derive(Args)]
pub struct RunArgs {
    /// Log messages instead of sending them and leave the database untouched
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(args: &RunArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let pipeline = Arc::new(build_pipeline(&config, args.dry_run)?);
    let scheduler = Scheduler::new(pipeline, config.feeds.clone(), config.interval());

    eprintln!(
        "Watching {} feed(s) every {}s{}. Press Ctrl-C to stop.",
        config.feeds.len(),
        config.schedule.interval_secs,
        if args.dry_run { " (dry run)" } else { "" }
    );

    scheduler.run_until(shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
