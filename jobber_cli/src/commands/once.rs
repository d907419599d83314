//! The `once` subcommand: run feeds a single time and report.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Args;
use jobber_lib::{FeedConfig, FeedOutcome, JobberConfig, Scheduler};

use super::{build_pipeline, load_config};
use crate::output::{print_reports, OutputFormat};

#[derive(Args)]
pub struct OnceArgs {
    /// Only run the feed with this name
    #[arg(long)]
    pub feed: Option<String>,

    /// Log messages instead of sending them and leave the database untouched
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(args: &OnceArgs, config_path: &Path, format: &OutputFormat) -> Result<()> {
    let config = load_config(config_path)?;
    let feeds = select_feeds(&config, args.feed.as_deref())?;

    let pipeline = Arc::new(build_pipeline(&config, args.dry_run)?);
    let outcomes = Scheduler::new(pipeline, feeds, config.interval())
        .run_once()
        .await;

    print_reports(&outcomes, format)?;
    check_outcomes(&outcomes)
}

/// Fails when any run failed, including runs whose task panicked.
fn check_outcomes(outcomes: &[FeedOutcome]) -> Result<()> {
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed > 0 {
        return Err(anyhow!("{} of {} feed run(s) failed", failed, outcomes.len()));
    }
    Ok(())
}

fn select_feeds(config: &JobberConfig, name: Option<&str>) -> Result<Vec<FeedConfig>> {
    let Some(name) = name else {
        return Ok(config.feeds.clone());
    };
    match config.feed(name) {
        Some(feed) => Ok(vec![feed.clone()]),
        None => {
            let known: Vec<&str> = config.feeds.iter().map(|f| f.name.as_str()).collect();
            Err(anyhow!(
                "unknown feed {:?} (configured: {})",
                name,
                known.join(", ")
            ))
        }
    }
}
