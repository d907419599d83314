//! The `list` subcommand: show postings already stored.

use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Args;
use jobber_lib::{PaymentType, PostingFilter, SqliteStore};

use super::load_config;
use crate::output::{print_stored, OutputFormat};

#[derive(Args)]
pub struct ListArgs {
    /// Only postings found by this exact search query
    #[arg(long)]
    pub query: Option<String>,

    /// Filter by payment type: fixed, hourly
    #[arg(long)]
    pub payment_type: Option<String>,

    /// Maximum number of postings, newest first
    #[arg(long, default_value = "20")]
    pub limit: i64,
}

pub fn run(args: &ListArgs, config_path: &Path, format: &OutputFormat) -> Result<()> {
    let filter = build_filter(args)?;
    let config = load_config(config_path)?;
    let store = SqliteStore::open(&config.database)?;

    let rows = store.recent_postings(&filter)?;
    if rows.is_empty() {
        eprintln!("No stored postings match.");
    }
    print_stored(&rows, format)
}

fn build_filter(args: &ListArgs) -> Result<PostingFilter> {
    if args.limit < 1 {
        return Err(anyhow!("--limit must be at least 1"));
    }
    let payment_type = args
        .payment_type
        .as_deref()
        .map(|raw| raw.parse::<PaymentType>().map_err(|e| anyhow!(e)))
        .transpose()?;
    Ok(PostingFilter {
        search_query: args.query.clone(),
        payment_type,
        limit: Some(args.limit),
    })
}
