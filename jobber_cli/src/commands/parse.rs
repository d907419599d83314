//! The `parse` subcommand: extract postings from a saved search page.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use jobber_lib::{slack_message, ExclusionRules, Extractor, JobberConfig, Posting};

use super::load_config;
use crate::output::{print_extracted, Extracted, OutputFormat};

const DEFAULT_BASE_URL: &str = "https://www.upwork.com";

#[derive(Args)]
pub struct ParseArgs {
    /// Saved search results page (HTML)
    pub file: PathBuf,

    /// Base URL for resolving job links (defaults to the configured marketplace)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Also show postings an exclusion phrase rejects
    #[arg(long)]
    pub show_excluded: bool,

    /// Print the Slack message for each accepted posting instead of a table
    #[arg(long)]
    pub message: bool,
}

pub fn run(args: &ParseArgs, config_path: &Path, format: &OutputFormat) -> Result<()> {
    // Offline use should not require a config file.
    let config = if config_path.exists() {
        Some(load_config(config_path)?)
    } else {
        None
    };
    let base_url = args
        .base_url
        .clone()
        .or_else(|| config.as_ref().map(|c| c.marketplace.base_url.clone()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let rules = config
        .as_ref()
        .map(JobberConfig::exclusion_rules)
        .unwrap_or_default();

    let html = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let postings = Extractor::new(&base_url)?.extract(&html)?;

    if args.message {
        for posting in accepted(&postings, &rules) {
            print!("{}", slack_message(posting));
        }
        return Ok(());
    }

    let items = classify(&postings, &rules, args.show_excluded);
    eprintln!(
        "{} posting(s) extracted, {} shown",
        postings.len(),
        items.len()
    );
    print_extracted(&items, format)
}

fn accepted<'a>(
    postings: &'a [Posting],
    rules: &'a ExclusionRules,
) -> impl Iterator<Item = &'a Posting> {
    postings
        .iter()
        .filter(move |p| !p.url.is_empty() && rules.accepts(p))
}

fn classify<'a>(
    postings: &'a [Posting],
    rules: &'a ExclusionRules,
    show_excluded: bool,
) -> Vec<Extracted<'a>> {
    postings
        .iter()
        .map(|posting| Extracted {
            posting,
            excluded_by: rules.matching_phrase(posting),
        })
        .filter(|item| show_excluded || item.excluded_by.is_none())
        .collect()
}
