mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "jobber")]
#[command(about = "Watch marketplace job searches and post new listings to Slack")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "jobber.yml", global = true)]
    config: PathBuf,

    /// Output format: table, json, csv, markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every feed on its schedule until Ctrl-C
    Run(commands::run::RunArgs),
    /// Run feeds once and print what each run did
    Once(commands::once::OnceArgs),
    /// Extract postings from a saved search page
    Parse(commands::parse::ParseArgs),
    /// List recently stored postings
    List(commands::list::ListArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jobber=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        "md" | "markdown" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    match &cli.command {
        Commands::Run(args) => commands::run::run(args, &cli.config).await?,
        Commands::Once(args) => commands::once::run(args, &cli.config, &format).await?,
        Commands::Parse(args) => commands::parse::run(args, &cli.config, &format)?,
        Commands::List(args) => commands::list::run(args, &cli.config, &format)?,
    }

    Ok(())
}
