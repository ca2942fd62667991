mod commands;
mod emit;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "sec-bullish")]
#[command(about = "Monitor SEC filings for bullish signals and publish them as a feed")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, classify, and export the latest bullish filings
    Run(commands::run::RunArgs),
    /// Classify a saved provider response offline
    Classify(commands::classify::ClassifyArgs),
    /// Show recent entries from the history ledger
    History(commands::history::HistoryArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sec_bullish=info".parse()?)
                .add_directive("secapi=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    match &cli.command {
        Commands::Run(args) => commands::run::run(args, &format).await?,
        Commands::Classify(args) => commands::classify::run(args, &format)?,
        Commands::History(args) => commands::history::run(args, &format)?,
    }

    Ok(())
}
