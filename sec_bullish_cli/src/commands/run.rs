use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use sec_bullish_lib::config::MAX_LOOKBACK_HOURS;
use sec_bullish_lib::{
    dedupe_and_filter, Category, Deduped, HistoryLedger, Monitor, MonitorConfig, RunReport,
};
use serde::Serialize;

use crate::emit::{write_exports, ExportPaths};
use crate::output::{print_items, print_json, print_outcomes, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Lookback window in hours (overrides LOOKBACK_HOURS)
    #[arg(long)]
    pub lookback_hours: Option<i64>,

    /// Maximum records per category (overrides MAX_ITEMS)
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Maximum page requests per category (overrides MAX_PAGES)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Only run these categories: form4, 8k, 10q, 13dg (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Fetch and classify without writing the ledger or any export
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    negotiated: Option<&'a str>,
    outcomes: &'a [sec_bullish_lib::CategoryOutcome],
    new_items: &'a [sec_bullish_lib::FeedItem],
    total_unique: usize,
    dry_run: bool,
}

/// What a completed batch produced.
#[derive(Debug)]
struct Batch {
    report: RunReport,
    deduped: Deduped,
}

pub async fn run(args: &RunArgs, format: &OutputFormat) -> Result<()> {
    let config = apply_overrides(MonitorConfig::from_env()?, args)?;
    let categories = parse_categories(&args.categories)?;

    let Batch { report, deduped } = execute(&config, &categories, args.dry_run, Utc::now()).await?;

    eprintln!(
        "{} bullish items ({} new){}",
        deduped.all_unique.len(),
        deduped.new_items.len(),
        report
            .negotiated
            .as_deref()
            .map(|label| format!(" via {}", label))
            .unwrap_or_default()
    );

    match format {
        OutputFormat::Json => {
            print_json(&RunSummary {
                negotiated: report.negotiated.as_deref(),
                outcomes: &report.outcomes,
                new_items: &deduped.new_items,
                total_unique: deduped.all_unique.len(),
                dry_run: args.dry_run,
            });
            Ok(())
        }
        _ => {
            print_outcomes(&report.outcomes, format)?;
            if !deduped.new_items.is_empty() {
                print_items(&deduped.new_items, format)?;
            }
            Ok(())
        }
    }
}

fn apply_overrides(mut config: MonitorConfig, args: &RunArgs) -> Result<MonitorConfig> {
    if let Some(hours) = args.lookback_hours {
        if !(1..=MAX_LOOKBACK_HOURS).contains(&hours) {
            bail!("--lookback-hours must be between 1 and {}", MAX_LOOKBACK_HOURS);
        }
        config.lookback_hours = hours;
    }
    if let Some(max_items) = args.max_items {
        config.caps.max_items = max_items;
    }
    if let Some(max_pages) = args.max_pages {
        config.caps.max_pages = max_pages;
    }
    Ok(config)
}

fn parse_categories(raw: &[String]) -> Result<Vec<Category>> {
    if raw.is_empty() {
        return Ok(Category::ALL.to_vec());
    }
    raw.iter()
        .map(|s| s.parse::<Category>().map_err(anyhow::Error::msg))
        .collect()
}

/// Fetches, classifies, and persists one batch.
///
/// Exports are replaced before the ledger is appended, so a failed export
/// leaves the ledger untouched. When every category fails nothing is written
/// and the previous snapshot stays in place.
async fn execute(
    config: &MonitorConfig,
    categories: &[Category],
    dry_run: bool,
    started: DateTime<Utc>,
) -> Result<Batch> {
    let monitor = Monitor::new(config)?;
    let mut ledger = HistoryLedger::load(&config.history_path())?;
    eprintln!(
        "Running {} categories over the last {}h ({} candidates, {} ids in history)",
        categories.len(),
        config.lookback_hours,
        monitor.candidates().len(),
        ledger.len()
    );

    let report = monitor.run(categories, started).await;
    if report.all_failed() {
        let reasons: Vec<String> = report
            .failed()
            .map(|o| format!("{}: {}", o.category, o.error.as_deref().unwrap_or("unknown")))
            .collect();
        bail!(
            "every category failed, previous exports kept\n  {}",
            reasons.join("\n  ")
        );
    }

    let deduped = dedupe_and_filter(report.items.clone(), ledger.ids());
    if dry_run {
        eprintln!("Dry run: no files written");
    } else {
        write_exports(&ExportPaths::from_config(config), &deduped.all_unique, Utc::now())?;
        let written = ledger.append(&deduped.new_items)?;
        tracing::info!("History now holds {} ids ({} added)", ledger.len(), written);
    }

    Ok(Batch { report, deduped })
}
