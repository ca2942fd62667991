use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use sec_bullish_lib::ledger::read_entries;
use sec_bullish_lib::MonitorConfig;

use crate::output::{print_items, OutputFormat};

#[derive(Args)]
pub struct HistoryArgs {
    /// Number of most recent entries to show
    #[arg(long, default_value = "20")]
    pub limit: usize,

    /// Directory holding history.jsonl (defaults to DATA_DIR or ./data)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

pub fn run(args: &HistoryArgs, format: &OutputFormat) -> Result<()> {
    let path = match &args.data_dir {
        Some(dir) => MonitorConfig::history_file(dir),
        None => MonitorConfig::history_path_from_env(),
    };

    let entries = read_entries(&path)?;
    let skip = entries.len().saturating_sub(args.limit);
    let recent = &entries[skip..];

    eprintln!(
        "Showing {} of {} entries from {}",
        recent.len(),
        entries.len(),
        path.display()
    );
    print_items(recent, format)
}
