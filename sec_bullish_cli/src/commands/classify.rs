use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sec_bullish_lib::classify::DEFAULT_FORM4_CODES;
use sec_bullish_lib::types::SearchPage;
use sec_bullish_lib::{
    evaluate, ClassificationResult, Classifier, ClassifierPolicy, KeywordSet, Strictness,
};

use crate::output::{print_verdicts, OutputFormat};

#[derive(Args)]
pub struct ClassifyArgs {
    /// Saved provider response (any supported envelope)
    #[arg(long)]
    pub input: PathBuf,

    /// Keyword YAML replacing the built-in set
    #[arg(long)]
    pub keywords: Option<PathBuf>,

    /// Require a qualifying item number for 8-K filings
    #[arg(long)]
    pub strict_8k: bool,

    /// Form 4 transaction codes counted as bullish, comma separated
    #[arg(long, value_delimiter = ',')]
    pub form4_codes: Vec<String>,

    /// Only print bullish filings
    #[arg(long)]
    pub bullish_only: bool,
}

pub fn run(args: &ClassifyArgs, format: &OutputFormat) -> Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let body: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parse {}", args.input.display()))?;
    let page = SearchPage::from_value(body)?;

    let keywords = match &args.keywords {
        Some(path) => KeywordSet::from_file(path)?,
        None => KeywordSet::embedded()?,
    };
    let codes: Vec<String> = if args.form4_codes.is_empty() {
        DEFAULT_FORM4_CODES.iter().map(|c| c.to_string()).collect()
    } else {
        args.form4_codes
            .iter()
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .collect()
    };
    let policy = ClassifierPolicy {
        form4_codes: codes.into_iter().collect(),
        eight_k_strictness: if args.strict_8k {
            Strictness::Strict
        } else {
            Strictness::Lenient
        },
    };
    let classifier = Classifier::new(policy, keywords);

    let results: Vec<ClassificationResult> = page
        .records
        .iter()
        .map(|raw| evaluate(&classifier, raw))
        .filter(|r| r.bullish || !args.bullish_only)
        .collect();

    let bullish = results.iter().filter(|r| r.bullish).count();
    eprintln!(
        "{} records classified, {} bullish",
        page.records.len(),
        bullish
    );

    print_verdicts(&results, format)
}
