use anyhow::Result;
use sec_bullish_lib::{CategoryOutcome, ClassificationResult, FeedItem};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            "markdown" | "md" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct OutcomeRow {
    #[tabled(rename = "Category")]
    #[serde(rename = "Category")]
    category: String,
    #[tabled(rename = "Fetched")]
    #[serde(rename = "Fetched")]
    fetched: usize,
    #[tabled(rename = "Bullish")]
    #[serde(rename = "Bullish")]
    bullish: usize,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Tabled, Serialize)]
struct ItemRow {
    #[tabled(rename = "Filed")]
    #[serde(rename = "Filed")]
    filed: String,
    #[tabled(rename = "Form")]
    #[serde(rename = "Form")]
    form: String,
    #[tabled(rename = "Company")]
    #[serde(rename = "Company")]
    company: String,
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Category")]
    #[serde(rename = "Category")]
    category: String,
    #[tabled(rename = "Reason")]
    #[serde(rename = "Reason")]
    reason: String,
}

#[derive(Tabled, Serialize)]
struct VerdictRow {
    #[tabled(rename = "Form")]
    #[serde(rename = "Form")]
    form: String,
    #[tabled(rename = "Company")]
    #[serde(rename = "Company")]
    company: String,
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Bullish")]
    #[serde(rename = "Bullish")]
    bullish: String,
    #[tabled(rename = "Reason")]
    #[serde(rename = "Reason")]
    reason: String,
}

// -- Row builders --

fn build_outcome_rows(outcomes: &[CategoryOutcome]) -> Vec<OutcomeRow> {
    outcomes
        .iter()
        .map(|o| OutcomeRow {
            category: o.category.to_string(),
            fetched: o.fetched,
            bullish: o.bullish,
            status: match &o.error {
                Some(e) => format!("failed: {}", e),
                None => "ok".to_string(),
            },
        })
        .collect()
}

fn build_item_rows(items: &[FeedItem]) -> Vec<ItemRow> {
    items
        .iter()
        .map(|i| ItemRow {
            filed: short_date(&i.updated),
            form: i.form_type.clone(),
            company: i.company.clone(),
            ticker: i.ticker.clone(),
            category: i.category.clone(),
            reason: i.reason.clone(),
        })
        .collect()
}

fn build_verdict_rows(results: &[ClassificationResult]) -> Vec<VerdictRow> {
    results
        .iter()
        .map(|r| VerdictRow {
            form: r.filing.form_type.clone(),
            company: r.filing.company.clone(),
            ticker: r.filing.ticker.clone(),
            bullish: if r.bullish { "yes" } else { "no" }.to_string(),
            reason: r.reason.clone(),
        })
        .collect()
}

/// `YYYY-MM-DD` prefix of an ISO timestamp, or the input unchanged.
fn short_date(timestamp: &str) -> String {
    match timestamp.get(..10) {
        Some(date) if date.as_bytes().get(4) == Some(&b'-') => date.to_string(),
        _ => timestamp.to_string(),
    }
}

// -- Rendering --

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

pub fn print_outcomes(outcomes: &[CategoryOutcome], format: &OutputFormat) -> Result<()> {
    print_rows(build_outcome_rows(outcomes), format)
}

pub fn print_items(items: &[FeedItem], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&items);
            Ok(())
        }
        _ => print_rows(build_item_rows(items), format),
    }
}

pub fn print_verdicts(results: &[ClassificationResult], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&results);
            Ok(())
        }
        _ => print_rows(build_verdict_rows(results), format),
    }
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use sec_bullish_lib::{CanonicalFiling, Category};

    use super::*;

    fn outcomes() -> Vec<CategoryOutcome> {
        vec![
            CategoryOutcome {
                category: Category::Form4Purchases,
                fetched: 12,
                bullish: 3,
                error: None,
            },
            CategoryOutcome {
                category: Category::EightKBullish,
                fetched: 0,
                bullish: 0,
                error: Some("API error: all 6 request candidates failed".to_string()),
            },
        ]
    }

    fn csv_from_rows<T: Serialize>(rows: &[T]) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for row in rows {
            wtr.serialize(row).unwrap();
        }
        wtr.flush().unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("markdown"), OutputFormat::Markdown);
        assert_eq!(OutputFormat::parse("csv"), OutputFormat::Csv);
        assert_eq!(OutputFormat::parse("anything"), OutputFormat::Table);
    }

    #[test]
    fn test_outcome_rows_mapping() {
        let rows = build_outcome_rows(&outcomes());
        assert_eq!(rows[0].category, "form4");
        assert_eq!(rows[0].status, "ok");
        assert!(rows[1].status.starts_with("failed: API error"));
    }

    #[test]
    fn test_csv_outcome_headers() {
        let csv = csv_from_rows(&build_outcome_rows(&outcomes()));
        assert_eq!(csv.lines().next().unwrap(), "Category,Fetched,Bullish,Status");
    }

    #[test]
    fn test_verdict_rows_mapping() {
        let result = ClassificationResult {
            filing: CanonicalFiling {
                form_type: "SC 13D".to_string(),
                company: "Target Corp".to_string(),
                ..Default::default()
            },
            bullish: true,
            reason: "SC 13D filed (ownership stake disclosed)".to_string(),
            evidence: vec!["SC 13D".to_string()],
        };
        let rows = build_verdict_rows(&[result]);
        assert_eq!(rows[0].bullish, "yes");
        assert_eq!(rows[0].form, "SC 13D");
    }

    #[test]
    fn test_short_date() {
        assert_eq!(short_date("2024-05-02T08:30:00-04:00"), "2024-05-02");
        assert_eq!(short_date("May 2"), "May 2");
        assert_eq!(short_date(""), "");
    }

    #[test]
    fn test_markdown_outcomes_structure() {
        let mut table = Table::new(build_outcome_rows(&outcomes()));
        table.with(Style::markdown());
        let md = table.to_string();
        assert!(md.contains('|'));
        assert!(md.contains("---"));
        assert!(md.lines().next().unwrap().contains("Category"));
    }

    #[test]
    fn test_item_rows_empty() {
        assert!(build_item_rows(&[]).is_empty());
    }
}
