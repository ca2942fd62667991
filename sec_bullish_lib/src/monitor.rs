//! Per-category batch runner.
//!
//! Categories run sequentially over one [`Session`], so the endpoint negotiated
//! by the first successful category is reused by every later one. A category
//! that fails is reported and skipped; the others still run.

use chrono::{DateTime, Utc};
use secapi::{Client, RequestCandidate};
use serde::Serialize;
use serde_json::Value;

use crate::candidates::build_candidates;
use crate::category::Category;
use crate::classify::{ClassificationResult, Classifier};
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::feed::FeedItem;
use crate::keywords::KeywordSet;
use crate::normalize::normalize;
use crate::pagination::{fetch_all, PageCaps, PageSource, Session};

/// Result of one category pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOutcome {
    pub category: Category,
    /// Raw records returned by the provider after pagination.
    pub fetched: usize,
    pub bullish: usize,
    /// Set when the category failed; the run continues with the next one.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<CategoryOutcome>,
    /// Bullish items in category order, then provider order. May contain
    /// repeats; see [`crate::feed::dedupe_and_filter`].
    pub items: Vec<FeedItem>,
    /// Redacted label of the negotiated candidate, if any category got that far.
    pub negotiated: Option<String>,
}

impl RunReport {
    /// True when at least one category ran and every one of them failed.
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.error.is_some())
    }

    pub fn failed(&self) -> impl Iterator<Item = &CategoryOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}

pub struct Monitor {
    client: Client,
    candidates: Vec<RequestCandidate>,
    classifier: Classifier,
    caps: PageCaps,
    lookback_hours: i64,
}

impl Monitor {
    /// Builds the client, candidate list, and classifier from configuration.
    pub fn new(config: &MonitorConfig) -> Result<Self, MonitorError> {
        let keywords = match config.keywords_file() {
            Some(path) => KeywordSet::from_file(path)?,
            None => KeywordSet::embedded()?,
        };
        let client = Client::with_options(
            config.api_key.clone(),
            &config.user_agent,
            config.request_timeout,
        )?;
        let candidates = build_candidates(&config.base_urls, config.auth_preference)?;
        Ok(Self::from_parts(
            client,
            candidates,
            Classifier::new(config.policy(), keywords),
            config.caps,
            config.lookback_hours,
        ))
    }

    pub fn from_parts(
        client: Client,
        candidates: Vec<RequestCandidate>,
        classifier: Classifier,
        caps: PageCaps,
        lookback_hours: i64,
    ) -> Self {
        Self {
            client,
            candidates,
            classifier,
            caps,
            lookback_hours,
        }
    }

    pub fn candidates(&self) -> &[RequestCandidate] {
        &self.candidates
    }

    /// Runs `categories` for the window ending at `until`.
    pub async fn run(&self, categories: &[Category], until: DateTime<Utc>) -> RunReport {
        let mut session = Session::new(&self.client, &self.candidates);
        let mut report = run_with(
            &mut session,
            &self.classifier,
            categories,
            self.lookback_hours,
            &self.caps,
            until,
        )
        .await;
        report.negotiated = session.negotiated().map(|c| c.redacted());
        report
    }
}

/// Runs `categories` against any page source.
pub async fn run_with<S: PageSource>(
    source: &mut S,
    classifier: &Classifier,
    categories: &[Category],
    lookback_hours: i64,
    caps: &PageCaps,
    until: DateTime<Utc>,
) -> RunReport {
    let mut report = RunReport::default();
    for &category in categories {
        let query = category.query(lookback_hours, until).expression();
        tracing::debug!("[{}] query: {}", category, query);

        let mut outcome = CategoryOutcome {
            category,
            fetched: 0,
            bullish: 0,
            error: None,
        };
        match fetch_all(source, &query, caps).await {
            Ok(records) => {
                outcome.fetched = records.len();
                for raw in &records {
                    let result = evaluate(classifier, raw);
                    if result.bullish {
                        outcome.bullish += 1;
                        report
                            .items
                            .push(FeedItem::from_classification(&result, Some(category)));
                    }
                }
                tracing::info!(
                    "[{}] {} fetched, {} bullish",
                    category,
                    outcome.fetched,
                    outcome.bullish
                );
            }
            Err(e) => {
                tracing::error!("[{}] category failed: {}", category, e);
                outcome.error = Some(e.to_string());
            }
        }
        report.outcomes.push(outcome);
    }
    report
}

/// Normalizes and classifies one raw provider record.
pub fn evaluate(classifier: &Classifier, raw: &Value) -> ClassificationResult {
    classifier.classify(normalize(raw))
}
