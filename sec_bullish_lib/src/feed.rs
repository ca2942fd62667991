//! Feed items and batch deduplication.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::category::Category;
use crate::classify::ClassificationResult;

/// One bullish filing as handed to the emitters and recorded in the ledger.
///
/// Every field except `id` defaults when missing so older ledger lines still parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// SHA-256 of `title|link`, hex encoded.
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    /// Filing timestamp as reported by the provider.
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, rename = "formType")]
    pub form_type: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub ticker: String,
}

impl FeedItem {
    /// Builds the feed entry for a classified filing.
    pub fn from_classification(result: &ClassificationResult, category: Option<Category>) -> Self {
        let filing = &result.filing;
        let title = feed_title(&filing.form_type, &filing.company);
        let link_for_id = if filing.link.is_empty() {
            title.as_str()
        } else {
            filing.link.as_str()
        };
        Self {
            id: feed_id(&title, link_for_id),
            link: filing.link.clone(),
            updated: filing.filed_at.clone(),
            reason: result.reason.clone(),
            evidence: result.evidence.clone(),
            category: category
                .map(|c| c.slug().to_string())
                .unwrap_or_else(|| "other".to_string()),
            form_type: filing.form_type.clone(),
            company: filing.company.clone(),
            ticker: filing.ticker.clone(),
            title,
        }
    }
}

/// `"<form> - <company>"`, with the separator dropped when either side is empty.
pub fn feed_title(form_type: &str, company: &str) -> String {
    format!("{} - {}", form_type.trim(), company.trim())
        .trim_matches(|c: char| c == ' ' || c == '-')
        .to_string()
}

/// Stable content hash of (title, link).
pub fn feed_id(title: &str, link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(link.as_bytes());
    hex::encode(hasher.finalize())
}

/// Output of [`dedupe_and_filter`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Deduped {
    /// Items whose id is not in the ledger, in discovery order.
    pub new_items: Vec<FeedItem>,
    /// Every unique item in the batch, new and previously seen.
    pub all_unique: Vec<FeedItem>,
}

/// Drops intra-batch repeats (first occurrence wins) and splits off items the
/// ledger has not seen yet.
pub fn dedupe_and_filter(items: Vec<FeedItem>, ledger: &HashSet<String>) -> Deduped {
    let mut seen = HashSet::new();
    let mut out = Deduped::default();
    for item in items {
        if !seen.insert(item.id.clone()) {
            continue;
        }
        if !ledger.contains(&item.id) {
            out.new_items.push(item.clone());
        }
        out.all_unique.push(item);
    }
    out
}
