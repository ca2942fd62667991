//! Library layer for the SEC bullish monitor: pagination, normalization,
//! classification, and the append-only history ledger.
//!
//! Wraps the `secapi` crate's negotiating client with a per-category batch
//! runner that turns raw filings into deduplicated feed items.

pub mod candidates;
pub mod category;
pub mod classify;
pub mod config;
pub mod error;
pub mod feed;
pub mod keywords;
pub mod ledger;
pub mod monitor;
pub mod normalize;
pub mod pagination;

pub use secapi;
pub use secapi::types;
pub use secapi::{ApiKey, AuthMode, FilingQuery, RequestCandidate, SearchRequest};

pub use category::Category;
pub use classify::{ClassificationResult, Classifier, ClassifierPolicy, Strictness};
pub use config::MonitorConfig;
pub use error::MonitorError;
pub use feed::{dedupe_and_filter, Deduped, FeedItem};
pub use keywords::KeywordSet;
pub use ledger::HistoryLedger;
pub use monitor::{evaluate, CategoryOutcome, Monitor, RunReport};
pub use normalize::{normalize, CanonicalFiling};
pub use pagination::{fetch_all, PageCaps, PageSource, Session};
