//! Pagination engine: walks result pages under item and page caps.
//!
//! Pages come from a [`PageSource`]. In production that is a [`Session`],
//! which negotiates an endpoint on its first request and reuses the winner for
//! every later page and category of the run.

use std::collections::HashSet;

use secapi::types::SearchPage;
use secapi::{Client, RequestCandidate, SearchRequest};
use serde_json::Value;

use crate::error::MonitorError;
use crate::normalize::record_key;

/// Limits for one `fetch_all` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageCaps {
    pub max_items: usize,
    pub max_pages: usize,
    pub page_size: usize,
}

impl Default for PageCaps {
    fn default() -> Self {
        Self {
            max_items: 200,
            max_pages: 5,
            page_size: 50,
        }
    }
}

/// Anything that can answer one search request with a JSON body.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&mut self, request: &SearchRequest) -> Result<Value, MonitorError>;
}

/// Run-scoped page source over the HTTP client.
///
/// The first request goes through [`Client::negotiate`]; once a candidate wins
/// it is stored here and every later request uses [`Client::send`] against it.
/// A failed negotiation leaves the session un-negotiated, so the next request
/// starts again from the full candidate list.
pub struct Session<'a> {
    client: &'a Client,
    candidates: &'a [RequestCandidate],
    negotiated: Option<RequestCandidate>,
}

impl<'a> Session<'a> {
    pub fn new(client: &'a Client, candidates: &'a [RequestCandidate]) -> Self {
        Self {
            client,
            candidates,
            negotiated: None,
        }
    }

    /// The candidate fixed for this run, once negotiation has succeeded.
    pub fn negotiated(&self) -> Option<&RequestCandidate> {
        self.negotiated.as_ref()
    }
}

impl PageSource for Session<'_> {
    async fn fetch_page(&mut self, request: &SearchRequest) -> Result<Value, MonitorError> {
        if let Some(candidate) = &self.negotiated {
            return Ok(self.client.send(candidate, request).await?);
        }
        let negotiated = self.client.negotiate(self.candidates, request).await?;
        self.negotiated = Some(negotiated.candidate);
        Ok(negotiated.body)
    }
}

/// Fetches up to `caps.max_items` raw records for `query`.
///
/// Advances with the provider's continuation token when one is returned,
/// otherwise by `offset += page_size` while the reported total (or, without a
/// total, a full page) says more results exist. Stops on an empty page, an
/// unrecognized body, a repeated token, or either cap. Records repeated across
/// pages (same accession, filed-at, and link) are kept once.
///
/// Errors from the source are returned unchanged; records gathered before the
/// failing page are discarded with it.
pub async fn fetch_all<S: PageSource>(
    source: &mut S,
    query: &str,
    caps: &PageCaps,
) -> Result<Vec<Value>, MonitorError> {
    let page_size = caps.page_size.max(1);
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut offset = 0usize;
    let mut token: Option<String> = None;
    let mut pages = 0usize;
    let mut overlap = 0usize;

    while pages < caps.max_pages && records.len() < caps.max_items {
        let request = SearchRequest::new(query)
            .with_offset(offset)
            .with_size(page_size)
            .with_page_token(token.clone());
        let body = source.fetch_page(&request).await?;
        pages += 1;

        let page = match SearchPage::from_value(body) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Page {} skipped: {}", pages, e);
                break;
            }
        };
        if page.records.is_empty() {
            break;
        }

        let received = page.records.len();
        for raw in page.records {
            if records.len() >= caps.max_items {
                break;
            }
            if seen.insert(record_key(&raw)) {
                records.push(raw);
            } else {
                overlap += 1;
            }
        }
        tracing::debug!(
            "Page {} (offset {}): {} records, {} kept so far",
            pages,
            offset,
            received,
            records.len()
        );

        match page.next_page_token {
            Some(next) => {
                if token.as_deref() == Some(next.as_str()) {
                    tracing::warn!("Provider repeated continuation token; stopping");
                    break;
                }
                token = Some(next);
                offset += received;
            }
            None => {
                token = None;
                let next_offset = offset + page_size;
                let more = match page.total {
                    Some(total) => total > next_offset as u64,
                    None => received >= page_size,
                };
                if !more {
                    break;
                }
                offset = next_offset;
            }
        }
    }

    if overlap > 0 {
        tracing::debug!("Dropped {} records repeated across pages", overlap);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use serde_json::json;

    use super::*;

    /// Replays scripted bodies and records every request it receives.
    struct Scripted {
        bodies: VecDeque<Result<Value, MonitorError>>,
        repeat_last: Option<Value>,
        requests: Vec<SearchRequest>,
    }

    impl Scripted {
        fn new(bodies: Vec<Value>) -> Self {
            Self {
                bodies: bodies.into_iter().map(Ok).collect(),
                repeat_last: None,
                requests: Vec::new(),
            }
        }

        fn endless(body: Value) -> Self {
            Self {
                bodies: VecDeque::new(),
                repeat_last: Some(body),
                requests: Vec::new(),
            }
        }
    }

    impl PageSource for Scripted {
        async fn fetch_page(&mut self, request: &SearchRequest) -> Result<Value, MonitorError> {
            self.requests.push(request.clone());
            match self.bodies.pop_front() {
                Some(body) => body,
                None => Ok(self.repeat_last.clone().unwrap_or_else(|| json!([]))),
            }
        }
    }

    fn filings(range: std::ops::Range<usize>) -> Vec<Value> {
        range
            .map(|i| json!({"accessionNo": format!("acc-{i}"), "formType": "4"}))
            .collect()
    }

    fn caps(max_items: usize, max_pages: usize, page_size: usize) -> PageCaps {
        PageCaps {
            max_items,
            max_pages,
            page_size,
        }
    }

    #[tokio::test]
    async fn offset_advances_while_total_exceeds() {
        let mut source = Scripted::new(vec![
            json!({"total": {"value": 5}, "filings": filings(0..2)}),
            json!({"total": {"value": 5}, "filings": filings(2..4)}),
            json!({"total": {"value": 5}, "filings": filings(4..5)}),
        ]);
        let records = fetch_all(&mut source, "q", &caps(100, 10, 2)).await.unwrap();
        assert_eq!(records.len(), 5);
        let offsets: Vec<&str> = source.requests.iter().map(|r| r.from.as_str()).collect();
        assert_eq!(offsets, vec!["0", "2", "4"]);
    }

    #[tokio::test]
    async fn token_is_preferred_over_offset() {
        let mut source = Scripted::new(vec![
            json!({"filings": filings(0..2), "nextPageToken": "t1", "total": 2}),
            json!({"filings": filings(2..3)}),
        ]);
        let records = fetch_all(&mut source, "q", &caps(100, 10, 2)).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(source.requests[0].next_page_token, None);
        assert_eq!(source.requests[1].next_page_token.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn endless_provider_is_bounded_by_page_cap() {
        let mut counter = 0usize;
        let mut bodies = Vec::new();
        for _ in 0..50 {
            bodies.push(json!({"total": 1_000_000, "filings": filings(counter..counter + 10)}));
            counter += 10;
        }
        let mut source = Scripted::new(bodies);
        let records = fetch_all(&mut source, "q", &caps(1_000, 4, 10)).await.unwrap();
        assert_eq!(source.requests.len(), 4);
        assert_eq!(records.len(), 40);
    }

    #[tokio::test]
    async fn endless_provider_is_bounded_by_item_cap() {
        let mut bodies = Vec::new();
        for p in 0..50 {
            bodies.push(json!({"total": 1_000_000, "filings": filings(p * 10..p * 10 + 10)}));
        }
        let mut source = Scripted::new(bodies);
        let records = fetch_all(&mut source, "q", &caps(25, 100, 10)).await.unwrap();
        assert_eq!(records.len(), 25);
        assert_eq!(source.requests.len(), 3);
    }

    #[tokio::test]
    async fn identical_pages_terminate_and_dedupe() {
        let mut source = Scripted::endless(json!({"total": 1_000_000, "filings": filings(0..10)}));
        let records = fetch_all(&mut source, "q", &caps(500, 7, 10)).await.unwrap();
        assert_eq!(records.len(), 10);
        assert_eq!(source.requests.len(), 7);
    }

    #[tokio::test]
    async fn repeated_token_stops() {
        let mut source = Scripted::endless(json!({"filings": filings(0..3), "nextPageToken": "same"}));
        let records = fetch_all(&mut source, "q", &caps(500, 50, 3)).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(source.requests.len(), 2);
    }

    #[tokio::test]
    async fn empty_page_stops() {
        let mut source = Scripted::new(vec![json!({"filings": []})]);
        let records = fetch_all(&mut source, "q", &caps(10, 10, 10)).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(source.requests.len(), 1);
    }

    #[tokio::test]
    async fn short_page_without_total_stops() {
        let mut source = Scripted::new(vec![json!(filings(0..3))]);
        let records = fetch_all(&mut source, "q", &caps(100, 10, 10)).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(source.requests.len(), 1);
    }

    #[tokio::test]
    async fn unknown_shape_yields_zero_records() {
        let mut source = Scripted::new(vec![json!({"message": "maintenance"})]);
        let records = fetch_all(&mut source, "q", &caps(10, 10, 10)).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn source_error_is_propagated() {
        let mut source = Scripted::new(vec![json!({"total": 100, "filings": filings(0..10)})]);
        source
            .bodies
            .push_back(Err(MonitorError::Api(secapi::Error::NoCandidates)));
        let result = fetch_all(&mut source, "q", &caps(100, 10, 10)).await;
        assert!(matches!(result, Err(MonitorError::Api(_))));
    }

    #[tokio::test]
    async fn zero_page_cap_issues_no_requests() {
        let mut source = Scripted::new(vec![json!(filings(0..3))]);
        let records = fetch_all(&mut source, "q", &caps(10, 0, 10)).await.unwrap();
        assert!(records.is_empty());
        assert!(source.requests.is_empty());
    }

    #[tokio::test]
    async fn overlap_between_pages_is_dropped() {
        let mut source = Scripted::new(vec![
            json!({"total": 6, "filings": filings(0..3)}),
            json!({"total": 6, "filings": filings(2..5)}),
        ]);
        let records = fetch_all(&mut source, "q", &caps(100, 10, 3)).await.unwrap();
        assert_eq!(records.len(), 5);
    }
}
