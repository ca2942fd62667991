//! Request payload for the search endpoint: [`SearchRequest`] and [`SortDirection`].

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

/// Sort order for API results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (oldest first).
    Asc,
    /// Descending order (newest first). This is the default.
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SortOrder {
    pub order: SortDirection,
}

/// JSON body POSTed to the search endpoint.
///
/// `from` and `size` are sent as strings, which every known plan accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub from: String,
    pub size: String,
    pub sort: Vec<BTreeMap<String, SortOrder>>,
    #[serde(rename = "nextPageToken", skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl SearchRequest {
    /// Creates a first-page request sorted by `filedAt` descending.
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            from: "0".to_string(),
            size: "50".to_string(),
            sort: Vec::new(),
            next_page_token: None,
        }
        .with_sort("filedAt", SortDirection::Desc)
    }

    /// Sets the zero-based result offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.from = offset.to_string();
        self
    }

    /// Sets the page size.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size.to_string();
        self
    }

    /// Replaces the sort clause.
    pub fn with_sort(mut self, field: &str, direction: SortDirection) -> Self {
        let mut clause = BTreeMap::new();
        clause.insert(field.to_string(), SortOrder { order: direction });
        self.sort = vec![clause];
        self
    }

    /// Sets (or clears) the opaque continuation token.
    pub fn with_page_token(mut self, token: Option<String>) -> Self {
        self.next_page_token = token;
        self
    }
}
