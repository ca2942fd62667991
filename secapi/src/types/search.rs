//! Tolerant reader for search responses.
//!
//! Providers have shipped several envelope layouts over time. [`SearchPage::from_value`]
//! accepts all of the known ones and reports anything else as a [`ShapeError`].

use serde_json::Value;

/// Keys that may hold the record list in an object envelope, in priority order.
const LIST_KEYS: &[&str] = &["filings", "data", "results", "items"];

/// Keys that may hold an opaque continuation token.
const TOKEN_KEYS: &[&str] = &["nextPageToken", "next_page_token", "nextToken", "searchAfter"];

/// The response body did not match any known envelope.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized response shape: {0}")]
pub struct ShapeError(pub String);

/// One page of raw provider records plus whatever paging hints came with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub records: Vec<Value>,
    /// Provider-reported total hit count, when present.
    pub total: Option<u64>,
    pub next_page_token: Option<String>,
}

impl SearchPage {
    pub fn from_value(body: Value) -> Result<Self, ShapeError> {
        match body {
            Value::Array(records) => Ok(Self {
                records,
                ..Default::default()
            }),
            Value::Object(mut map) => {
                let total = map.get("total").and_then(read_total).or_else(|| {
                    map.get("hits")
                        .and_then(|h| h.get("total"))
                        .and_then(read_total)
                });
                let next_page_token = TOKEN_KEYS
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str))
                    .filter(|t| !t.is_empty())
                    .map(str::to_string);

                for key in LIST_KEYS {
                    if let Some(Value::Array(records)) = map.remove(*key) {
                        return Ok(Self {
                            records,
                            total,
                            next_page_token,
                        });
                    }
                }

                match map.remove("hits") {
                    Some(Value::Array(records)) => Ok(Self {
                        records,
                        total,
                        next_page_token,
                    }),
                    Some(Value::Object(mut inner)) => match inner.remove("hits") {
                        Some(Value::Array(hits)) => Ok(Self {
                            records: hits.into_iter().map(unwrap_source).collect(),
                            total,
                            next_page_token,
                        }),
                        _ => Err(ShapeError("`hits` object without a `hits` list".to_string())),
                    },
                    _ => {
                        let keys: Vec<&String> = map.keys().collect();
                        Err(ShapeError(format!("no record list among keys {:?}", keys)))
                    }
                }
            }
            other => Err(ShapeError(format!("expected object or array, got {}", kind(&other)))),
        }
    }
}

fn read_total(v: &Value) -> Option<u64> {
    v.as_u64()
        .or_else(|| v.get("value").and_then(Value::as_u64))
        .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

fn unwrap_source(hit: Value) -> Value {
    match hit {
        Value::Object(mut map) => match map.remove("_source") {
            Some(source @ Value::Object(_)) => source,
            Some(other) => {
                map.insert("_source".to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn top_level_list() {
        let page = SearchPage::from_value(json!([{"formType": "4"}])).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.total, None);
    }

    #[test]
    fn filings_envelope_with_total_object() {
        let page = SearchPage::from_value(json!({
            "total": {"value": 312, "relation": "eq"},
            "filings": [{"formType": "8-K"}, {"formType": "4"}]
        }))
        .unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.total, Some(312));
    }

    #[test]
    fn nested_hits_unwrap_source() {
        let page = SearchPage::from_value(json!({
            "hits": {
                "total": 2,
                "hits": [
                    {"_id": "a", "_source": {"formType": "10-Q"}},
                    {"_id": "b", "_source": {"formType": "4"}}
                ]
            }
        }))
        .unwrap();
        assert_eq!(page.total, Some(2));
        assert_eq!(page.records[0], json!({"formType": "10-Q"}));
    }

    #[test]
    fn results_envelope_with_token() {
        let page = SearchPage::from_value(json!({
            "results": [],
            "nextPageToken": "abc"
        }))
        .unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
    }

    #[test]
    fn empty_token_is_ignored() {
        let page = SearchPage::from_value(json!({"data": [], "nextPageToken": ""})).unwrap();
        assert_eq!(page.next_page_token, None);
    }

    #[test]
    fn unknown_object_is_shape_error() {
        let err = SearchPage::from_value(json!({"message": "ok"})).unwrap_err();
        assert!(err.0.contains("message"));
    }

    #[test]
    fn scalar_is_shape_error() {
        assert!(SearchPage::from_value(json!("nope")).is_err());
        assert!(SearchPage::from_value(Value::Null).is_err());
    }
}
