//! Maps provider records of any known schema revision onto [`CanonicalFiling`].
//!
//! Every logical field has an explicit, ordered list of field paths. The first
//! path that yields a non-empty string (or a number) wins. Nothing here fails:
//! a record with no recognizable fields normalizes to an empty filing.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A path into a JSON object, one key per nesting level.
type FieldPath = &'static [&'static str];

const FORM_TYPE: &[FieldPath] = &[&["formType"], &["form"], &["form_type"], &["type"]];
const FILED_AT: &[FieldPath] = &[
    &["filedAt"],
    &["filingDate"],
    &["filed_at"],
    &["acceptedDate"],
    &["date"],
];
const COMPANY: &[FieldPath] = &[
    &["companyName"],
    &["issuerName"],
    &["issuer", "name"],
    &["entityName"],
    &["companyNameLong"],
    &["title"],
];
const TICKER: &[FieldPath] = &[
    &["ticker"],
    &["issuer", "tradingSymbol"],
    &["tradingSymbol"],
    &["symbol"],
];
const CIK: &[FieldPath] = &[&["cik"], &["issuer", "cik"], &["companyCik"]];
const LINK: &[FieldPath] = &[
    &["linkToFilingDetails"],
    &["filingUrl"],
    &["link"],
    &["linkToHtml"],
    &["htmlUrl"],
    &["url"],
];
const ACCESSION: &[FieldPath] = &[
    &["accessionNo"],
    &["accessionNumber"],
    &["accession_no"],
    &["id"],
];

/// Transaction tables; each may hold one object or a list of them.
const TRANSACTION_TABLES: &[FieldPath] = &[
    &["transactions"],
    &["transactionCoding"],
    &["nonDerivativeTable", "transactions"],
    &["derivativeTable", "transactions"],
];
const TRANSACTION_CODE: &[FieldPath] = &[&["transactionCode"], &["code"], &["coding", "code"]];

/// Free-text fields concatenated into the searchable blob.
const TEXT_FIELDS: &[FieldPath] = &[
    &["description"],
    &["text"],
    &["exhibitText"],
    &["documentsText"],
    &["body"],
    &["summary"],
];
const ITEMS: FieldPath = &["items"];

static ITEM_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}\.\d{2})\b").expect("item code pattern is valid"));

/// One filing in provider-independent form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalFiling {
    /// Uppercased form type, e.g. `4`, `8-K`, `SC 13D/A`.
    pub form_type: String,
    /// ISO-8601 filing timestamp as reported by the provider.
    pub filed_at: String,
    pub company: String,
    pub ticker: String,
    pub cik: String,
    pub link: String,
    pub accession_no: String,
    pub transaction_codes: BTreeSet<String>,
    /// 8-K item numbers such as `2.02`.
    pub item_codes: BTreeSet<String>,
    pub text_blob: String,
}

/// Builds a [`CanonicalFiling`] from one raw provider record.
pub fn normalize(raw: &Value) -> CanonicalFiling {
    let record = unwrap_record(raw);

    let items = item_strings(record);
    let mut text_parts: Vec<String> = TEXT_FIELDS
        .iter()
        .filter_map(|path| lookup(record, path).and_then(as_text))
        .collect();
    text_parts.extend(items.iter().cloned());

    CanonicalFiling {
        form_type: first_text(record, FORM_TYPE).to_ascii_uppercase(),
        filed_at: first_text(record, FILED_AT),
        company: first_text(record, COMPANY),
        ticker: first_text(record, TICKER).to_ascii_uppercase(),
        cik: first_text(record, CIK),
        link: first_text(record, LINK),
        accession_no: first_text(record, ACCESSION),
        transaction_codes: transaction_codes(record),
        item_codes: items
            .iter()
            .flat_map(|s| ITEM_CODE.captures_iter(s).map(|c| c[1].to_string()))
            .collect(),
        text_blob: text_parts.join(" "),
    }
}

/// Composite identity used to drop provider-side overlap between pages:
/// (accession number, filed-at, link). Records carrying none of the three fall
/// back to their full JSON text.
pub fn record_key(raw: &Value) -> (String, String, String) {
    let record = unwrap_record(raw);
    let key = (
        first_text(record, ACCESSION),
        first_text(record, FILED_AT),
        first_text(record, LINK),
    );
    if key.0.is_empty() && key.1.is_empty() && key.2.is_empty() {
        (String::new(), String::new(), raw.to_string())
    } else {
        key
    }
}

fn unwrap_record(raw: &Value) -> &Value {
    for wrapper in ["filing", "_source"] {
        if let Some(inner @ Value::Object(_)) = raw.get(wrapper) {
            return inner;
        }
    }
    raw
}

fn lookup<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(record, |v, key| v.get(*key))
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(record: &Value, paths: &[FieldPath]) -> String {
    paths
        .iter()
        .find_map(|path| lookup(record, path).and_then(as_text))
        .unwrap_or_default()
}

fn transaction_codes(record: &Value) -> BTreeSet<String> {
    let mut codes = BTreeSet::new();
    for table in TRANSACTION_TABLES {
        let entries: Vec<&Value> = match lookup(record, table) {
            Some(Value::Array(list)) => list.iter().collect(),
            Some(single) => vec![single],
            None => continue,
        };
        for entry in entries {
            let code = match entry {
                Value::String(_) => as_text(entry),
                _ => TRANSACTION_CODE
                    .iter()
                    .find_map(|path| lookup(entry, path).and_then(as_text)),
            };
            if let Some(code) = code {
                codes.insert(code.to_ascii_uppercase());
            }
        }
    }
    codes
}

fn item_strings(record: &Value) -> Vec<String> {
    match lookup(record, ITEMS) {
        Some(Value::Array(list)) => list.iter().filter_map(as_text).collect(),
        Some(other) => as_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn company_falls_back_through_known_keys() {
        assert_eq!(normalize(&json!({"companyName": "A"})).company, "A");
        assert_eq!(normalize(&json!({"issuerName": "B", "title": "x"})).company, "B");
        assert_eq!(normalize(&json!({"issuer": {"name": "C"}})).company, "C");
        assert_eq!(normalize(&json!({"title": "D"})).company, "D");
    }

    #[test]
    fn blank_values_do_not_shadow_later_keys() {
        let f = normalize(&json!({"companyName": "   ", "issuerName": "Real Co"}));
        assert_eq!(f.company, "Real Co");
    }

    #[test]
    fn wrapped_records_are_unwrapped() {
        let f = normalize(&json!({"filing": {"formType": "8-k", "link": "L"}}));
        assert_eq!(f.form_type, "8-K");
        assert_eq!(f.link, "L");

        let f = normalize(&json!({"_id": "x", "_source": {"form": "10-Q"}}));
        assert_eq!(f.form_type, "10-Q");
    }

    #[test]
    fn transaction_table_as_single_object() {
        let f = normalize(&json!({
            "formType": "4",
            "transactionCoding": {"transactionCode": "p"}
        }));
        assert_eq!(f.transaction_codes, BTreeSet::from(["P".to_string()]));
    }

    #[test]
    fn transaction_tables_are_flattened() {
        let f = normalize(&json!({
            "formType": "4",
            "transactions": [{"code": "A"}, {"transactionCode": "S"}],
            "nonDerivativeTable": {"transactions": [{"coding": {"code": "P"}}]},
            "derivativeTable": {"transactions": {"coding": {"code": "M"}}}
        }));
        let codes: Vec<&str> = f.transaction_codes.iter().map(String::as_str).collect();
        assert_eq!(codes, vec!["A", "M", "P", "S"]);
    }

    #[test]
    fn numeric_cik_is_rendered_as_text() {
        let f = normalize(&json!({"issuer": {"cik": 320193}}));
        assert_eq!(f.cik, "320193");
    }

    #[test]
    fn text_blob_and_item_codes() {
        let f = normalize(&json!({
            "formType": "8-K",
            "description": "Announces buyback",
            "body": "Full text",
            "items": ["Item 2.02: Results of Operations", "Item 9.01: Exhibits"]
        }));
        assert!(f.text_blob.starts_with("Announces buyback Full text"));
        assert!(f.text_blob.contains("Results of Operations"));
        let items: Vec<&str> = f.item_codes.iter().map(String::as_str).collect();
        assert_eq!(items, vec!["2.02", "9.01"]);
    }

    #[test]
    fn unrecognized_shapes_normalize_to_empty() {
        assert_eq!(normalize(&json!("just a string")), CanonicalFiling::default());
        assert_eq!(normalize(&json!(null)), CanonicalFiling::default());
        assert_eq!(normalize(&json!({"unrelated": [1, 2]})), CanonicalFiling::default());
        let f = normalize(&json!({"transactions": "garbage", "items": 7}));
        assert!(f.item_codes.is_empty());
    }

    #[test]
    fn record_key_uses_accession_filed_at_and_link() {
        let a = json!({"accessionNo": "1", "filedAt": "t", "link": "l", "extra": 1});
        let b = json!({"accessionNo": "1", "filedAt": "t", "link": "l", "extra": 2});
        assert_eq!(record_key(&a), record_key(&b));
        assert_ne!(record_key(&a), record_key(&json!({"accessionNo": "2"})));
    }

    #[test]
    fn record_key_without_identity_uses_raw_text() {
        assert_ne!(
            record_key(&json!({"description": "one"})),
            record_key(&json!({"description": "two"}))
        );
    }
}
