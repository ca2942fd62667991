use chrono::{TimeZone, Utc};
use secapi::{FilingQuery, SearchRequest, SortDirection};

#[test]
fn filing_query_defaults() {
    assert_eq!(FilingQuery::default().expression(), "*");
}

#[test]
fn filing_query_form_and_window() {
    let until = Utc.with_ymd_and_hms(2024, 3, 1, 6, 30, 0).unwrap();
    let expr = FilingQuery::default()
        .with_form_type("10-Q")
        .with_lookback_hours(48)
        .with_until(until)
        .expression();
    assert_eq!(
        expr,
        "formType:\"10-Q\" AND filedAt:[2024-02-28T06:30:00 TO 2024-03-01T06:30:00]"
    );
}

#[test]
fn filing_query_window_bounds() {
    let until = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let (from, to) = FilingQuery::default()
        .with_lookback_hours(6)
        .with_until(until)
        .window()
        .unwrap();
    assert_eq!(to, until);
    assert_eq!((to - from).num_hours(), 6);
}

#[test]
fn filing_query_without_lookback_has_no_window() {
    assert!(FilingQuery::default().with_form_type("4").window().is_none());
}

#[test]
fn filing_query_schedule_13_group() {
    let expr = FilingQuery::default()
        .with_form_types(&["SC 13D", "SC 13D/A", "SC 13G", "SC 13G/A"])
        .expression();
    assert_eq!(
        expr,
        "(formType:\"SC 13D\" OR formType:\"SC 13D/A\" OR formType:\"SC 13G\" OR formType:\"SC 13G/A\")"
    );
}

#[test]
fn filing_query_with_tickers() {
    let expr = FilingQuery::default()
        .with_form_type("4")
        .with_ticker("aapl")
        .with_ticker("msft")
        .expression();
    assert_eq!(
        expr,
        "formType:\"4\" AND (ticker:AAPL OR ticker:MSFT)"
    );
}

#[test]
fn search_request_sort_variants() {
    let req = SearchRequest::new("*").with_sort("periodOfReport", SortDirection::Asc);
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["sort"][0]["periodOfReport"]["order"], "asc");
    assert_eq!(json["from"], "0");
}

#[test]
fn search_request_page_token_can_be_cleared() {
    let req = SearchRequest::new("*")
        .with_page_token(Some("t".to_string()))
        .with_page_token(None);
    let json = serde_json::to_value(&req).unwrap();
    assert!(json.get("nextPageToken").is_none());
}
