use chrono::{DateTime, Duration, Utc};

/// Builds the provider filter expression for one category of filings.
///
/// ```
/// use secapi::FilingQuery;
/// let expr = FilingQuery::default().with_form_type("8-K").expression();
/// assert_eq!(expr, "formType:\"8-K\"");
/// ```
#[derive(Clone, Debug, Default)]
pub struct FilingQuery {
    pub form_types: Vec<String>,
    pub lookback_hours: Option<i64>,
    pub until: Option<DateTime<Utc>>,
    pub tickers: Vec<String>,
    pub exclude_amendments: bool,
}

const FILED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

impl FilingQuery {
    pub fn with_form_type(mut self, form_type: &str) -> Self {
        self.form_types.push(form_type.to_string());
        self
    }
    pub fn with_form_types(mut self, form_types: &[&str]) -> Self {
        self.form_types
            .extend(form_types.iter().map(|f| f.to_string()));
        self
    }

    /// Restricts results to filings from the trailing `hours` window.
    pub fn with_lookback_hours(mut self, hours: i64) -> Self {
        self.lookback_hours = Some(hours);
        self
    }

    /// Pins the end of the lookback window. Defaults to now.
    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_ticker(mut self, ticker: &str) -> Self {
        self.tickers.push(ticker.to_ascii_uppercase());
        self
    }

    pub fn with_exclude_amendments(mut self, exclude: bool) -> Self {
        self.exclude_amendments = exclude;
        self
    }

    /// Returns the `(from, until)` window when a lookback is set.
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let hours = self.lookback_hours?;
        let until = self.until.unwrap_or_else(Utc::now);
        Some((until - Duration::hours(hours), until))
    }

    /// Renders the Lucene-style expression sent as the `query` field.
    pub fn expression(&self) -> String {
        let mut clauses = Vec::new();

        let forms: Vec<String> = self
            .form_types
            .iter()
            .filter(|f| !(self.exclude_amendments && f.ends_with("/A")))
            .map(|f| format!("formType:\"{}\"", f))
            .collect();
        match forms.len() {
            0 => {}
            1 => clauses.push(forms[0].clone()),
            _ => clauses.push(format!("({})", forms.join(" OR "))),
        }

        if let Some((from, until)) = self.window() {
            clauses.push(format!(
                "filedAt:[{} TO {}]",
                from.format(FILED_AT_FORMAT),
                until.format(FILED_AT_FORMAT)
            ));
        }

        match self.tickers.len() {
            0 => {}
            1 => clauses.push(format!("ticker:{}", self.tickers[0])),
            _ => clauses.push(format!(
                "({})",
                self.tickers
                    .iter()
                    .map(|t| format!("ticker:{}", t))
                    .collect::<Vec<_>>()
                    .join(" OR ")
            )),
        }

        if clauses.is_empty() {
            "*".to_string()
        } else {
            clauses.join(" AND ")
        }
    }
}
