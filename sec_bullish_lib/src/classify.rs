//! Form-type heuristics that tag each filing bullish or not, with a reason.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::Serialize;

use crate::keywords::{matching, KeywordSet};
use crate::normalize::CanonicalFiling;

/// Beneficial-ownership forms reported on presence alone.
pub const SCHEDULE_13_FORMS: &[&str] = &[
    "SC 13D",
    "SC 13D/A",
    "SC 13G",
    "SC 13G/A",
    "SCHEDULE 13D",
    "SCHEDULE 13D/A",
    "SCHEDULE 13G",
    "SCHEDULE 13G/A",
];

/// Default Form 4 transaction codes treated as bullish.
///
/// `P` is an open-market purchase. `A` is a grant or award, which is not a
/// purchase; it is kept in the default set and can be dropped via policy.
pub const DEFAULT_FORM4_CODES: &[&str] = &["A", "P"];

/// How strictly 8-K filings are gated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Keyword match without exclusions is enough.
    #[default]
    Lenient,
    /// Additionally requires one of the configured item numbers.
    Strict,
}

impl FromStr for Strictness {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" | "false" | "0" | "" => Ok(Strictness::Lenient),
            "strict" | "true" | "1" => Ok(Strictness::Strict),
            _ => Err(()),
        }
    }
}

/// Tunable classification policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifierPolicy {
    pub form4_codes: BTreeSet<String>,
    pub eight_k_strictness: Strictness,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            form4_codes: DEFAULT_FORM4_CODES.iter().map(|c| c.to_string()).collect(),
            eight_k_strictness: Strictness::Lenient,
        }
    }
}

/// Verdict for one filing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub filing: CanonicalFiling,
    pub bullish: bool,
    pub reason: String,
    /// Matched codes or keyword patterns, in match order.
    pub evidence: Vec<String>,
}

pub struct Classifier {
    policy: ClassifierPolicy,
    keywords: KeywordSet,
}

impl Classifier {
    pub fn new(policy: ClassifierPolicy, keywords: KeywordSet) -> Self {
        Self { policy, keywords }
    }

    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    /// Classifies one filing. Pure: depends only on the filing, policy, and keywords.
    pub fn classify(&self, filing: CanonicalFiling) -> ClassificationResult {
        let form = filing.form_type.trim().to_string();
        let (bullish, reason, evidence) = if form == "4" {
            self.form4(&filing)
        } else if form.starts_with("8-K") {
            self.eight_k(&filing, &form)
        } else if form == "10-Q" || form == "10-Q/A" {
            self.ten_q(&filing, &form)
        } else if SCHEDULE_13_FORMS.contains(&form.as_str()) {
            (true, format!("{} filed (ownership stake disclosed)", form), vec![form.clone()])
        } else {
            (false, "Other form".to_string(), Vec::new())
        };

        ClassificationResult {
            filing,
            bullish,
            reason,
            evidence,
        }
    }

    fn form4(&self, filing: &CanonicalFiling) -> (bool, String, Vec<String>) {
        let matched: Vec<String> = filing
            .transaction_codes
            .intersection(&self.policy.form4_codes)
            .cloned()
            .collect();
        if matched.is_empty() {
            let wanted: Vec<&str> = self.policy.form4_codes.iter().map(String::as_str).collect();
            (false, format!("Form 4 without {}", wanted.join("/")), Vec::new())
        } else {
            (
                true,
                format!("Form 4 with transaction code {}", matched.join("/")),
                matched,
            )
        }
    }

    fn eight_k(&self, filing: &CanonicalFiling, form: &str) -> (bool, String, Vec<String>) {
        let text = filing.text_blob.to_lowercase();

        let excluded = matching(&self.keywords.eight_k_exclude, &text);
        if let Some(first) = excluded.first() {
            return (
                false,
                format!("{} excluded ({})", form, first),
                excluded.iter().map(|s| s.to_string()).collect(),
            );
        }

        let hits = matching(&self.keywords.eight_k_positive, &text);
        let Some(first) = hits.first() else {
            return (false, format!("{} no bullish keywords", form), Vec::new());
        };

        if self.policy.eight_k_strictness == Strictness::Strict {
            let qualifying: Vec<&String> = filing
                .item_codes
                .intersection(&self.keywords.eight_k_items)
                .collect();
            if qualifying.is_empty() {
                return (
                    false,
                    format!("{} keywords match ({}) but no qualifying item", form, first),
                    Vec::new(),
                );
            }
        }

        (
            true,
            format!("{} keywords match ({})", form, first),
            hits.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn ten_q(&self, filing: &CanonicalFiling, form: &str) -> (bool, String, Vec<String>) {
        let text = filing.text_blob.to_lowercase();
        let hits = matching(&self.keywords.ten_q_positive, &text);
        match hits.first() {
            Some(first) => (
                true,
                format!("{} bullish phrase ({})", form, first),
                hits.iter().map(|s| s.to_string()).collect(),
            ),
            None => (false, format!("{} no bullish phrases", form), Vec::new()),
        }
    }
}
