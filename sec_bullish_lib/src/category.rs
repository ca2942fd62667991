//! Filing categories processed by a batch run.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use secapi::FilingQuery;
use serde::{Serialize, Serializer};

use crate::classify::SCHEDULE_13_FORMS;

/// One query/classification pass. Runs process categories in [`Category::ALL`] order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Form4Purchases,
    EightKBullish,
    TenQBullish,
    Schedule13,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Form4Purchases,
        Category::EightKBullish,
        Category::TenQBullish,
        Category::Schedule13,
    ];

    /// Short identifier used in logs, exports, and the `--category` flag.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Form4Purchases => "form4",
            Category::EightKBullish => "8k",
            Category::TenQBullish => "10q",
            Category::Schedule13 => "13dg",
        }
    }

    /// Form types requested from the provider for this category.
    pub fn form_types(self) -> &'static [&'static str] {
        match self {
            Category::Form4Purchases => &["4"],
            Category::EightKBullish => &["8-K", "8-K/A"],
            Category::TenQBullish => &["10-Q", "10-Q/A"],
            Category::Schedule13 => SCHEDULE_13_FORMS,
        }
    }

    /// The category a filing of `form_type` belongs to, if any.
    pub fn for_form(form_type: &str) -> Option<Category> {
        let form = form_type.trim().to_ascii_uppercase();
        if form == "4" {
            Some(Category::Form4Purchases)
        } else if form.starts_with("8-K") {
            Some(Category::EightKBullish)
        } else if form == "10-Q" || form == "10-Q/A" {
            Some(Category::TenQBullish)
        } else if SCHEDULE_13_FORMS.contains(&form.as_str()) {
            Some(Category::Schedule13)
        } else {
            None
        }
    }

    /// Query for this category over the trailing `lookback_hours` ending at `until`.
    pub fn query(self, lookback_hours: i64, until: DateTime<Utc>) -> FilingQuery {
        FilingQuery::default()
            .with_form_types(self.form_types())
            .with_lookback_hours(lookback_hours)
            .with_until(until)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| {
                format!(
                    "unknown category {:?} (expected one of: {})",
                    s,
                    Category::ALL.map(|c| c.slug()).join(", ")
                )
            })
    }
}
