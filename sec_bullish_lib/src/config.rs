//! Monitor configuration read from the environment.
//!
//! Absent keys fall back to defaults. Present but malformed values are
//! rejected with [`MonitorError::Configuration`] before any network call.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use secapi::user_agent::default_user_agent;
use secapi::{ApiKey, AuthMode};

use crate::classify::{ClassifierPolicy, Strictness, DEFAULT_FORM4_CODES};
use crate::error::MonitorError;
use crate::pagination::PageCaps;

pub const DEFAULT_BASE_URL: &str = "https://api.sec-api.io";
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;
pub const MAX_LOOKBACK_HOURS: i64 = 720;
pub const MAX_PAGE_SIZE: usize = 200;

const DEFAULT_DATA_DIR: &str = "data";
const HISTORY_FILE: &str = "history.jsonl";

/// Everything a batch run needs, resolved and validated.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub api_key: ApiKey,
    pub base_urls: Vec<String>,
    pub auth_preference: AuthMode,
    pub user_agent: String,
    pub lookback_hours: i64,
    pub caps: PageCaps,
    pub request_timeout: Duration,
    pub form4_codes: BTreeSet<String>,
    pub strictness: Strictness,
    pub keywords_file: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
}

impl MonitorConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, MonitorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns the raw value for a key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MonitorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("SEC_API_KEY")
            .map(ApiKey::new)
            .ok_or_else(|| MonitorError::Configuration("SEC_API_KEY is not set".to_string()))?;

        let base_urls: Vec<String> = get("SEC_API_URL")
            .map(|raw| {
                raw.split(',')
                    .map(|u| u.trim().to_string())
                    .filter(|u| !u.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let base_urls = if base_urls.is_empty() {
            vec![DEFAULT_BASE_URL.to_string()]
        } else {
            base_urls
        };

        let auth_preference = match get("AUTH_SCHEME") {
            Some(raw) => raw.parse::<AuthMode>().map_err(|_| {
                MonitorError::Configuration(format!(
                    "AUTH_SCHEME {:?} is not one of x-api-key, bearer, raw",
                    raw
                ))
            })?,
            None => AuthMode::ApiKeyHeader,
        };

        let lookback_hours = parse_or(&get, "LOOKBACK_HOURS", DEFAULT_LOOKBACK_HOURS)?;
        if !(1..=MAX_LOOKBACK_HOURS).contains(&lookback_hours) {
            return Err(MonitorError::Configuration(format!(
                "LOOKBACK_HOURS must be between 1 and {}, got {}",
                MAX_LOOKBACK_HOURS, lookback_hours
            )));
        }

        let defaults = PageCaps::default();
        let caps = PageCaps {
            max_items: parse_or(&get, "MAX_ITEMS", defaults.max_items)?,
            max_pages: parse_or(&get, "MAX_PAGES", defaults.max_pages)?,
            page_size: parse_or(&get, "PAGE_SIZE", defaults.page_size)?,
        };
        if !(1..=MAX_PAGE_SIZE).contains(&caps.page_size) {
            return Err(MonitorError::Configuration(format!(
                "PAGE_SIZE must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, caps.page_size
            )));
        }

        let timeout_secs: u64 = parse_or(
            &get,
            "REQUEST_TIMEOUT_SECS",
            secapi::DEFAULT_TIMEOUT.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(MonitorError::Configuration(
                "REQUEST_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        let form4_codes = match get("FORM4_CODES") {
            Some(raw) => parse_codes(&raw)?,
            None => DEFAULT_FORM4_CODES.iter().map(|c| c.to_string()).collect(),
        };

        let strictness = match get("STRICT_8K") {
            Some(raw) => raw.parse::<Strictness>().map_err(|_| {
                MonitorError::Configuration(format!("STRICT_8K {:?} is not a boolean", raw))
            })?,
            None => Strictness::Lenient,
        };

        Ok(Self {
            api_key,
            base_urls,
            auth_preference,
            user_agent: get("SEC_USER_AGENT").unwrap_or_else(default_user_agent),
            lookback_hours,
            caps,
            request_timeout: Duration::from_secs(timeout_secs),
            form4_codes,
            strictness,
            keywords_file: get("KEYWORDS_FILE").map(PathBuf::from),
            data_dir: data_dir(&get),
            out_dir: PathBuf::from(get("OUT_DIR").unwrap_or_else(|| "public".to_string())),
        })
    }

    /// Ledger location from `DATA_DIR` alone. Read-only commands use this so
    /// they work without an API key.
    pub fn history_path_from_env() -> PathBuf {
        Self::history_path_from_lookup(|key| std::env::var(key).ok())
    }

    pub fn history_path_from_lookup<F>(lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self::history_file(&data_dir(&get))
    }

    /// Ledger file inside `data_dir`.
    pub fn history_file(data_dir: &Path) -> PathBuf {
        data_dir.join(HISTORY_FILE)
    }

    pub fn policy(&self) -> ClassifierPolicy {
        ClassifierPolicy {
            form4_codes: self.form4_codes.clone(),
            eight_k_strictness: self.strictness,
        }
    }

    pub fn history_path(&self) -> PathBuf {
        Self::history_file(&self.data_dir)
    }

    pub fn latest_json_path(&self) -> PathBuf {
        self.data_dir.join("bullish_latest.json")
    }

    pub fn latest_csv_path(&self) -> PathBuf {
        self.data_dir.join("bullish_latest.csv")
    }

    pub fn feed_path(&self) -> PathBuf {
        self.out_dir.join("feed.xml")
    }

    pub fn keywords_file(&self) -> Option<&Path> {
        self.keywords_file.as_deref()
    }
}

fn data_dir<G: Fn(&str) -> Option<String>>(get: &G) -> PathBuf {
    PathBuf::from(get("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()))
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, MonitorError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse::<T>().map_err(|e| {
            MonitorError::Configuration(format!("{} has invalid value {:?}: {}", key, raw, e))
        }),
        None => Ok(default),
    }
}

fn parse_codes(raw: &str) -> Result<BTreeSet<String>, MonitorError> {
    let codes: BTreeSet<String> = raw
        .split(',')
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .collect();
    if let Some(bad) = codes
        .iter()
        .find(|c| c.len() != 1 || !c.chars().all(|ch| ch.is_ascii_alphabetic()))
    {
        return Err(MonitorError::Configuration(format!(
            "FORM4_CODES entry {:?} is not a single-letter transaction code",
            bad
        )));
    }
    if codes.is_empty() {
        return Err(MonitorError::Configuration(
            "FORM4_CODES must name at least one code".to_string(),
        ));
    }
    Ok(codes)
}
