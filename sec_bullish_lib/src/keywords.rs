//! Curated keyword lists for the classifier.
//!
//! The lists are data, not logic: the default set is embedded from
//! `seed_data/keywords.yml` at compile time (same `include_str!` pattern as the
//! other seed files) and can be replaced at runtime with [`KeywordSet::from_file`].

use std::collections::BTreeSet;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::error::MonitorError;

#[derive(Deserialize, Debug, Default)]
struct KeywordFile {
    #[serde(default)]
    eight_k: EightKSection,
    #[serde(default)]
    ten_q: TenQSection,
}

#[derive(Deserialize, Debug, Default)]
struct EightKSection {
    #[serde(default)]
    positive: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    items: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TenQSection {
    #[serde(default)]
    positive: Vec<String>,
}

/// A compiled pattern that remembers its source text for evidence and reasons.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    fn compile(source: &str) -> Result<Self, MonitorError> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map_err(|e| MonitorError::Keywords(format!("pattern {:?}: {}", source, e)))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Compiled keyword lists used by the classifier.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    pub eight_k_positive: Vec<Pattern>,
    pub eight_k_exclude: Vec<Pattern>,
    /// Item numbers that qualify an 8-K under strict gating.
    pub eight_k_items: BTreeSet<String>,
    pub ten_q_positive: Vec<Pattern>,
}

impl KeywordSet {
    /// Parses and compiles a keyword set from YAML content.
    pub fn from_yaml(yaml_content: &str) -> Result<Self, MonitorError> {
        let file: KeywordFile = serde_yml::from_str(yaml_content)
            .map_err(|e| MonitorError::Keywords(format!("invalid YAML: {}", e)))?;

        let compile_all = |list: &[String]| -> Result<Vec<Pattern>, MonitorError> {
            list.iter().map(|s| Pattern::compile(s)).collect()
        };

        Ok(Self {
            eight_k_positive: compile_all(&file.eight_k.positive)?,
            eight_k_exclude: compile_all(&file.eight_k.exclude)?,
            eight_k_items: file
                .eight_k
                .items
                .iter()
                .map(|s| s.trim().to_string())
                .collect(),
            ten_q_positive: compile_all(&file.ten_q.positive)?,
        })
    }

    /// Loads a keyword set from a YAML file on disk.
    pub fn from_file(path: &Path) -> Result<Self, MonitorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Keywords(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// Loads the keyword set embedded at compile time.
    pub fn embedded() -> Result<Self, MonitorError> {
        let yaml_content = include_str!("../../seed_data/keywords.yml");
        Self::from_yaml(yaml_content)
    }
}

/// Source text of every pattern in `patterns` that matches `text`, in list order.
pub fn matching<'a>(patterns: &'a [Pattern], text: &str) -> Vec<&'a str> {
    patterns
        .iter()
        .filter(|p| p.is_match(text))
        .map(Pattern::source)
        .collect()
}
