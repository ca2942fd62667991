//! Append-only history of emitted feed items (`history.jsonl`).
//!
//! One JSON object per line. The set of ids in the file is the dedup ledger:
//! an id written here is never reported as new again.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::MonitorError;
use crate::feed::FeedItem;

#[derive(Debug)]
pub struct HistoryLedger {
    path: PathBuf,
    ids: HashSet<String>,
}

impl HistoryLedger {
    /// Loads the ledger at `path`. A missing file is an empty ledger; unreadable
    /// lines are skipped with a warning.
    pub fn load(path: &Path) -> Result<Self, MonitorError> {
        let entries = read_entries(path)?;
        let mut ids = HashSet::with_capacity(entries.len());
        for entry in &entries {
            ids.insert(entry.id.clone());
        }
        tracing::debug!("Loaded {} ledger ids from {}", ids.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &HashSet<String> {
        &self.ids
    }

    /// Number of distinct ids recorded.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Appends items whose ids are not yet recorded and returns how many were
    /// written. The batch goes out in a single write followed by a sync.
    pub fn append(&mut self, items: &[FeedItem]) -> Result<usize, MonitorError> {
        let mut buf = String::new();
        let mut added = Vec::new();
        for item in items {
            if self.ids.contains(&item.id) || added.contains(&item.id) {
                continue;
            }
            buf.push_str(&serde_json::to_string(item)?);
            buf.push('\n');
            added.push(item.id.clone());
        }
        if added.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| MonitorError::persistence(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| MonitorError::persistence(&self.path, e))?;
        write_synced(&mut file, buf.as_bytes())
            .map_err(|e| MonitorError::persistence(&self.path, e))?;

        let count = added.len();
        self.ids.extend(added);
        tracing::info!("Recorded {} new ids in {}", count, self.path.display());
        Ok(count)
    }
}

fn write_synced(file: &mut fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

/// Parses every readable entry in a ledger file, in file order.
pub fn read_entries(path: &Path) -> Result<Vec<FeedItem>, MonitorError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(MonitorError::persistence(path, e)),
    };

    let mut entries = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<FeedItem>(line) {
            Ok(item) => entries.push(item),
            Err(e) => tracing::warn!(
                "Skipping unreadable ledger line {} in {}: {}",
                lineno + 1,
                path.display(),
                e
            ),
        }
    }
    Ok(entries)
}
