//! Snapshot exports: `bullish_latest.json`, `bullish_latest.csv` and the RSS feed.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use sec_bullish_lib::{FeedItem, MonitorConfig};
use serde::Serialize;

/// Most recent items kept in `feed.xml`.
pub const FEED_ITEM_LIMIT: usize = 120;

const FEED_TITLE: &str = "SEC Bullish Monitor";
const FEED_DESCRIPTION: &str = "Form 4 purchases, bullish 8-K and 10-Q language, Schedule 13D/G filings";
const FEED_LINK: &str = "https://www.sec.gov/";

pub struct ExportPaths {
    pub latest_json: PathBuf,
    pub latest_csv: PathBuf,
    pub feed: PathBuf,
}

impl ExportPaths {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            latest_json: config.latest_json_path(),
            latest_csv: config.latest_csv_path(),
            feed: config.feed_path(),
        }
    }
}

/// Writes all three snapshot files. Each file is replaced whole.
pub fn write_exports(paths: &ExportPaths, items: &[FeedItem], built: DateTime<Utc>) -> Result<()> {
    write_replacing(&paths.latest_json, snapshot_json(items)?.as_bytes())?;
    write_replacing(&paths.latest_csv, items_to_csv(items)?.as_bytes())?;
    write_replacing(&paths.feed, feed_to_rss(items, built)?.as_bytes())?;
    Ok(())
}

pub fn snapshot_json(items: &[FeedItem]) -> Result<String> {
    Ok(serde_json::to_string_pretty(items)?)
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    title: &'a str,
    link: &'a str,
    updated: &'a str,
    category: &'a str,
    #[serde(rename = "formType")]
    form_type: &'a str,
    company: &'a str,
    ticker: &'a str,
    reason: &'a str,
    evidence: String,
}

pub fn items_to_csv(items: &[FeedItem]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    if items.is_empty() {
        wtr.write_record([
            "id", "title", "link", "updated", "category", "formType", "company", "ticker",
            "reason", "evidence",
        ])?;
    }
    for item in items {
        wtr.serialize(CsvRow {
            id: &item.id,
            title: &item.title,
            link: &item.link,
            updated: &item.updated,
            category: &item.category,
            form_type: &item.form_type,
            company: &item.company,
            ticker: &item.ticker,
            reason: &item.reason,
            evidence: item.evidence.join("; "),
        })?;
    }
    let buf = wtr.into_inner().map_err(|e| anyhow::anyhow!("csv flush: {}", e))?;
    Ok(String::from_utf8(buf)?)
}

#[derive(Serialize)]
struct Description<'a> {
    reason: &'a str,
    evidence: &'a [String],
}

/// RSS 2.0 document for the first [`FEED_ITEM_LIMIT`] items.
pub fn feed_to_rss(items: &[FeedItem], built: DateTime<Utc>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("rss").with_attributes([("version", "2.0")]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;
    text_element(&mut writer, "title", FEED_TITLE)?;
    text_element(&mut writer, "link", FEED_LINK)?;
    text_element(&mut writer, "description", FEED_DESCRIPTION)?;
    text_element(&mut writer, "lastBuildDate", &built.to_rfc2822())?;

    for item in items.iter().take(FEED_ITEM_LIMIT) {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &item.title)?;
        if !item.link.is_empty() {
            text_element(&mut writer, "link", &item.link)?;
        }
        writer.write_event(Event::Start(
            BytesStart::new("guid").with_attributes([("isPermaLink", "false")]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(&item.id)))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;
        if let Some(date) = pub_date(&item.updated) {
            text_element(&mut writer, "pubDate", &date)?;
        }
        if !item.category.is_empty() {
            text_element(&mut writer, "category", &item.category)?;
        }
        let description = serde_json::to_string(&Description {
            reason: &item.reason,
            evidence: &item.evidence,
        })?;
        text_element(&mut writer, "description", &description)?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let buf = writer.into_inner().into_inner();
    Ok(String::from_utf8(buf)?)
}

fn text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// RFC 2822 form of an ISO-8601 timestamp; unparseable values pass through.
fn pub_date(updated: &str) -> Option<String> {
    let updated = updated.trim();
    if updated.is_empty() {
        return None;
    }
    Some(
        DateTime::parse_from_rfc3339(updated)
            .map(|d| d.to_rfc2822())
            .unwrap_or_else(|_| updated.to_string()),
    )
}

/// Writes through a sibling temp file and renames it into place.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let tmp = match path.extension() {
        Some(ext) => path.with_extension(format!("{}.tmp", ext.to_string_lossy())),
        None => path.with_extension("tmp"),
    };
    let mut f = fs::File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    f.write_all(bytes)
        .and_then(|_| f.sync_all())
        .with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sec_bullish_lib::feed::feed_id;
    use tempfile::TempDir;

    use super::*;

    fn item(company: &str, reason: &str) -> FeedItem {
        let title = format!("8-K - {}", company);
        let link = format!("https://www.sec.gov/f/{}", company);
        FeedItem {
            id: feed_id(&title, &link),
            title,
            link,
            updated: "2024-05-02T08:30:00-04:00".to_string(),
            reason: reason.to_string(),
            evidence: vec!["share repurchase".to_string(), "repurchase".to_string()],
            category: "8k".to_string(),
            form_type: "8-K".to_string(),
            company: company.to_string(),
            ticker: "ACME".to_string(),
        }
    }

    fn built() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 13, 0, 0).unwrap()
    }

    #[test]
    fn rss_is_wellformed_with_channel_metadata() {
        let xml = feed_to_rss(&[item("Acme", "8-K keywords match (repurchase)")], built()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<rss version=\"2.0\">"));
        assert!(xml.contains("<title>SEC Bullish Monitor</title>"));
        assert!(xml.contains("May 2024 13:00:00 +0000</lastBuildDate>"));
        assert!(xml.contains("<title>8-K - Acme</title>"));
        assert!(xml.contains("<guid isPermaLink=\"false\">"));
        assert!(xml.contains("<pubDate>Thu, "));
        assert!(xml.contains("May 2024 08:30:00 -0400</pubDate>"));
        assert!(xml.trim_end().ends_with("</rss>"));
    }

    #[test]
    fn rss_description_carries_escaped_reason_json() {
        let xml = feed_to_rss(&[item("A&B", "8-K keywords match (buyback)")], built()).unwrap();
        assert!(xml.contains("<title>8-K - A&amp;B</title>"));
        assert!(xml.contains("{&quot;reason&quot;:&quot;8-K keywords match (buyback)&quot;"));
        assert!(xml.contains("&quot;evidence&quot;:[&quot;share repurchase&quot;"));
    }

    #[test]
    fn rss_is_capped() {
        let items: Vec<FeedItem> = (0..150).map(|i| item(&format!("Co{}", i), "r")).collect();
        let xml = feed_to_rss(&items, built()).unwrap();
        assert_eq!(xml.matches("<item>").count(), FEED_ITEM_LIMIT);
        assert!(xml.contains("Co119"));
        assert!(!xml.contains("Co120"));
    }

    #[test]
    fn empty_feed_still_has_channel() {
        let xml = feed_to_rss(&[], built()).unwrap();
        assert!(xml.contains("<channel>"));
        assert_eq!(xml.matches("<item>").count(), 0);
    }

    #[test]
    fn pub_date_passes_through_unparseable_values() {
        assert_eq!(pub_date(""), None);
        assert_eq!(pub_date("yesterday").as_deref(), Some("yesterday"));
    }

    #[test]
    fn csv_has_header_and_joined_evidence() {
        let csv = items_to_csv(&[item("Acme", "r")]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,title,link,updated,category,formType,company,ticker,reason,evidence"
        );
        assert!(lines.next().unwrap().ends_with("r,share repurchase; repurchase"));
    }

    #[test]
    fn empty_csv_has_header_only() {
        let csv = items_to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn exports_replace_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let paths = ExportPaths {
            latest_json: dir.path().join("data/bullish_latest.json"),
            latest_csv: dir.path().join("data/bullish_latest.csv"),
            feed: dir.path().join("public/feed.xml"),
        };
        write_exports(&paths, &[item("Acme", "r"), item("Beta", "r")], built()).unwrap();
        write_exports(&paths, &[item("Gamma", "r")], built()).unwrap();

        let json: Vec<FeedItem> =
            serde_json::from_str(&fs::read_to_string(&paths.latest_json).unwrap()).unwrap();
        assert_eq!(json.len(), 1);
        assert_eq!(json[0].company, "Gamma");
        assert!(fs::read_to_string(&paths.feed).unwrap().contains("Gamma"));
        assert!(!paths.latest_json.with_extension("json.tmp").exists());
    }
}
