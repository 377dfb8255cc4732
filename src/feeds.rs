use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::Feed;
use crate::error::Result;
use crate::importer::synthetic_id;
use crate::models::FeedItem;
use crate::retry::{retry, Backoff};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

// JSON Feed shape: { "items": [ { "id"?, "title", "url", "date_published" } ] }
#[derive(Debug, Deserialize)]
struct FeedDoc {
    #[serde(default)]
    items: Vec<ItemDto>,
}

#[derive(Debug, Deserialize)]
struct ItemDto {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    date_published: Option<String>,
}

/// Parse a feed document. Items missing a title or a parseable date are
/// skipped rather than failing the feed; missing ids are synthesized.
pub fn parse_feed(body: &str, feed_name: &str) -> Result<Vec<FeedItem>> {
    let doc: FeedDoc = serde_json::from_str(body)?;
    let total = doc.items.len();

    let items: Vec<FeedItem> = doc
        .items
        .into_iter()
        .filter_map(|dto| item_from_dto(dto, feed_name))
        .collect();
    if items.len() < total {
        log::warn!(
            "{feed_name}: skipped {} items without title or date",
            total - items.len()
        );
    }
    Ok(items)
}

fn item_from_dto(dto: ItemDto, feed_name: &str) -> Option<FeedItem> {
    let title = dto.title.filter(|t| !t.trim().is_empty())?;
    let published = dto
        .date_published
        .and_then(|d| DateTime::parse_from_rfc3339(&d).ok())
        .map(|d| d.with_timezone(&Utc))?;
    let url = dto.url.unwrap_or_default();
    let id = dto
        .id
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| synthetic_id(&[url.as_str(), title.as_str()]));
    Some(FeedItem {
        id,
        title,
        url,
        published,
        feed: feed_name.to_string(),
    })
}

/// Fetch one feed over HTTP with the shared retry policy.
pub fn fetch(feed: &Feed) -> Result<Vec<FeedItem>> {
    let http = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()?;
    let body = retry(&format!("feed {}", feed.name), &Backoff::default(), || {
        let response = http.get(&feed.url).send()?;
        let response = response.error_for_status()?;
        Ok::<String, reqwest::Error>(response.text()?)
    })?;
    parse_feed(&body, &feed.name)
}

/// Read a previously saved feed document from disk; the file stem names
/// the feed.
pub fn read_file(path: &std::path::Path) -> Result<Vec<FeedItem>> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file")
        .to_string();
    let body = std::fs::read_to_string(path)?;
    parse_feed(&body, &name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_items() {
        let body = r#"{
            "title": "Example Feed",
            "items": [
                {
                    "id": "item-1",
                    "title": "Atlanta Mayor announces new plan",
                    "url": "https://example.org/1",
                    "date_published": "2025-01-10T08:30:00Z"
                },
                {
                    "title": "No id, still fine",
                    "url": "https://example.org/2",
                    "date_published": "2025-01-10T09:00:00-05:00"
                }
            ]
        }"#;
        let items = parse_feed(body, "news").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "item-1");
        assert_eq!(items[0].feed, "news");
        assert_eq!(items[1].id.len(), 12);
        assert_eq!(
            items[1].published.to_rfc3339(),
            "2025-01-10T14:00:00+00:00"
        );
    }

    #[test]
    fn test_parse_feed_skips_incomplete_items() {
        let body = r#"{
            "items": [
                { "title": "Has no date", "url": "https://example.org/1" },
                { "url": "https://example.org/2", "date_published": "2025-01-10T08:30:00Z" },
                { "title": "  ", "url": "https://example.org/3", "date_published": "2025-01-10T08:30:00Z" },
                { "title": "Keeper", "url": "https://example.org/4", "date_published": "2025-01-10T08:30:00Z" }
            ]
        }"#;
        let items = parse_feed(body, "news").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Keeper");
    }

    #[test]
    fn test_parse_feed_empty_document() {
        let items = parse_feed("{}", "news").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_parse_feed_bad_json_is_an_error() {
        assert!(parse_feed("not json", "news").is_err());
    }

    #[test]
    fn test_read_file_names_feed_after_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hn.json");
        std::fs::write(
            &path,
            r#"{"items":[{"title":"T","url":"u","date_published":"2025-01-10T08:30:00Z"}]}"#,
        )
        .unwrap();
        let items = read_file(&path).unwrap();
        assert_eq!(items[0].feed, "hn");
    }
}
