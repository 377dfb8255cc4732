use std::collections::HashSet;

use crate::models::FeedItem;

/// Lowercase and collapse every run of non-alphanumeric characters to a
/// single space, so punctuation and casing differences don't dilute the
/// similarity ratio.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::sorensen_dice(a, b)
}

pub struct DedupOutcome {
    /// Survivors, newest first.
    pub kept: Vec<FeedItem>,
    pub dropped: Vec<FeedItem>,
}

/// Remove duplicate items: exact id collisions first (the same item fetched
/// through overlapping feeds), then near-duplicate titles. The list is
/// scanned newest-first, so when two titles exceed the threshold the older
/// item is the one dropped. O(n^2) over the batch; batches stay in the tens.
pub fn dedupe(mut items: Vec<FeedItem>, threshold: f64) -> DedupOutcome {
    items.sort_by(|a, b| b.published.cmp(&a.published));

    let mut kept: Vec<FeedItem> = Vec::new();
    let mut dropped: Vec<FeedItem> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut accepted_titles: Vec<String> = Vec::new();

    for item in items {
        if !seen_ids.insert(item.id.clone()) {
            dropped.push(item);
            continue;
        }
        let normalized = normalize_title(&item.title);
        let is_duplicate = accepted_titles
            .iter()
            .any(|seen| similarity(seen, &normalized) >= threshold);
        if is_duplicate {
            dropped.push(item);
        } else {
            accepted_titles.push(normalized);
            kept.push(item);
        }
    }

    DedupOutcome { kept, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(title: &str, hour: u32) -> FeedItem {
        FeedItem {
            id: format!("id-{hour}"),
            title: title.to_string(),
            url: format!("https://example.org/{hour}"),
            published: Utc.with_ymd_and_hms(2025, 1, 10, hour, 0, 0).unwrap(),
            feed: "news".to_string(),
        }
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_title("  Atlanta Mayor: announces — new PLAN!  "),
            "atlanta mayor announces new plan"
        );
    }

    #[test]
    fn test_near_duplicate_titles_score_high() {
        let a = normalize_title("Atlanta Mayor announces new plan");
        let b = normalize_title("Atlanta Mayor announces new initiative");
        assert!(similarity(&a, &b) >= 0.7, "got {}", similarity(&a, &b));
    }

    #[test]
    fn test_unrelated_titles_score_low() {
        let a = normalize_title("Atlanta Mayor announces new plan");
        let b = normalize_title("Sports team wins championship");
        assert!(similarity(&a, &b) < 0.3, "got {}", similarity(&a, &b));
    }

    #[test]
    fn test_older_duplicate_is_dropped() {
        let newer = item("Atlanta Mayor announces new plan", 12);
        let older = item("Atlanta Mayor announces new initiative", 8);
        let outcome = dedupe(vec![older, newer], 0.7);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].title, "Atlanta Mayor announces new plan");
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(
            outcome.dropped[0].title,
            "Atlanta Mayor announces new initiative"
        );
    }

    #[test]
    fn test_unrelated_titles_both_kept() {
        let a = item("Atlanta Mayor announces new plan", 12);
        let b = item("Sports team wins championship", 8);
        let outcome = dedupe(vec![a, b], 0.7);
        assert_eq!(outcome.kept.len(), 2);
        assert!(outcome.dropped.is_empty());
    }

    #[test]
    fn test_kept_is_newest_first() {
        let a = item("First story of the morning", 6);
        let b = item("Completely different evening report", 20);
        let outcome = dedupe(vec![a, b], 0.7);
        assert_eq!(outcome.kept[0].published.format("%H").to_string(), "20");
    }

    #[test]
    fn test_duplicate_compares_against_all_accepted() {
        // The third item duplicates the first accepted title, not the second.
        let a = item("Council passes budget amendment", 12);
        let b = item("Rain expected through the weekend", 10);
        let c = item("Council passes budget amendments", 8);
        let outcome = dedupe(vec![a, b, c], 0.7);
        assert_eq!(outcome.kept.len(), 2);
        assert_eq!(outcome.dropped.len(), 1);
    }

    #[test]
    fn test_exact_duplicate_across_feeds() {
        let mut a = item("Identical syndicated headline", 12);
        a.feed = "feed-a".to_string();
        let mut b = item("Identical syndicated headline", 11);
        b.feed = "feed-b".to_string();
        let outcome = dedupe(vec![a, b], 0.7);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].feed, "feed-a");
    }

    #[test]
    fn test_same_id_from_two_feeds_is_dropped() {
        // Unrelated titles, but the same upstream item id.
        let mut a = item("Morning edition lead story", 12);
        a.id = "shared-id".to_string();
        a.feed = "feed-a".to_string();
        let mut b = item("Totally different wire copy", 11);
        b.id = "shared-id".to_string();
        b.feed = "feed-b".to_string();
        let outcome = dedupe(vec![a, b], 0.7);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(outcome.kept[0].feed, "feed-a");
    }

    #[test]
    fn test_empty_input() {
        let outcome = dedupe(Vec::new(), 0.7);
        assert!(outcome.kept.is_empty());
        assert!(outcome.dropped.is_empty());
    }
}
