//! Identity-key deduplication

use std::collections::HashSet;

use tracing::debug;

use newsdesk_core::Item;

/// Collapse items sharing an identity key, first occurrence wins.
///
/// Iteration order is preserved for survivors; losers are discarded, never
/// merged into the survivor or retried.
pub fn dedupe(items: Vec<Item>) -> Vec<Item> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let before = items.len();

    let unique: Vec<Item> = items
        .into_iter()
        .filter(|item| seen.insert(item.identity_key.clone()))
        .collect();

    if unique.len() != before {
        debug!("Dedupe removed {} of {} items", before - unique.len(), before);
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use newsdesk_core::{Category, Provenance, Strategy};
    use std::collections::BTreeSet;

    fn item(title: &str, url: &str, provider: &str) -> Item {
        Item {
            identity_key: newsdesk_providers::identity_key(url, title),
            title: title.to_string(),
            description: "A description comfortably past the length floor.".to_string(),
            url: url.to_string(),
            source: "Example".to_string(),
            author: None,
            published_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
            partition: "de".to_string(),
            category: Category::General,
            topical_score: 0,
            region_relevance: 0,
            keywords: BTreeSet::new(),
            entities: BTreeSet::new(),
            provenance: Provenance {
                provider: provider.to_string(),
                strategy: Strategy::Broad,
            },
        }
    }

    /// Five raw items where items 2 and 4 share a URL: exactly four unique
    /// entries survive and the earlier-arriving duplicate is kept.
    #[test]
    fn first_occurrence_wins() {
        let items = vec![
            item("First independent story here", "https://example.com/1", "newswire"),
            item("Shared story appearing twice", "https://example.com/shared", "newswire"),
            item("Third independent story here", "https://example.com/3", "newswire"),
            item("Shared story appearing twice", "https://example.com/shared", "headlinehub"),
            item("Fifth independent story here", "https://example.com/5", "newswire"),
        ];

        let unique = dedupe(items);

        assert_eq!(unique.len(), 4);
        let shared: Vec<&Item> = unique
            .iter()
            .filter(|i| i.url == "https://example.com/shared")
            .collect();
        assert_eq!(shared.len(), 1);
        // The first arrival (from newswire) survived
        assert_eq!(shared[0].provenance.provider, "newswire");
    }

    #[test]
    fn no_two_survivors_share_an_identity_key() {
        let items = vec![
            item("Duplicate headline exactly", "https://example.com/a", "newswire"),
            item("Duplicate headline exactly", "https://example.com/a", "newswire"),
            item("Another headline entirely", "https://example.com/b", "newswire"),
        ];
        let unique = dedupe(items);
        let keys: HashSet<&str> = unique.iter().map(|i| i.identity_key.as_str()).collect();
        assert_eq!(keys.len(), unique.len());
    }

    #[test]
    fn order_is_preserved() {
        let items = vec![
            item("Alpha story headline text", "https://example.com/a", "newswire"),
            item("Beta story headline text", "https://example.com/b", "newswire"),
            item("Gamma story headline text", "https://example.com/c", "newswire"),
        ];
        let urls: Vec<String> = dedupe(items).into_iter().map(|i| i.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c"
            ]
        );
    }
}
