//! Normalization of provider payloads onto the canonical `Item` shape
//!
//! Each provider gets one adapter implementing [`Normalizer`], selected by
//! provider name. Adapters apply the quality filter and derive the identity
//! key, so an item that leaves this module is pipeline-ready.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use tracing::debug;

use newsdesk_core::{Category, Item, Provenance, Strategy};

use crate::error::NormalizeError;
use crate::types::{
    HeadlineHubArticle, HeadlineHubResponse, NewsWireArticle, NewsWireResponse, HEADLINE_HUB,
    NEWSWIRE,
};

/// Minimum title length accepted by the quality filter
pub const MIN_TITLE_LEN: usize = 15;

/// Minimum description length accepted by the quality filter
pub const MIN_DESCRIPTION_LEN: usize = 30;

/// How much of the case-folded title participates in the identity key
const TITLE_KEY_PREFIX: usize = 60;

/// Maps one provider's payloads onto canonical items
pub trait Normalizer: Send + Sync {
    /// Provider this adapter handles
    fn provider(&self) -> &'static str;

    /// Normalize a full response payload into items.
    ///
    /// Items failing the quality filter are dropped with a debug log; a
    /// payload that does not match the wire shape fails the whole batch.
    fn normalize(
        &self,
        payload: &Value,
        partition: &str,
        strategy: Strategy,
    ) -> Result<Vec<Item>, NormalizeError>;
}

/// Select the adapter for a provider name
pub fn normalizer_for(provider: &str) -> Option<Box<dyn Normalizer>> {
    match provider {
        NEWSWIRE => Some(Box::new(NewsWireNormalizer)),
        HEADLINE_HUB => Some(Box::new(HeadlineHubNormalizer)),
        _ => None,
    }
}

/// Derive the deduplication key from a URL and title.
///
/// The URL is canonicalized (lowercased host, tracking parameters and
/// trailing slash dropped) and combined with a fixed-length prefix of the
/// case-folded, alphanumeric-only title, so two payloads describing the
/// same story collapse even with minor punctuation differences.
pub fn identity_key(url: &str, title: &str) -> String {
    let canonical_url = canonicalize_url(url);

    let title_key: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(TITLE_KEY_PREFIX)
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(canonical_url.as_bytes());
    hasher.update(title_key.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

/// Strip tracking query parameters and normalize case/trailing slash
fn canonicalize_url(raw: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(raw) else {
        return raw.trim().trim_end_matches('/').to_lowercase();
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !k.starts_with("utm_") && k != "ref" && k != "fbclid")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(kept);
        parsed.set_query(Some(&serializer.finish()));
    }

    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    parsed.to_string().to_lowercase()
}

/// Reject items with empty or too-short text
fn quality_check(title: &str, description: &str) -> Result<(), NormalizeError> {
    let title = title.trim();
    let description = description.trim();

    if title.is_empty() {
        return Err(NormalizeError::MissingField("title"));
    }
    if description.is_empty() {
        return Err(NormalizeError::MissingField("description"));
    }
    if title.len() < MIN_TITLE_LEN {
        return Err(NormalizeError::QualityRejected(format!(
            "title too short ({} chars)",
            title.len()
        )));
    }
    if description.len() < MIN_DESCRIPTION_LEN {
        return Err(NormalizeError::QualityRejected(format!(
            "description too short ({} chars)",
            description.len()
        )));
    }
    Ok(())
}

/// Extract a display source name from a URL host
///
/// "https://www.reuters.com/article" -> "Reuters"
pub fn display_source(url: &str) -> String {
    let parsed = url::Url::parse(url).ok();
    let host = parsed.as_ref().and_then(|u| u.host_str()).unwrap_or("Unknown");

    let name = host
        .strip_prefix("www.")
        .unwrap_or(host)
        .split('.')
        .next()
        .unwrap_or(host)
        .to_string();

    match name.chars().next() {
        Some(first) => format!("{}{}", first.to_uppercase(), &name[first.len_utf8()..]),
        None => name,
    }
}

/// Host of a URL, if it parses
pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

fn build_item(
    title: String,
    description: String,
    url: String,
    source: String,
    author: Option<String>,
    published_at: DateTime<Utc>,
    category: Category,
    partition: &str,
    provider: &str,
    strategy: Strategy,
) -> Item {
    Item {
        identity_key: identity_key(&url, &title),
        title,
        description,
        url,
        source,
        author,
        published_at,
        partition: partition.to_string(),
        category,
        topical_score: 0,
        region_relevance: 0,
        keywords: BTreeSet::new(),
        entities: BTreeSet::new(),
        provenance: Provenance {
            provider: provider.to_string(),
            strategy,
        },
    }
}

/// Adapter for the NewsWire wire shape (`link`/`pubDate` fields)
pub struct NewsWireNormalizer;

impl NewsWireNormalizer {
    fn normalize_article(
        &self,
        raw: &NewsWireArticle,
        partition: &str,
        strategy: Strategy,
    ) -> Result<Item, NormalizeError> {
        let title = raw.title.clone().unwrap_or_default();
        let description = raw.description.clone().unwrap_or_default();
        quality_check(&title, &description)?;

        let url = raw
            .link
            .clone()
            .filter(|l| !l.trim().is_empty())
            .ok_or(NormalizeError::MissingField("link"))?;

        let pub_date = raw
            .pub_date
            .as_deref()
            .ok_or(NormalizeError::MissingField("pubDate"))?;
        let published_at = parse_newswire_timestamp(pub_date)?;

        let source = raw
            .source_id
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| display_source(&url));

        let author = raw
            .creator
            .as_ref()
            .and_then(|c| c.first().cloned())
            .filter(|a| !a.is_empty());

        let category = raw
            .category
            .as_ref()
            .and_then(|c| c.first())
            .map(|c| Category::parse(c))
            .unwrap_or(Category::General);

        Ok(build_item(
            title,
            description,
            url,
            source,
            author,
            published_at,
            category,
            partition,
            NEWSWIRE,
            strategy,
        ))
    }
}

impl Normalizer for NewsWireNormalizer {
    fn provider(&self) -> &'static str {
        NEWSWIRE
    }

    fn normalize(
        &self,
        payload: &Value,
        partition: &str,
        strategy: Strategy,
    ) -> Result<Vec<Item>, NormalizeError> {
        let response: NewsWireResponse = serde_json::from_value(payload.clone())
            .map_err(|e| NormalizeError::UnexpectedShape(e.to_string()))?;

        let mut items = Vec::with_capacity(response.results.len());
        for raw in &response.results {
            match self.normalize_article(raw, partition, strategy) {
                Ok(item) => items.push(item),
                Err(e) => {
                    debug!(
                        "Dropping newswire article '{}': {}",
                        raw.title.as_deref().unwrap_or("<untitled>"),
                        e
                    );
                }
            }
        }
        Ok(items)
    }
}

/// Adapter for the HeadlineHub wire shape (`url`/`publishedAt` fields)
pub struct HeadlineHubNormalizer;

impl HeadlineHubNormalizer {
    fn normalize_article(
        &self,
        raw: &HeadlineHubArticle,
        partition: &str,
        strategy: Strategy,
    ) -> Result<Item, NormalizeError> {
        let title = raw.title.clone().unwrap_or_default();
        let description = raw.description.clone().unwrap_or_default();
        quality_check(&title, &description)?;

        let url = raw
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or(NormalizeError::MissingField("url"))?;

        let published_at = raw
            .published_at
            .as_deref()
            .ok_or(NormalizeError::MissingField("publishedAt"))
            .and_then(|ts| {
                DateTime::parse_from_rfc3339(ts)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| NormalizeError::InvalidTimestamp(ts.to_string()))
            })?;

        let source = raw
            .source
            .as_ref()
            .and_then(|s| s.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| display_source(&url));

        let author = raw.author.clone().filter(|a| !a.is_empty());

        Ok(build_item(
            title,
            description,
            url,
            source,
            author,
            published_at,
            Category::General,
            partition,
            HEADLINE_HUB,
            strategy,
        ))
    }
}

impl Normalizer for HeadlineHubNormalizer {
    fn provider(&self) -> &'static str {
        HEADLINE_HUB
    }

    fn normalize(
        &self,
        payload: &Value,
        partition: &str,
        strategy: Strategy,
    ) -> Result<Vec<Item>, NormalizeError> {
        let response: HeadlineHubResponse = serde_json::from_value(payload.clone())
            .map_err(|e| NormalizeError::UnexpectedShape(e.to_string()))?;

        let mut items = Vec::with_capacity(response.articles.len());
        for raw in &response.articles {
            match self.normalize_article(raw, partition, strategy) {
                Ok(item) => items.push(item),
                Err(e) => {
                    debug!(
                        "Dropping headlinehub article '{}': {}",
                        raw.title.as_deref().unwrap_or("<untitled>"),
                        e
                    );
                }
            }
        }
        Ok(items)
    }
}

/// NewsWire timestamps come as "YYYY-MM-DD HH:MM:SS" in UTC
fn parse_newswire_timestamp(ts: &str) -> Result<DateTime<Utc>, NormalizeError> {
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S")
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        .or_else(|_| {
            DateTime::parse_from_rfc3339(ts)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| NormalizeError::InvalidTimestamp(ts.to_string()))
        })
}
