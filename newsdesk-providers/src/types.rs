//! Wire types for the supported content providers

use newsdesk_core::Category;
use serde::{Deserialize, Serialize};

/// Provider speaking the NewsData-style wire shape (`link`/`pubDate` fields)
pub const NEWSWIRE: &str = "newswire";

/// Provider speaking the NewsAPI-style wire shape (`url`/`publishedAt` fields)
pub const HEADLINE_HUB: &str = "headlinehub";

/// How quickly a request's data goes stale; selects the cache tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    /// Minutes (latest headlines, quotes)
    Fast,
    /// Tens of minutes (search/listing results)
    Medium,
    /// Hours (near-static reference data)
    Slow,
}

/// One outbound provider request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    /// Provider name (see [`NEWSWIRE`], [`HEADLINE_HUB`])
    pub provider: String,
    /// Free-text query
    pub query: Option<String>,
    /// Region/country code filter
    pub region: Option<String>,
    /// Category filter
    pub category: Option<Category>,
    /// Page size
    pub page_size: usize,
    /// Declared volatility of the response payload
    pub volatility: Volatility,
}

impl ProviderRequest {
    /// Canonical cache key for this request
    ///
    /// Two requests with identical parameters always share a signature, so
    /// a cache hit bypasses the provider budget entirely.
    pub fn signature(&self) -> String {
        format!(
            "{}?q={}&region={}&category={}&size={}",
            self.provider,
            self.query.as_deref().unwrap_or(""),
            self.region.as_deref().unwrap_or(""),
            self.category.map(|c| c.as_str()).unwrap_or(""),
            self.page_size,
        )
    }
}

// ============================================================================
// NewsWire (NewsData-style) wire shape
// ============================================================================

/// NewsWire response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct NewsWireResponse {
    /// "success" or "error"
    pub status: String,
    /// Raw articles
    #[serde(default)]
    pub results: Vec<NewsWireArticle>,
}

/// A raw NewsWire article
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NewsWireArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Article URL
    pub link: Option<String>,
    /// Source identifier (domain-ish slug)
    pub source_id: Option<String>,
    /// Authors
    #[serde(default)]
    pub creator: Option<Vec<String>>,
    /// Publication timestamp, "YYYY-MM-DD HH:MM:SS" in UTC
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
    /// Category tags
    #[serde(default)]
    pub category: Option<Vec<String>>,
}

// ============================================================================
// HeadlineHub (NewsAPI-style) wire shape
// ============================================================================

/// HeadlineHub response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct HeadlineHubResponse {
    /// "ok" or "error"
    pub status: String,
    #[serde(rename = "totalResults", default)]
    pub total_results: usize,
    #[serde(default)]
    pub articles: Vec<HeadlineHubArticle>,
}

/// A raw HeadlineHub article
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HeadlineHubArticle {
    pub source: Option<HeadlineHubSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Publication timestamp, ISO 8601
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
}

/// HeadlineHub source descriptor
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HeadlineHubSource {
    pub name: Option<String>,
}
