//! Deterministic fixture articles for the simulated data source
//!
//! The generator produces plausible article batches in each provider's wire
//! shape. Output is a pure function of the request parameters (timestamps
//! aside), so scoring and dedupe behave identically across runs.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::error::FetchError;
use crate::transport::ProviderTransport;
use crate::types::{ProviderRequest, HEADLINE_HUB, NEWSWIRE};

const HEADLINE_TEMPLATES: &[&str] = &[
    "signs new technology partnership",
    "reports quarterly results above expectations",
    "faces regulatory review over market position",
    "announces expansion of regional operations",
    "secures funding for infrastructure project",
    "responds to shifting economic conditions",
];

const DESCRIPTION_LEAD: &str =
    "Officials confirmed the development on Friday, citing sustained demand and \
     ongoing negotiations with regional partners.";

/// Generates deterministic article batches per request
#[derive(Debug, Default, Clone)]
pub struct FixtureGenerator {
    /// Providers that should fail, for exercising partial-failure paths
    failing_providers: Vec<String>,
}

impl FixtureGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the generator fail every request for `provider`
    pub fn with_failing_provider(mut self, provider: impl Into<String>) -> Self {
        self.failing_providers.push(provider.into());
        self
    }

    fn subject(&self, request: &ProviderRequest, index: usize) -> String {
        // Lead with the query/region terms so keyword matching has
        // something to bite on, same as a real relevant result would.
        let query = request.query.as_deref().unwrap_or("industry");
        match &request.region {
            Some(region) if index % 2 == 0 => format!("{} {}", region_name(region), query),
            _ => capitalize(query),
        }
    }

    fn articles(&self, request: &ProviderRequest) -> Vec<(String, String, String, String)> {
        let count = request.page_size.min(10);
        let offset = seed(&request.signature());
        let now = Utc::now();

        (0..count)
            .map(|i| {
                let template = HEADLINE_TEMPLATES[(offset + i) % HEADLINE_TEMPLATES.len()];
                let subject = self.subject(request, i);
                let title = format!("{} {}", subject, template);
                let description = format!(
                    "{} The announcement concerns {} and follows weeks of speculation.",
                    DESCRIPTION_LEAD,
                    subject.to_lowercase()
                );
                let slug: String = title
                    .to_lowercase()
                    .chars()
                    .map(|c| if c.is_alphanumeric() { c } else { '-' })
                    .collect();
                let url = format!("https://{}.example/{}", request.provider, slug);
                let published_at = now - Duration::hours(1 + 2 * i as i64);
                (title, description, url, published_at.to_rfc3339())
            })
            .collect()
    }
}

#[async_trait]
impl ProviderTransport for FixtureGenerator {
    async fn execute(&self, request: &ProviderRequest) -> Result<Value, FetchError> {
        if self.failing_providers.contains(&request.provider) {
            return Err(FetchError::ApiError {
                status: 503,
                message: "simulated outage".to_string(),
            });
        }

        let articles = self.articles(request);

        match request.provider.as_str() {
            NEWSWIRE => {
                let results: Vec<Value> = articles
                    .into_iter()
                    .map(|(title, description, url, ts)| {
                        // NewsWire timestamps are "YYYY-MM-DD HH:MM:SS"
                        let pub_date = ts.replace('T', " ").chars().take(19).collect::<String>();
                        json!({
                            "title": title,
                            "description": description,
                            "link": url,
                            "source_id": format!("{}_desk", request.region.as_deref().unwrap_or("world")),
                            "creator": ["Staff Writer"],
                            "pubDate": pub_date,
                            "category": [request.category.map(|c| c.as_str()).unwrap_or("general")]
                        })
                    })
                    .collect();
                Ok(json!({ "status": "success", "results": results }))
            }
            HEADLINE_HUB => {
                let articles: Vec<Value> = articles
                    .into_iter()
                    .map(|(title, description, url, ts)| {
                        json!({
                            "source": { "name": "Headline Hub" },
                            "author": "Desk Reporter",
                            "title": title,
                            "description": description,
                            "url": url,
                            "publishedAt": ts
                        })
                    })
                    .collect();
                Ok(json!({
                    "status": "ok",
                    "totalResults": articles.len(),
                    "articles": articles
                }))
            }
            other => Err(FetchError::InvalidConfig(format!(
                "Unknown provider: {other}"
            ))),
        }
    }
}

fn seed(signature: &str) -> usize {
    signature.bytes().fold(0usize, |acc, b| {
        acc.wrapping_mul(31).wrapping_add(b as usize)
    })
}

fn capitalize(word: &str) -> String {
    match word.chars().next() {
        Some(first) => format!("{}{}", first.to_uppercase(), &word[first.len_utf8()..]),
        None => word.to_string(),
    }
}

fn region_name(code: &str) -> String {
    match code {
        "de" => "Germany".to_string(),
        "fr" => "France".to_string(),
        "jp" => "Japan".to_string(),
        "us" => "United States".to_string(),
        "gb" => "United Kingdom".to_string(),
        other => capitalize(other),
    }
}
