//! Provider transports
//!
//! The pipeline talks to providers through [`ProviderTransport`]. The live
//! implementation issues HTTP GETs; the simulated one replays deterministic
//! fixtures so the whole pipeline runs without credentials. The choice is
//! made once at construction via [`DataSource`], never re-checked per call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::FetchError;
use crate::fixtures::FixtureGenerator;
use crate::types::{ProviderRequest, HEADLINE_HUB, NEWSWIRE};

/// Executes a provider request and returns the raw JSON payload
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    async fn execute(&self, request: &ProviderRequest) -> Result<Value, FetchError>;
}

/// Configuration for the live HTTP transport
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key sent with every request
    pub api_key: String,
    /// Base URL per provider name
    pub base_urls: HashMap<String, String>,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let mut base_urls = HashMap::new();
        base_urls.insert(
            NEWSWIRE.to_string(),
            "https://api.newswire.example/v1/latest".to_string(),
        );
        base_urls.insert(
            HEADLINE_HUB.to_string(),
            "https://hub.headlines.example/v2/everything".to_string(),
        );
        Self {
            api_key: String::new(),
            base_urls,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Where article payloads come from, chosen once at construction
pub enum DataSource {
    /// Real providers over HTTP
    Live(ProviderConfig),
    /// Deterministic fixture articles, no network
    Simulated(FixtureGenerator),
}

impl DataSource {
    /// Build the transport for this source. Fails fast on missing
    /// credentials rather than per request.
    pub fn into_transport(self) -> Result<Arc<dyn ProviderTransport>, FetchError> {
        match self {
            DataSource::Live(config) => Ok(Arc::new(HttpTransport::new(config)?)),
            DataSource::Simulated(generator) => {
                info!("Using simulated data source");
                Ok(Arc::new(generator))
            }
        }
    }
}

/// Live HTTP transport
pub struct HttpTransport {
    client: Client,
    config: ProviderConfig,
}

impl HttpTransport {
    pub fn new(config: ProviderConfig) -> Result<Self, FetchError> {
        if config.api_key.trim().is_empty() {
            return Err(FetchError::InvalidConfig("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent("Mozilla/5.0 (compatible; Newsdesk/0.1)")
            .build()
            .map_err(|e| FetchError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url_for(&self, provider: &str) -> Result<&str, FetchError> {
        self.config
            .base_urls
            .get(provider)
            .map(String::as_str)
            .ok_or_else(|| FetchError::InvalidConfig(format!("Unknown provider: {provider}")))
    }
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    async fn execute(&self, request: &ProviderRequest) -> Result<Value, FetchError> {
        let base_url = self.base_url_for(&request.provider)?;

        let mut params: Vec<(&str, String)> = vec![
            ("apikey", self.config.api_key.clone()),
            ("size", request.page_size.to_string()),
        ];
        if let Some(q) = &request.query {
            params.push(("q", q.clone()));
        }
        if let Some(region) = &request.region {
            params.push(("country", region.clone()));
        }
        if let Some(category) = request.category {
            params.push(("category", category.as_str().to_string()));
        }

        debug!(
            "Fetching {} (q={:?}, region={:?})",
            request.provider, request.query, request.region
        );

        let response = self
            .client
            .get(base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_transport_rejects_empty_api_key() {
        let config = ProviderConfig::default();
        assert!(matches!(
            HttpTransport::new(config),
            Err(FetchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn http_transport_accepts_configured_key() {
        let config = ProviderConfig {
            api_key: "test-key".to_string(),
            ..ProviderConfig::default()
        };
        let transport = HttpTransport::new(config).unwrap();
        assert!(transport.base_url_for(NEWSWIRE).is_ok());
        assert!(transport.base_url_for("nope").is_err());
    }

    #[tokio::test]
    async fn simulated_source_builds_without_credentials() {
        let source = DataSource::Simulated(FixtureGenerator::new());
        assert!(source.into_transport().is_ok());
    }
}
