//! Rate-limited provider client
//!
//! Wraps a transport with the cache-first, budgeted, retried fetch flow:
//! a fresh cache entry for the exact request signature bypasses the budget
//! entirely; otherwise the call acquires a limiter slot, runs under a
//! timeout, and retries transient failures with bounded backoff before
//! surfacing the error to the calling strategy.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use newsdesk_providers::{FetchError, ProviderRequest, ProviderTransport};

use crate::backoff::BackoffPolicy;
use crate::cache::{CacheTier, TieredCache};
use crate::rate_limiter::RateLimiter;

/// Provider client enforcing the per-provider budget and cache tiering
pub struct RateLimitedClient {
    transport: Arc<dyn ProviderTransport>,
    limiter: Arc<RateLimiter>,
    cache: Arc<TieredCache<Value>>,
    backoff: BackoffPolicy,
    call_timeout: Duration,
    calls_made: AtomicU64,
}

impl RateLimitedClient {
    pub fn new(
        transport: Arc<dyn ProviderTransport>,
        limiter: Arc<RateLimiter>,
        cache: Arc<TieredCache<Value>>,
    ) -> Self {
        Self {
            transport,
            limiter,
            cache,
            backoff: BackoffPolicy::default(),
            call_timeout: Duration::from_secs(10),
            calls_made: AtomicU64::new(0),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Fetch a payload, consulting the cache before spending budget
    #[instrument(skip(self), fields(provider = %request.provider))]
    pub async fn fetch(&self, request: &ProviderRequest) -> Result<Value, FetchError> {
        let signature = request.signature();
        let tier = CacheTier::for_volatility(request.volatility);

        if let Some(hit) = self.cache.get(&signature, tier) {
            debug!("Cache hit for {}", signature);
            return Ok(hit);
        }

        let mut attempt: u32 = 0;
        loop {
            self.limiter.acquire().await;
            self.calls_made.fetch_add(1, Ordering::Relaxed);

            let outcome = tokio::time::timeout(self.call_timeout, self.transport.execute(request))
                .await
                .map_err(|_| FetchError::Timeout)
                .and_then(|inner| inner);

            match outcome {
                Ok(payload) => {
                    self.cache.set(signature, payload.clone(), tier);
                    return Ok(payload);
                }
                Err(e) if e.is_transient() && self.backoff.should_retry(attempt) => {
                    let delay = self.backoff.delay_for(attempt);
                    warn!(
                        "Transient failure from {} (attempt {}): {}; retrying in {:?}",
                        request.provider,
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("Giving up on {} after {} attempts: {}", request.provider, attempt + 1, e);
                    return Err(e);
                }
            }
        }
    }

    /// Provider calls actually issued (cache hits excluded)
    pub fn calls_made(&self) -> u64 {
        self.calls_made.load(Ordering::Relaxed)
    }

    /// Limiter statistics for this client's provider budget
    pub fn limiter_stats(&self) -> crate::rate_limiter::RateLimiterStats {
        self.limiter.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use newsdesk_providers::Volatility;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    struct ScriptedTransport {
        calls: AtomicUsize,
        /// Errors to return before succeeding; `None` means always succeed
        failures_before_success: Option<usize>,
        failure: fn() -> FetchError,
    }

    impl ScriptedTransport {
        fn always_ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failures_before_success: Some(0),
                failure: || FetchError::RateLimited,
            }
        }

        fn failing(failure: fn() -> FetchError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failures_before_success: None,
                failure,
            }
        }

        fn flaky(failures: usize, failure: fn() -> FetchError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failures_before_success: Some(failures),
                failure,
            }
        }
    }

    #[async_trait]
    impl ProviderTransport for ScriptedTransport {
        async fn execute(&self, request: &ProviderRequest) -> Result<Value, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.failures_before_success {
                Some(n) if call >= n => Ok(json!({"ok": true, "provider": request.provider})),
                _ => Err((self.failure)()),
            }
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            provider: "newswire".to_string(),
            query: Some("chips".to_string()),
            region: Some("de".to_string()),
            category: None,
            page_size: 5,
            volatility: Volatility::Fast,
        }
    }

    fn client(transport: ScriptedTransport) -> (RateLimitedClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let client = RateLimitedClient::new(
            Arc::clone(&transport) as Arc<dyn ProviderTransport>,
            Arc::new(RateLimiter::new(1, "test")),
            Arc::new(TieredCache::default()),
        )
        .with_backoff(BackoffPolicy {
            initial_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(10),
            max_retries: 3,
        });
        (client, transport)
    }

    #[tokio::test]
    async fn cache_hit_bypasses_transport_and_budget() {
        let (client, transport) = client(ScriptedTransport::always_ok());

        client.fetch(&request()).await.unwrap();
        client.fetch(&request()).await.unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.calls_made(), 1);
    }

    #[tokio::test]
    async fn throttling_surfaces_rate_limited_after_retry_ceiling() {
        let (client, transport) = client(ScriptedTransport::failing(|| FetchError::RateLimited));

        let err = client.fetch(&request()).await.unwrap_err();
        assert!(matches!(err, FetchError::RateLimited));
        // Initial attempt + max_retries
        assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn timeout_is_retried_like_throttling() {
        let (client, transport) = client(ScriptedTransport::flaky(2, || FetchError::Timeout));

        let payload = client.fetch(&request()).await.unwrap();
        assert_eq!(payload["ok"], json!(true));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_error_is_not_retried() {
        let (client, transport) = client(ScriptedTransport::failing(|| FetchError::ApiError {
            status: 401,
            message: "bad key".to_string(),
        }));

        let err = client.fetch(&request()).await.unwrap_err();
        assert!(matches!(err, FetchError::ApiError { status: 401, .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_signatures_do_not_share_cache_entries() {
        let (client, transport) = client(ScriptedTransport::always_ok());

        let mut other = request();
        other.query = Some("autos".to_string());

        client.fetch(&request()).await.unwrap();
        client.fetch(&other).await.unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }
}
