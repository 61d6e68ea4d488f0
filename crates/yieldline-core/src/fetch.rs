//! Cache-first provider fetch with ordered credential fallback.
//!
//! ```text
//! cache hit ──────────────────────────────────────────────▶ value
//!     │ miss
//!     ▼
//! key[0] ─402/error─▶ key[1] ─402/error─▶ … ─▶ key[n-1]
//!   │ 2xx               │ 2xx                    │ 2xx / error propagates
//!   ▼                   ▼                        ▼
//! store non-empty payload with TTL, return it
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheBackend, CacheMode, DEFAULT_TTL};
use crate::credentials::{Credential, CredentialSet, PropertySource};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::ThrottlingQueue;
use crate::{Provider, Ticker};

/// HTTP status providers use to signal an exhausted key quota.
pub const QUOTA_EXHAUSTED_STATUS: u16 = 402;

/// Tunables for [`DataFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Lifetime of cached provider payloads.
    pub ttl: Duration,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Upper bound on credentials tried per call.
    pub max_attempts: usize,
    /// Apply per-key request budgets before each attempt.
    pub throttling: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            timeout_ms: 10_000,
            max_attempts: 8,
            throttling: true,
        }
    }
}

/// Failure of the fetch pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("All {provider} API keys exhausted or failed")]
    ProviderExhausted { provider: Provider, attempts: usize },

    #[error("API error: {status}")]
    Status { provider: Provider, status: u16 },

    #[error("{message}")]
    Transport { provider: Provider, message: String },

    #[error("Invalid JSON from {provider}: {message}")]
    Parse { provider: Provider, message: String },
}

impl FetchError {
    pub const fn provider(&self) -> Provider {
        match self {
            Self::ProviderExhausted { provider, .. }
            | Self::Status { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Parse { provider, .. } => *provider,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::ProviderExhausted { .. } => "fetch.provider_exhausted",
            Self::Status { .. } => "fetch.status",
            Self::Transport { .. } => "fetch.transport",
            Self::Parse { .. } => "fetch.parse",
        }
    }
}

/// A fetched payload plus how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub value: Value,
    pub cache_hit: bool,
    /// Credentials tried; zero on a cache hit.
    pub attempts: usize,
}

enum Attempt {
    Payload(Value),
    QuotaExhausted,
}

/// Cache-first, key-rotating provider client.
#[derive(Clone)]
pub struct DataFetcher {
    cache: Arc<dyn CacheBackend>,
    http_client: Arc<dyn HttpClient>,
    properties: Arc<dyn PropertySource>,
    config: FetchConfig,
    throttles: Arc<HashMap<Provider, ThrottlingQueue>>,
}

impl DataFetcher {
    pub fn new(
        cache: Arc<dyn CacheBackend>,
        http_client: Arc<dyn HttpClient>,
        properties: Arc<dyn PropertySource>,
    ) -> Self {
        let throttles = Provider::ALL
            .into_iter()
            .map(|provider| {
                let policy = ProviderPolicy::default_for(provider);
                (provider, ThrottlingQueue::from_policy(&policy))
            })
            .collect();

        Self {
            cache,
            http_client,
            properties,
            config: FetchConfig::default(),
            throttles: Arc::new(throttles),
        }
    }

    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn CacheBackend> {
        &self.cache
    }

    pub fn http_client(&self) -> &Arc<dyn HttpClient> {
        &self.http_client
    }

    pub fn properties(&self) -> &Arc<dyn PropertySource> {
        &self.properties
    }

    /// Payload for `{provider}/{endpoint}/{ticker}`, from cache when live.
    pub async fn fetch(
        &self,
        ticker: &Ticker,
        provider: Provider,
        endpoint: &str,
    ) -> Result<Value, FetchError> {
        self.fetch_with_meta(ticker, provider, endpoint, CacheMode::Use)
            .await
            .map(|outcome| outcome.value)
    }

    pub async fn fetch_with_meta(
        &self,
        ticker: &Ticker,
        provider: Provider,
        endpoint: &str,
        mode: CacheMode,
    ) -> Result<FetchOutcome, FetchError> {
        let key = provider.cache_key(endpoint, ticker);

        if mode.reads() {
            match self.cache.get(&key).await {
                Ok(Some(value)) if is_present(&value) => {
                    debug!(%key, "cache hit");
                    return Ok(FetchOutcome {
                        value,
                        cache_hit: true,
                        attempts: 0,
                    });
                }
                Ok(_) => debug!(%key, "cache miss"),
                Err(error) => {
                    warn!(%key, backend = self.cache.name(), %error, "cache read failed, treating as miss")
                }
            }
        }

        let credentials =
            CredentialSet::resolve(self.properties.as_ref(), provider.credential_property());
        if credentials.is_empty() {
            warn!(%provider, property = credentials.property(), "no API keys configured");
            return Err(FetchError::ProviderExhausted {
                provider,
                attempts: 0,
            });
        }

        let budget = credentials.len().min(self.config.max_attempts.max(1));
        let mut attempts = 0;

        for (index, credential) in credentials.iter().take(budget).enumerate() {
            let is_last = index + 1 == budget;
            if !self.take_turn(provider, credential, is_last).await {
                continue;
            }
            attempts += 1;

            match self.attempt(ticker, provider, endpoint, credential).await {
                Ok(Attempt::Payload(value)) => {
                    if mode.writes() && is_present(&value) {
                        self.store(&key, value.clone()).await;
                    }
                    return Ok(FetchOutcome {
                        value,
                        cache_hit: false,
                        attempts,
                    });
                }
                Ok(Attempt::QuotaExhausted) => {
                    info!(
                        credential = credential.label(),
                        "API quota exhausted, trying next key"
                    );
                }
                Err(error) if is_last => return Err(error),
                Err(error) => {
                    warn!(credential = credential.label(), %error, "request failed, trying next key");
                }
            }
        }

        if budget < credentials.len() {
            warn!(
                %provider,
                budget,
                configured = credentials.len(),
                "attempt budget spent before all keys were tried"
            );
        }

        Err(FetchError::ProviderExhausted { provider, attempts })
    }

    /// Spends one unit of `credential`'s request budget.
    ///
    /// A key over its budget is skipped while later keys remain; only the
    /// last key waits for budget to free up.
    async fn take_turn(&self, provider: Provider, credential: &Credential, is_last: bool) -> bool {
        if !self.config.throttling {
            return true;
        }
        let Some(queue) = self.throttles.get(&provider) else {
            return true;
        };

        match queue.acquire(credential.label()) {
            Ok(()) => true,
            Err(_) if !is_last => {
                debug!(
                    credential = credential.label(),
                    "key over its request budget, trying next key"
                );
                false
            }
            Err(_) => match queue.wait_turn(credential.label()).await {
                Ok(()) => true,
                Err(retry_after) => {
                    warn!(
                        credential = credential.label(),
                        retry_after_ms = retry_after.as_millis() as u64,
                        "last key still over its request budget"
                    );
                    false
                }
            },
        }
    }

    async fn attempt(
        &self,
        ticker: &Ticker,
        provider: Provider,
        endpoint: &str,
        credential: &Credential,
    ) -> Result<Attempt, FetchError> {
        let request = HttpRequest::get(provider.url(endpoint, ticker, credential.secret()))
            .with_timeout_ms(self.config.timeout_ms);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| FetchError::Transport {
                provider,
                message: error.message().to_owned(),
            })?;

        if response.is_success() {
            let value: Value =
                serde_json::from_str(&response.body).map_err(|error| FetchError::Parse {
                    provider,
                    message: error.to_string(),
                })?;

            if is_quota_notice(provider, &value) {
                return Ok(Attempt::QuotaExhausted);
            }
            return Ok(Attempt::Payload(value));
        }

        if response.status == QUOTA_EXHAUSTED_STATUS {
            return Ok(Attempt::QuotaExhausted);
        }

        Err(FetchError::Status {
            provider,
            status: response.status,
        })
    }

    async fn store(&self, key: &str, value: Value) {
        if let Err(error) = self.cache.put(key, value, Some(self.config.ttl)).await {
            warn!(%key, backend = self.cache.name(), %error, "cache write failed");
        }
    }
}

/// Whether a payload carries data worth caching and returning from cache.
///
/// `null`, `false`, `0`, `""`, `[]` and `{}` count as empty.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// AlphaVantage answers 200 with a lone `Note`/`Information` message when a key is over quota.
fn is_quota_notice(provider: Provider, value: &Value) -> bool {
    if provider != Provider::Alphavantage {
        return false;
    }

    value.as_object().is_some_and(|fields| {
        fields.len() == 1 && (fields.contains_key("Note") || fields.contains_key("Information"))
    })
}
