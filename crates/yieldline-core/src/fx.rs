//! Historical daily FX rates with a static fallback.
//!
//! Resolved rates are cached without expiry under `FX_{src}_{tgt}_{date}`.
//! A failed lookup never surfaces as an error: the caller's fallback is used.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::Date;
use tracing::{debug, warn};

use crate::cache::CacheBackend;
use crate::domain::format_date;
use crate::http_client::{HttpClient, HttpRequest};

pub const DEFAULT_FX_FALLBACK: f64 = 0.95;
pub const DEFAULT_FX_BASE_URL: &str = "https://api.exchangerate.host";

/// Where a rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Cache,
    Remote,
    Identity,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FxQuote {
    pub rate: f64,
    pub source: RateSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FxError {
    #[error("fx request failed: {0}")]
    Transport(String),
    #[error("fx API error: {0}")]
    Status(u16),
    #[error("fx response is not valid JSON: {0}")]
    Parse(String),
    #[error("fx response has no usable rate for {0}")]
    MissingRate(String),
}

#[derive(Clone)]
pub struct FxRates {
    cache: Arc<dyn CacheBackend>,
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl FxRates {
    pub fn new(cache: Arc<dyn CacheBackend>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            cache,
            http_client,
            base_url: DEFAULT_FX_BASE_URL.to_owned(),
            timeout_ms: 10_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Rate for converting `source` into `target` on `date`, or `fallback`.
    pub async fn rate(&self, date: Date, source: &str, target: &str, fallback: f64) -> f64 {
        self.quote(date, source, target, fallback).await.rate
    }

    pub async fn quote(&self, date: Date, source: &str, target: &str, fallback: f64) -> FxQuote {
        if source == target {
            return FxQuote {
                rate: 1.0,
                source: RateSource::Identity,
            };
        }

        let key = fx_cache_key(date, source, target);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                if let Some(rate) = usable_rate(&cached) {
                    debug!(%key, rate, "fx cache hit");
                    return FxQuote {
                        rate,
                        source: RateSource::Cache,
                    };
                }
            }
            Ok(None) => {}
            Err(error) => warn!(%key, %error, "fx cache read failed, treating as miss"),
        }

        match self.lookup(date, source, target).await {
            Ok(rate) => {
                if let Err(error) = self.cache.put(&key, Value::from(rate), None).await {
                    warn!(%key, %error, "fx cache write failed");
                }
                FxQuote {
                    rate,
                    source: RateSource::Remote,
                }
            }
            Err(error) => {
                warn!(%key, %error, fallback, "fx lookup failed, using fallback rate");
                FxQuote {
                    rate: fallback,
                    source: RateSource::Fallback,
                }
            }
        }
    }

    /// One remote lookup, no cache and no fallback.
    pub async fn lookup(&self, date: Date, source: &str, target: &str) -> Result<f64, FxError> {
        let url = format!(
            "{}/{}?base={}&symbols={}",
            self.base_url,
            format_date(date),
            urlencoding::encode(source),
            urlencoding::encode(target)
        );
        let request = HttpRequest::get(url).with_timeout_ms(self.timeout_ms);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| FxError::Transport(error.message().to_owned()))?;
        if !response.is_success() {
            return Err(FxError::Status(response.status));
        }

        let payload: Value = serde_json::from_str(&response.body)
            .map_err(|error| FxError::Parse(error.to_string()))?;

        payload
            .get("rates")
            .and_then(|rates| rates.get(target))
            .and_then(usable_rate)
            .ok_or_else(|| FxError::MissingRate(target.to_owned()))
    }
}

pub fn fx_cache_key(date: Date, source: &str, target: &str) -> String {
    format!("FX_{source}_{target}_{}", format_date(date))
}

fn usable_rate(value: &Value) -> Option<f64> {
    value.as_f64().filter(|rate| rate.is_finite() && *rate > 0.0)
}
