use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;
use yieldline_core::{FetchError, MetricError, Provider};

/// Standard response envelope for every `yieldline` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeMeta {
    pub request_id: String,
    /// RFC3339, UTC.
    pub generated_at: String,
    pub latency_ms: u64,
    pub cache_hit: bool,
    pub provider_chain: Vec<Provider>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EnvelopeMeta {
    pub fn new(provider_chain: Vec<Provider>, latency_ms: u64, cache_hit: bool) -> Self {
        Self {
            request_id: Uuid::new_v4().hyphenated().to_string(),
            generated_at: now_rfc3339(),
            latency_ms,
            cache_hit,
            provider_chain,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Structured error for a failed or partial result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Provider>,
}

impl EnvelopeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retryable: None,
            source: None,
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }

    pub fn with_source(mut self, source: Provider) -> Self {
        self.source = Some(source);
        self
    }
}

impl From<&MetricError> for EnvelopeError {
    fn from(error: &MetricError) -> Self {
        let envelope_error = Self::new(error.code(), error.to_string());
        match error {
            MetricError::Fetch(fetch) => envelope_error
                .with_retryable(is_retryable(fetch))
                .with_source(fetch.provider()),
            _ => envelope_error.with_retryable(false),
        }
    }
}

fn is_retryable(error: &FetchError) -> bool {
    matches!(
        error,
        FetchError::ProviderExhausted { .. } | FetchError::Transport { .. }
    )
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
