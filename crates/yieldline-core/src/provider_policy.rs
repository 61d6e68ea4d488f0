use std::time::Duration;

use crate::Provider;

/// Request budget for one provider, shared across all of its keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider: Provider,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub retry_backoff: BackoffPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_retries: u32,
}

impl ProviderPolicy {
    pub fn alphavantage_default() -> Self {
        Self {
            provider: Provider::Alphavantage,
            quota_window: Duration::from_secs(60),
            quota_limit: 5,
            retry_backoff: BackoffPolicy {
                initial_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(15),
                multiplier: 2.0,
                max_retries: 3,
            },
        }
    }

    pub fn eodhd_default() -> Self {
        Self {
            provider: Provider::Eodhd,
            quota_window: Duration::from_secs(60),
            quota_limit: 1_000,
            retry_backoff: BackoffPolicy {
                initial_delay: Duration::from_millis(250),
                max_delay: Duration::from_secs(5),
                multiplier: 2.0,
                max_retries: 3,
            },
        }
    }

    pub fn default_for(provider: Provider) -> Self {
        match provider {
            Provider::Alphavantage => Self::alphavantage_default(),
            Provider::Eodhd => Self::eodhd_default(),
        }
    }
}
