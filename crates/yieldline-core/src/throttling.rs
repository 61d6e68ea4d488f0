use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tracing::debug;

use crate::provider_policy::{BackoffPolicy, ProviderPolicy};

type KeyedRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Request budget tracked separately for every API key of one provider,
/// with capped exponential waits.
#[derive(Clone)]
pub struct ThrottlingQueue {
    limiter: Arc<KeyedRateLimiter>,
    retry_backoff: BackoffPolicy,
}

impl std::fmt::Debug for ThrottlingQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottlingQueue")
            .field("retry_backoff", &self.retry_backoff)
            .finish_non_exhaustive()
    }
}

impl ThrottlingQueue {
    pub fn new(quota_window: Duration, quota_limit: u32, retry_backoff: BackoffPolicy) -> Self {
        let quota = quota_from_window(quota_window, quota_limit);
        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            retry_backoff,
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(
            policy.quota_window,
            policy.quota_limit,
            policy.retry_backoff.clone(),
        )
    }

    /// Takes one unit of `key`'s budget, or returns the recommended wait.
    pub fn acquire(&self, key: &str) -> Result<(), Duration> {
        if self.limiter.check_key(&key.to_owned()).is_ok() {
            return Ok(());
        }
        Err(self.retry_delay(0).unwrap_or(self.retry_backoff.max_delay))
    }

    /// Waits for `key`'s budget, sleeping between checks.
    ///
    /// Returns `Err` with the last recommended delay once `max_retries` waits are spent.
    pub async fn wait_turn(&self, key: &str) -> Result<(), Duration> {
        let key = key.to_owned();
        let mut retry_count = 0;
        loop {
            if self.limiter.check_key(&key).is_ok() {
                return Ok(());
            }

            let Some(delay) = self.retry_delay(retry_count) else {
                return Err(self.retry_backoff.max_delay);
            };
            debug!(%key, retry_count, delay_ms = delay.as_millis() as u64, "throttled, waiting");
            tokio::time::sleep(delay).await;
            retry_count = retry_count.saturating_add(1);
        }
    }

    pub fn retry_delay(&self, retry_count: u32) -> Option<Duration> {
        if retry_count > self.retry_backoff.max_retries {
            return None;
        }

        let scale = self.retry_backoff.multiplier.powf(f64::from(retry_count));
        let seconds = self.retry_backoff.initial_delay.as_secs_f64() * scale;
        let capped_seconds = seconds.min(self.retry_backoff.max_delay.as_secs_f64());
        Some(Duration::from_secs_f64(capped_seconds))
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = quota_limit.max(1);
    let burst = NonZeroU32::new(safe_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(burst)
}
