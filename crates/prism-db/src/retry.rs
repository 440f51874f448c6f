//! Bounded exponential backoff.
//!
//! Aggregate recomputation retries failed attempts with a doubling delay
//! capped at `max_delay`. After `max_attempts` the last error is returned and
//! the caller decides how to degrade.

use std::future::Future;
use std::time::Duration;

use prism_config::AggregateConfig;

use crate::error::DatabaseError;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&AggregateConfig::default())
    }
}

impl From<&AggregateConfig> for RetryConfig {
    fn from(config: &AggregateConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Storage-level failures worth another attempt.
///
/// Lookups that missed and rejected requests are final; anything from the
/// engine itself (busy, locked, I/O, a vanished table) is retried.
#[must_use]
pub const fn is_retryable(e: &DatabaseError) -> bool {
    matches!(
        e,
        DatabaseError::LibSql(_) | DatabaseError::Query(_) | DatabaseError::Other(_)
    )
}

/// Run `op` until it succeeds, `retryable` rejects the error, or attempts run
/// out.
///
/// # Errors
///
/// Returns the error from the final attempt.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    retryable: impl Fn(&DatabaseError) -> bool,
    mut op: F,
) -> Result<T, DatabaseError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DatabaseError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_attempts && retryable(&e) => {
                let delay = config.delay_for(attempt);
                tracing::debug!(attempt, ?delay, error = %e, "retrying after failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
