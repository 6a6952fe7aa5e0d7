use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// A provider failure that knows whether another attempt can help.
pub trait Retryable: Display {
    fn is_retryable(&self) -> bool;

    /// Wait the provider asked for before the next attempt (`Retry-After`).
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Backoff policy for calls to a text-generation provider
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts including the first one; 0 is treated as 1
    pub max_attempts: u32,
    /// Wait before the first retry, doubled for every retry after it
    pub initial_delay: Duration,
    /// Cap on the computed backoff
    pub max_delay: Duration,
    /// Cap on a wait requested by the provider
    pub max_retry_after: Duration,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(30),
            max_retry_after: Duration::from_secs(60),
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_max_retry_after(mut self, max_retry_after: Duration) -> Self {
        self.max_retry_after = max_retry_after;
        self
    }

    /// Preset: translation calls (3 attempts, 1s then 2s unless the
    /// provider asks for longer, never more than 30s)
    pub fn provider_call() -> Self {
        Self::new(3, Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .with_max_retry_after(Duration::from_secs(30))
    }

    /// Preset: a single attempt, failures surface immediately
    pub fn single_attempt() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Computed wait before retry number `retry` (1-based)
    fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Wait before retry number `retry` after `error`. A provider-requested
    /// wait replaces the computed backoff.
    fn delay_after<E: Retryable>(&self, retry: u32, error: &E) -> Duration {
        match error.retry_after() {
            Some(requested) => requested.min(self.max_retry_after),
            None => self.backoff(retry),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::provider_call()
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts. The last error is returned.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable,
{
    let attempts = config.attempts();
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{}: Succeeded on attempt {}/{}", operation_name, attempt, attempts);
                }
                return Ok(result);
            }
            Err(e) => e,
        };

        if !error.is_retryable() {
            debug!("{}: Not retryable, failing: {}", operation_name, error);
            return Err(error);
        }
        if attempt >= attempts {
            warn!(
                "{}: All {} attempts failed. Last error: {}",
                operation_name, attempts, error
            );
            return Err(error);
        }

        let delay = config.delay_after(attempt, &error);
        warn!(
            "{}: Attempt {}/{} failed ({}), retrying in {:?}",
            operation_name, attempt, attempts, error, delay
        );
        sleep(delay).await;
        attempt += 1;
    }
}
