//! Bounded retry with exponential backoff
//!
//! The Web of Science API answers long-running searches with `504 Gateway
//! Timeout`. Such requests are re-sent unchanged after a delay that doubles
//! on every attempt, up to `max_retries` times; the last error is returned
//! once the budget is spent.

use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tracing::{debug, warn};

/// Errors that know whether the failed operation is worth repeating
pub trait RetryableError {
    /// Whether the same request should be sent again
    fn is_retryable(&self) -> bool;

    /// Short human readable classification, used in logs
    fn retry_reason(&self) -> &str;
}

/// Retry policy for API requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Number of retries after the first attempt (0 disables retrying)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Disable retries entirely
    pub fn disabled() -> Self {
        Self::default().with_max_retries(0)
    }

    /// The sequence of delays slept between attempts
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use wos_client_rs::retry::RetryConfig;
    ///
    /// let config = RetryConfig::new()
    ///     .with_max_retries(4)
    ///     .with_initial_delay(Duration::from_secs(5))
    ///     .with_max_delay(Duration::from_secs(30));
    ///
    /// let delays: Vec<u64> = config.delays().map(|d| d.as_secs()).collect();
    /// assert_eq!(delays, vec![5, 10, 20, 30]);
    /// ```
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let initial = self.initial_delay;
        let max = self.max_delay;
        (0..self.max_retries).map(move |attempt| {
            initial
                .checked_mul(2u32.saturating_pow(attempt))
                .unwrap_or(max)
                .min(max)
        })
    }
}

/// Run `operation`, repeating it while it fails with a retryable error
///
/// `context` names the operation in log output.
pub async fn with_retry<T, E, F, Fut>(
    operation: F,
    config: &RetryConfig,
    context: &str,
) -> Result<T, E>
where
    E: RetryableError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    let max_retries = config.max_retries;

    let result = RetryIf::spawn(config.delays(), operation, |err: &E| {
        if !err.is_retryable() {
            return false;
        }
        attempt += 1;
        if attempt <= max_retries {
            warn!(
                attempt,
                max_retries,
                reason = err.retry_reason(),
                "{} failed, retrying",
                context
            );
        } else {
            warn!(
                attempts = attempt,
                reason = err.retry_reason(),
                "{} failed, giving up",
                context
            );
        }
        true
    })
    .await;

    if result.is_ok() && attempt > 0 {
        debug!(retries = attempt, "{} succeeded after retrying", context);
    }

    result
}
