//! Request pacing
//!
//! Clarivate throttles each API key per second, with the allowance depending on
//! the key's tier (see [`ApiKey::default_rate_limit`](crate::ApiKey::default_rate_limit)).
//! Requests over the allowance are answered with HTTP 429, so the client waits
//! for a token before every request instead.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, instrument};

use crate::error::{Result, WosError};

/// Token bucket shared by all clones of a client
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<TokenBucket>>,
}

struct TokenBucket {
    tokens: f64,
    capacity: f64,
    per_second: f64,
    refilled_at: Instant,
}

impl TokenBucket {
    fn refill(&mut self) {
        let now = Instant::now();
        let earned = now.duration_since(self.refilled_at).as_secs_f64() * self.per_second;
        self.tokens = (self.tokens + earned).min(self.capacity);
        self.refilled_at = now;
    }

    /// Take a token, or report how long until one is earned
    fn try_take(&mut self) -> std::result::Result<(), Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / self.per_second))
        }
    }
}

impl RateLimiter {
    /// Allow `per_second` requests per second, with bursts of up to that many
    ///
    /// ```
    /// use wos_client_rs::rate_limit::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(2.0);
    /// ```
    pub fn new(per_second: f64) -> Self {
        let capacity = per_second.max(1.0);
        Self {
            bucket: Arc::new(Mutex::new(TokenBucket {
                tokens: capacity,
                capacity,
                per_second,
                refilled_at: Instant::now(),
            })),
        }
    }

    /// Wait until a request may be sent
    ///
    /// Fails with `RateLimitExceeded` if the limiter never refills (a rate of
    /// zero or less), since waiting would never end.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<()> {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                let refills = bucket.per_second > 0.0;
                if !refills && bucket.tokens < 1.0 {
                    return Err(WosError::RateLimitExceeded);
                }
                match bucket.try_take() {
                    Ok(()) => return Ok(()),
                    Err(wait) => wait,
                }
            };

            debug!(wait_ms = wait.as_millis() as u64, "Waiting for rate limit");
            sleep(wait).await;
        }
    }

    /// Requests allowed per second
    pub async fn per_second(&self) -> f64 {
        self.bucket.lock().await.per_second
    }
}
