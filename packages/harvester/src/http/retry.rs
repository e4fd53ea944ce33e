//! Exponential backoff with jitter.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::FetchError;

/// Retry policy for transient fetch failures.
///
/// Delay before retry `n` (1-based) is
/// `min(base_delay * exponential_base^(n-1), max_delay)`, multiplied by a
/// uniform factor in `[0.5, 1.5)` when `jitter` is on.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delays(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = base;
        self.max_delay = max;
        self
    }

    pub fn with_exponential_base(mut self, exponential_base: f64) -> Self {
        self.exponential_base = exponential_base;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry `attempt` without jitter.
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.base_delay.as_secs_f64() * self.exponential_base.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());
        if capped.is_finite() && capped > 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            Duration::ZERO
        }
    }

    /// Delay before retry `attempt`, jittered when enabled.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.base_delay_for(attempt);
        if self.jitter {
            delay.mul_f64(jitter_factor())
        } else {
            delay
        }
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    ///
    /// Transient failures are retried; running out of retries yields `Ok(None)`.
    /// Non-transient failures are returned on first sight.
    pub async fn run<T, F, Fut>(&self, url: &str, mut op: F) -> Result<Option<T>, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut retries = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(Some(value)),
                Err(e) if e.is_transient() => {
                    retries += 1;
                    if retries > self.max_retries {
                        error!(
                            url = %url,
                            max_retries = self.max_retries,
                            error = %e,
                            "Max retries exceeded"
                        );
                        return Ok(None);
                    }

                    let delay = self.delay_for(retries);
                    warn!(
                        url = %url,
                        attempt = retries,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(url = %url, error = %e, "Non-retryable fetch error");
                    return Err(e);
                }
            }
        }
    }
}

/// Uniform factor in `[0.5, 1.5)`.
fn jitter_factor() -> f64 {
    0.5 + fastrand::f64()
}
