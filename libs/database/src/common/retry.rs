//! Reconnect policy for code that wraps `connect`
//!
//! Connectors make exactly one attempt per call. Callers that want to ride out
//! a server restart wrap the call with [`retry_with_backoff`], or use
//! [`connect_with_retry`] to retry only failures that can clear up on their
//! own.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_parse};

use super::ConnectionError;
use crate::backend::DatabaseBackend;
use crate::params::ConnectionParameters;

/// Backoff policy between connection attempts
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts allowed after the first one
    pub max_retries: u32,

    /// Wait before the first retry, in milliseconds
    pub initial_delay_ms: u64,

    /// Upper bound for any single wait, in milliseconds
    pub max_delay_ms: u64,

    /// Growth factor applied to the wait after each failure
    pub backoff_multiplier: f64,

    /// Shorten each wait to a random 50-100% of its value
    pub use_jitter: bool,
}

impl RetryConfig {
    /// 3 retries, 100ms first wait, 5s cap, doubling, jittered
    pub fn new() -> Self {
        Self::default()
    }

    /// Single attempt, no waiting
    pub fn no_retry() -> Self {
        Self::default().with_max_retries(0)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    pub fn with_max_delay(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// The waits this policy produces, one per retry
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next_ms: self.initial_delay_ms.min(self.max_delay_ms),
            remaining: self.max_retries,
            max_ms: self.max_delay_ms,
            multiplier: self.backoff_multiplier,
            jitter: self.use_jitter,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

/// Load RetryConfig from environment variables
///
/// - `DB_CONNECT_RETRIES` (optional, default: 3)
/// - `DB_RETRY_DELAY_MS` (optional, default: 100)
/// - `DB_RETRY_MAX_DELAY_MS` (optional, default: 5000)
#[cfg(feature = "config")]
impl FromEnv for RetryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            max_retries: env_parse("DB_CONNECT_RETRIES", "3")?,
            initial_delay_ms: env_parse("DB_RETRY_DELAY_MS", "100")?,
            max_delay_ms: env_parse("DB_RETRY_MAX_DELAY_MS", "5000")?,
            ..Self::default()
        })
    }
}

/// Finite sequence of waits produced by a [`RetryConfig`]
///
/// Yields `max_retries` durations, growing by the multiplier and capped at the
/// maximum delay. Jitter is applied per item and never carried forward.
#[derive(Debug, Clone)]
pub struct Backoff {
    next_ms: u64,
    remaining: u32,
    max_ms: u64,
    multiplier: f64,
    jitter: bool,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let base = self.next_ms;
        self.next_ms = ((base as f64 * self.multiplier) as u64).min(self.max_ms);

        let wait = if self.jitter { jittered(base) } else { base };
        Some(Duration::from_millis(wait))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Backoff {}

/// A pseudo-random 50..=100% of `delay_ms`
fn jittered(delay_ms: u64) -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let percent = 50 + RandomState::new().hash_one(std::time::Instant::now()) % 51;
    delay_ms * percent / 100
}

/// Retry an async operation while `should_retry` accepts its error
///
/// The first error `should_retry` rejects is returned immediately, as is the
/// last error once the policy runs out of retries.
pub async fn retry_if<F, Fut, T, E, P>(
    mut operation: F,
    config: RetryConfig,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let total = config.max_retries + 1;
    let mut waits = config.backoff();
    let mut attempt = 1;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !should_retry(&err) {
            debug!(attempt, error = %err, "Not retrying permanent failure");
            return Err(err);
        }

        match waits.next() {
            Some(wait) => {
                debug!(
                    attempt,
                    total,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            None => {
                warn!(attempts = attempt, error = %err, "Giving up");
                return Err(err);
            }
        }
    }
}

/// Retry an async operation on every error
///
/// # Example
/// ```ignore
/// use db_connector::common::{retry_with_backoff, RetryConfig};
///
/// let config = RetryConfig::new().with_max_retries(5);
/// let handle = retry_with_backoff(|| connector.connect(&params), config).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(operation: F, config: RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_if(operation, config, |_| true).await
}

/// Retry with the default policy
pub async fn retry<F, Fut, T, E>(operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff(operation, RetryConfig::default()).await
}

/// `backend.connect(params)`, retrying only transient connection failures
pub async fn connect_with_retry<B: DatabaseBackend>(
    backend: &B,
    params: &ConnectionParameters,
    config: RetryConfig,
) -> Result<B::Handle, ConnectionError> {
    retry_if(|| backend.connect(params), config, ConnectionError::is_transient).await
}
