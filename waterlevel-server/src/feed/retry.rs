//! Bounded retry with exponential backoff.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::client::FeedSource;
use super::error::FetchError;

/// Default number of attempts per fetch.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Default backoff base: delays of 1s, 2s, 4s, ...
pub const RETRY_BACKOFF_FACTOR: u32 = 2;

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves as one.
    pub max_attempts: u32,
    /// Delay before retry `i` (0-indexed) is `backoff_factor^i` seconds.
    pub backoff_factor: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_factor: u32) -> Self {
        Self {
            max_attempts,
            backoff_factor,
        }
    }

    /// Delay to wait after failed attempt `attempt` (0-indexed).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let secs = u64::from(self.backoff_factor).saturating_pow(attempt);
        Duration::from_secs(secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRY_ATTEMPTS, RETRY_BACKOFF_FACTOR)
    }
}

/// Fetches the feed through a [`FeedSource`], retrying transient failures.
#[derive(Debug, Clone)]
pub struct Fetcher<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: FeedSource> Fetcher<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// The endpoint being fetched.
    pub fn url(&self) -> &str {
        self.source.url()
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch the raw feed.
    ///
    /// Retryable errors consume an attempt and back off before the next one;
    /// there is no delay after the final attempt. A terminal error aborts
    /// immediately. On exhaustion the last error is returned.
    pub async fn fetch(&self) -> Result<Value, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let err = match self.source.fetch_once().await {
                Ok(feed) => return Ok(feed),
                Err(err) => err,
            };

            if !err.is_retryable() {
                debug!(
                    "Terminal error (attempt {}/{}), not retrying: {}",
                    attempt + 1,
                    max_attempts,
                    err
                );
                return Err(err);
            }

            if attempt + 1 >= max_attempts {
                return Err(err);
            }

            let delay = self.policy.backoff(attempt);
            debug!(
                "Retryable error (attempt {}/{}), retrying in {}s: {}",
                attempt + 1,
                max_attempts,
                delay.as_secs(),
                err
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
