//! Scripted feed source for testing without network access.
//!
//! Each call to `fetch_once` pops the next scripted outcome. Once the
//! script runs out every attempt fails with a connection error, which
//! looks like an upstream outage.

use std::collections::VecDeque;

use serde_json::Value;
use tokio::sync::Mutex;

use super::client::{DEFAULT_FEED_URL, FeedSource};
use super::error::FetchError;

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Result<Value, FetchError>>,
    attempts: usize,
}

/// Mock feed source that replays scripted outcomes.
#[derive(Debug)]
pub struct MockFeedSource {
    url: String,
    state: Mutex<MockState>,
}

impl MockFeedSource {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Queue a successful response.
    pub fn then_ok(mut self, feed: Value) -> Self {
        self.state.get_mut().script.push_back(Ok(feed));
        self
    }

    /// Queue a failed attempt.
    pub fn then_err(mut self, err: FetchError) -> Self {
        self.state.get_mut().script.push_back(Err(err));
        self
    }

    /// Queue an outcome on a mock that is already in use.
    pub async fn push(&self, outcome: Result<Value, FetchError>) {
        self.state.lock().await.script.push_back(outcome);
    }

    /// Number of attempts made so far.
    pub async fn attempts(&self) -> usize {
        self.state.lock().await.attempts
    }

    /// Number of scripted outcomes not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.state.lock().await.script.len()
    }
}

impl Default for MockFeedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSource for MockFeedSource {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_once(&self) -> Result<Value, FetchError> {
        let mut state = self.state.lock().await;
        state.attempts += 1;
        state
            .script
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Connection("mock script exhausted".to_string())))
    }
}
