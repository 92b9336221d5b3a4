//! waterlevel.ie GeoJSON feed client.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use super::error::FetchError;

/// Latest readings for every station, as a GeoJSON FeatureCollection.
pub const DEFAULT_FEED_URL: &str = "https://waterlevel.ie/geojson/latest/";

/// Default per-attempt timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest error body kept for logging.
const MAX_ERROR_BODY: usize = 500;

/// A single attempt at retrieving the raw feed.
///
/// Retries are layered on top by [`Fetcher`](super::Fetcher); implementors
/// only report what one attempt observed.
pub trait FeedSource {
    /// The endpoint being fetched, for error reporting.
    fn url(&self) -> &str;

    /// Perform one request and decode the body as JSON.
    fn fetch_once(&self) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Feed URL
    pub url: String,
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
}

impl FeedConfig {
    /// Create a config pointing at the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_URL)
    }
}

/// HTTP client for the feed. No authentication is needed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    url: String,
}

impl FeedClient {
    /// Create a new feed client.
    pub fn new(config: FeedConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.url,
        })
    }
}

impl FeedSource for FeedClient {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_once(&self) -> Result<Value, FetchError> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| FetchError::Json {
            message: e.to_string(),
        })
    }
}
