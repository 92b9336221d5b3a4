//! The refresh cycle: fetch, parse, cache, or fall back.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::cache::{CacheManager, SnapshotStore, format_age};
use crate::domain::StationMap;
use crate::feed::{FeedSource, FetchError, Fetcher, FilteredStation, parse_feed};

use super::error::UpdateFailed;

/// Degraded-mode warnings are emitted once per this many failures.
const WARN_EVERY_FAILURES: u32 = 4;

/// Health of the upstream feed as seen by the last cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiState {
    /// Last fetch succeeded.
    Healthy,
    /// Last fetch failed; serving a cached snapshot.
    Degraded,
    /// Last fetch failed and nothing fresh enough to serve.
    Failed,
}

/// Where the data returned by a cycle came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Freshly fetched this cycle.
    Live,
    /// The last-good snapshot, taken `age` ago.
    Cached { age: TimeDelta },
}

/// Data produced by a cycle that did not fail outright.
#[derive(Debug, Clone, PartialEq)]
pub struct Refreshed {
    pub stations: StationMap,
    pub source: DataSource,
    /// Stations dropped by the republication rule (live data only).
    pub filtered: Vec<FilteredStation>,
}

impl Refreshed {
    /// Whether this is cached data standing in for a failed fetch.
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, DataSource::Cached { .. })
    }
}

/// Observable coordinator state, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorStatus {
    pub state: ApiState,
    pub api_available: bool,
    pub consecutive_failures: u32,
    pub last_successful_update: Option<DateTime<Utc>>,
}

/// Drives one refresh per call to [`refresh`](Self::refresh).
///
/// Owns the fetcher and the cache manager outright. Cycles must not
/// overlap; `refresh` takes `&mut self` so the borrow checker enforces it.
#[derive(Debug)]
pub struct RefreshCoordinator<S, B> {
    fetcher: Fetcher<S>,
    cache: CacheManager<B>,
    state: ApiState,
    last_error: Option<String>,
    clock: fn() -> DateTime<Utc>,
}

impl<S: FeedSource, B: SnapshotStore> RefreshCoordinator<S, B> {
    /// Create a coordinator in the healthy state.
    pub fn new(fetcher: Fetcher<S>, cache: CacheManager<B>) -> Self {
        Self {
            fetcher,
            cache,
            state: ApiState::Healthy,
            last_error: None,
            clock: Utc::now,
        }
    }

    /// Use a custom clock (for testing).
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Load the persisted snapshot, if any is recent enough.
    ///
    /// Call once at startup, before the first refresh.
    pub fn load_cache(&mut self) -> bool {
        let now = (self.clock)();
        self.cache.restore(now)
    }

    /// Run one refresh cycle.
    ///
    /// Returns fresh data, or cached data if the fetch failed but a snapshot
    /// younger than the retention window exists. Otherwise returns
    /// [`UpdateFailed`].
    pub async fn refresh(&mut self) -> Result<Refreshed, UpdateFailed> {
        match self.fetcher.fetch().await {
            Ok(raw) => Ok(self.on_success(&raw)),
            Err(err) => self.on_failure(err),
        }
    }

    fn on_success(&mut self, raw: &Value) -> Refreshed {
        let parsed = parse_feed(raw);
        let now = (self.clock)();

        let stations = self.cache.commit(parsed.stations, now).data.clone();

        if self.cache.mark_success() {
            info!("waterlevel.ie API is back online");
        }
        self.state = ApiState::Healthy;
        self.last_error = None;

        Refreshed {
            stations,
            source: DataSource::Live,
            filtered: parsed.filtered,
        }
    }

    fn on_failure(&mut self, err: FetchError) -> Result<Refreshed, UpdateFailed> {
        let failures = self.cache.mark_failure();
        let now = (self.clock)();
        self.last_error = Some(err.to_string());

        let fallback = self.cache.get_fallback(now).cloned();
        let age = self
            .cache
            .last_successful_update()
            .map(|ts| now - ts)
            .unwrap_or(TimeDelta::zero());

        if let Some(stations) = fallback {
            if should_warn(failures) {
                warn!(
                    "waterlevel.ie API unavailable ({} consecutive failures), \
                     using cached data from {} ago. Last error: {}",
                    failures,
                    format_age(age),
                    err
                );
            }
            self.state = ApiState::Degraded;
            return Ok(Refreshed {
                stations,
                source: DataSource::Cached { age },
                filtered: Vec::new(),
            });
        }

        let failed = UpdateFailed {
            url: self.fetcher.url().to_string(),
            failures,
            last_error: err.to_string(),
        };
        error!("{failed}");
        self.state = ApiState::Failed;
        Err(failed)
    }

    /// Current state for status reporting.
    pub fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            state: self.state,
            api_available: self.cache.api_available(),
            consecutive_failures: self.cache.consecutive_failures(),
            last_successful_update: self.cache.last_successful_update(),
        }
    }

    pub fn state(&self) -> ApiState {
        self.state
    }

    pub fn api_available(&self) -> bool {
        self.cache.api_available()
    }

    /// Description of the most recent fetch error, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The endpoint being refreshed.
    pub fn url(&self) -> &str {
        self.fetcher.url()
    }

    pub fn fetcher(&self) -> &Fetcher<S> {
        &self.fetcher
    }

    pub fn cache(&self) -> &CacheManager<B> {
        &self.cache
    }
}

/// Whether a degraded cycle should log, given the failure count.
///
/// Fires on the 1st, 5th, 9th, ... consecutive failure.
pub fn should_warn(failures: u32) -> bool {
    failures % WARN_EVERY_FAILURES == 1
}
