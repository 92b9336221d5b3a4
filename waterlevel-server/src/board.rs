//! Published read model.
//!
//! The refresh task owns the coordinator; after every cycle it publishes
//! the outcome here. HTTP handlers only ever read whole snapshots, so a
//! reader sees either the previous cycle or the new one, never a mix.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::coordinator::{ApiState, CoordinatorStatus, Refreshed, UpdateFailed};
use crate::domain::{StationMap, StationRecord};

/// What consumers see between cycles.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    /// Endpoint the data comes from.
    pub api_url: String,

    /// Station data being served. `None` before the first cycle and while
    /// the coordinator is in the failed state.
    pub stations: Option<Arc<StationMap>>,

    /// Coordinator state after the last cycle.
    pub status: CoordinatorStatus,

    /// Last fetch error, if the last cycle failed.
    pub last_error: Option<String>,

    /// When the last cycle was published.
    pub published_at: Option<DateTime<Utc>>,
}

impl BoardSnapshot {
    fn new(api_url: String) -> Self {
        Self {
            api_url,
            stations: None,
            status: CoordinatorStatus {
                state: ApiState::Healthy,
                api_available: true,
                consecutive_failures: 0,
                last_successful_update: None,
            },
            last_error: None,
            published_at: None,
        }
    }

    /// Whether the served data is a cached snapshot rather than live.
    pub fn using_cached_data(&self) -> bool {
        !self.status.api_available && self.status.last_successful_update.is_some()
    }
}

/// Shared, cheaply cloneable handle to the latest published snapshot.
#[derive(Debug, Clone)]
pub struct StationBoard {
    inner: Arc<RwLock<BoardSnapshot>>,
}

impl StationBoard {
    /// Create an empty board for the given endpoint.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(BoardSnapshot::new(api_url.into()))),
        }
    }

    /// Publish the outcome of a refresh cycle.
    pub async fn publish(
        &self,
        outcome: Result<Refreshed, UpdateFailed>,
        status: CoordinatorStatus,
        last_error: Option<String>,
    ) {
        let stations = match outcome {
            Ok(refreshed) => Some(Arc::new(refreshed.stations)),
            Err(_) => None,
        };

        let mut guard = self.inner.write().await;
        guard.stations = stations;
        guard.status = status;
        guard.last_error = last_error;
        guard.published_at = Some(Utc::now());
    }

    /// A copy of the current snapshot.
    pub async fn snapshot(&self) -> BoardSnapshot {
        self.inner.read().await.clone()
    }

    /// Look up one station in the served data.
    pub async fn station(&self, station_id: &str) -> Option<StationRecord> {
        let guard = self.inner.read().await;
        guard.stations.as_ref()?.get(station_id).cloned()
    }

    /// Number of stations being served.
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.stations.as_ref().map_or(0, |s| s.len())
    }

    /// Check if no stations are being served.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::DataSource;
    use crate::domain::Location;

    fn stations() -> StationMap {
        let mut map = StationMap::new();
        map.insert(
            "0301".into(),
            StationRecord::new("Ballybofey", None, Location::new(53.2, -7.1), None),
        );
        map
    }

    fn status(state: ApiState, api_available: bool) -> CoordinatorStatus {
        CoordinatorStatus {
            state,
            api_available,
            consecutive_failures: if api_available { 0 } else { 1 },
            last_successful_update: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn starts_empty() {
        let board = StationBoard::new("https://example.test/");
        let snapshot = board.snapshot().await;
        assert!(snapshot.stations.is_none());
        assert!(snapshot.status.api_available);
        assert!(!snapshot.using_cached_data());
        assert!(board.is_empty().await);
    }

    #[tokio::test]
    async fn publish_live_data() {
        let board = StationBoard::new("https://example.test/");
        let refreshed = Refreshed {
            stations: stations(),
            source: DataSource::Live,
            filtered: Vec::new(),
        };
        board
            .publish(Ok(refreshed), status(ApiState::Healthy, true), None)
            .await;

        assert_eq!(board.len().await, 1);
        assert_eq!(board.station("0301").await.unwrap().name, "Ballybofey");
        assert!(board.station("9999").await.is_none());
        assert!(!board.snapshot().await.using_cached_data());
    }

    #[tokio::test]
    async fn publish_failure_clears_data() {
        let board = StationBoard::new("https://example.test/");
        let refreshed = Refreshed {
            stations: stations(),
            source: DataSource::Live,
            filtered: Vec::new(),
        };
        board
            .publish(Ok(refreshed), status(ApiState::Healthy, true), None)
            .await;

        let failed = UpdateFailed {
            url: "https://example.test/".into(),
            failures: 1,
            last_error: "timeout".into(),
        };
        board
            .publish(
                Err(failed),
                status(ApiState::Failed, false),
                Some("timeout".into()),
            )
            .await;

        let snapshot = board.snapshot().await;
        assert!(snapshot.stations.is_none());
        assert_eq!(snapshot.last_error.as_deref(), Some("timeout"));
        assert_eq!(snapshot.status.state, ApiState::Failed);
    }

    #[tokio::test]
    async fn degraded_data_is_flagged_cached() {
        let board = StationBoard::new("https://example.test/");
        let refreshed = Refreshed {
            stations: stations(),
            source: DataSource::Cached {
                age: chrono::TimeDelta::hours(1),
            },
            filtered: Vec::new(),
        };
        board
            .publish(Ok(refreshed), status(ApiState::Degraded, false), None)
            .await;

        assert!(board.snapshot().await.using_cached_data());
        assert_eq!(board.len().await, 1);
    }
}
