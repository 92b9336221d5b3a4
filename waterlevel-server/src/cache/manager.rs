//! Last-good snapshot tracking and persistence.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::StationMap;

use super::store::{CacheError, SnapshotStore};

/// How long a snapshot stays usable as a fallback.
pub const DATA_RETENTION_HOURS: i64 = 24;

/// Version written into the durable blob. Blobs with another version are
/// ignored on load.
pub const STORAGE_VERSION: u32 = 1;

/// Configuration for the snapshot cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Snapshots this old or older are never served.
    pub retention: TimeDelta,
    /// Version stamped on the durable blob.
    pub version: u32,
}

impl CacheConfig {
    /// Set a custom retention window.
    pub fn with_retention(mut self, retention: TimeDelta) -> Self {
        self.retention = retention;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            retention: TimeDelta::hours(DATA_RETENTION_HOURS),
            version: STORAGE_VERSION,
        }
    }
}

/// Station data as of one successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub data: StationMap,
    pub timestamp: DateTime<Utc>,
}

impl CachedSnapshot {
    pub fn new(data: StationMap, timestamp: DateTime<Utc>) -> Self {
        Self { data, timestamp }
    }

    /// Time elapsed since the snapshot was taken.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.timestamp
    }
}

/// On-disk layout: the snapshot plus a format version.
#[derive(Serialize)]
struct StoredSnapshotRef<'a> {
    version: u32,
    data: &'a StationMap,
    timestamp: &'a DateTime<Utc>,
}

#[derive(Deserialize)]
struct StoredSnapshot {
    version: u32,
    data: StationMap,
    timestamp: DateTime<Utc>,
}

/// Owns the last-good snapshot and the fetch health counters.
///
/// The coordinator is the only writer. Durable I/O failures are logged and
/// never returned.
#[derive(Debug)]
pub struct CacheManager<B> {
    store: B,
    config: CacheConfig,
    last_good: Option<CachedSnapshot>,
    consecutive_failures: u32,
    api_available: bool,
}

impl<B: SnapshotStore> CacheManager<B> {
    /// Create an empty cache backed by `store`.
    pub fn new(store: B, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            last_good: None,
            consecutive_failures: 0,
            api_available: true,
        }
    }

    /// Read the durable snapshot.
    ///
    /// Returns `None` if nothing is stored, the blob is malformed or from
    /// another version, or the snapshot is at least the retention window old.
    pub fn load(&self, now: DateTime<Utc>) -> Option<CachedSnapshot> {
        let blob = match self.store.load() {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!("No cached data in storage");
                return None;
            }
            Err(e) => {
                warn!("Failed to load cached data: {e}");
                return None;
            }
        };

        let stored: StoredSnapshot = match serde_json::from_str(&blob) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(
                    "Failed to load cached data: {}",
                    CacheError::Deserialize(e.to_string())
                );
                return None;
            }
        };

        if stored.version != self.config.version {
            debug!(
                "Cached data has version {}, expected {}, discarding",
                stored.version, self.config.version
            );
            return None;
        }

        let snapshot = CachedSnapshot::new(stored.data, stored.timestamp);
        let age = snapshot.age(now);
        if age >= self.config.retention {
            debug!("Cached data too old ({}), discarding", format_age(age));
            return None;
        }

        info!(
            "Loaded cached data from {} ago (stored at {})",
            format_age(age),
            snapshot.timestamp.to_rfc3339()
        );
        Some(snapshot)
    }

    /// Load the durable snapshot into memory. Returns whether one was found.
    pub fn restore(&mut self, now: DateTime<Utc>) -> bool {
        match self.load(now) {
            Some(snapshot) => {
                self.last_good = Some(snapshot);
                true
            }
            None => false,
        }
    }

    /// Best-effort durable write of a snapshot.
    pub fn save(&self, snapshot: &CachedSnapshot) {
        Self::persist(&self.store, &self.config, snapshot);
    }

    /// Replace the last-good snapshot in memory and persist it.
    ///
    /// An empty mapping is kept in memory but never written, so it cannot
    /// replace a good durable snapshot.
    pub fn commit(&mut self, data: StationMap, timestamp: DateTime<Utc>) -> &CachedSnapshot {
        let snapshot = self.last_good.insert(CachedSnapshot::new(data, timestamp));
        if snapshot.data.is_empty() {
            debug!("Fetched data is empty, not saving to storage");
        } else {
            Self::persist(&self.store, &self.config, snapshot);
        }
        snapshot
    }

    fn persist(store: &B, config: &CacheConfig, snapshot: &CachedSnapshot) {
        match Self::write(store, config, snapshot) {
            Ok(()) => debug!("Cached data saved to storage"),
            Err(e) => warn!("Failed to save cache: {e}"),
        }
    }

    fn write(store: &B, config: &CacheConfig, snapshot: &CachedSnapshot) -> Result<(), CacheError> {
        let stored = StoredSnapshotRef {
            version: config.version,
            data: &snapshot.data,
            timestamp: &snapshot.timestamp,
        };
        let blob =
            serde_json::to_string(&stored).map_err(|e| CacheError::Serialize(e.to_string()))?;
        store.save(&blob)
    }

    /// Last-good data, if it is non-empty and younger than the retention
    /// window at `now`.
    pub fn get_fallback(&self, now: DateTime<Utc>) -> Option<&StationMap> {
        self.last_good
            .as_ref()
            .filter(|snapshot| !snapshot.data.is_empty())
            .filter(|snapshot| snapshot.age(now) < self.config.retention)
            .map(|snapshot| &snapshot.data)
    }

    /// Record a successful fetch. Returns `true` if the API was previously
    /// marked unavailable.
    pub fn mark_success(&mut self) -> bool {
        let recovered = !self.api_available;
        self.consecutive_failures = 0;
        self.api_available = true;
        recovered
    }

    /// Record a failed fetch. Returns the new consecutive failure count.
    pub fn mark_failure(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.api_available = false;
        self.consecutive_failures
    }

    /// The last-good snapshot, regardless of age.
    pub fn last_good(&self) -> Option<&CachedSnapshot> {
        self.last_good.as_ref()
    }

    /// When the last-good snapshot was taken.
    pub fn last_successful_update(&self) -> Option<DateTime<Utc>> {
        self.last_good.as_ref().map(|s| s.timestamp)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn api_available(&self) -> bool {
        self.api_available
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Access the durable store.
    pub fn store(&self) -> &B {
        &self.store
    }
}

/// Render an age as `"1h 05m"` style text for logs.
pub fn format_age(age: TimeDelta) -> String {
    let total_mins = age.num_minutes();
    let sign = if total_mins < 0 { "-" } else { "" };
    let mins = total_mins.unsigned_abs();
    if mins >= 60 {
        format!("{sign}{}h {:02}m", mins / 60, mins % 60)
    } else {
        format!("{sign}{mins}m")
    }
}
