//! Runtime configuration.
//!
//! All values are read from the environment once, at startup, and
//! validated before anything else is built.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::cache::{CacheConfig, FileStore};
use crate::feed::{DEFAULT_FEED_URL, FeedConfig, RetryPolicy};

/// Refresh interval used when none is configured (minutes).
pub const DEFAULT_UPDATE_INTERVAL_MINS: u32 = 15;

/// Shortest permitted refresh interval (minutes).
pub const MIN_UPDATE_INTERVAL_MINS: u32 = 15;

/// Longest permitted refresh interval (minutes).
pub const MAX_UPDATE_INTERVAL_MINS: u32 = 1440;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },

    /// The refresh interval is outside the permitted range.
    #[error(
        "update interval of {} minutes is outside the permitted range ({}-{})",
        .0,
        MIN_UPDATE_INTERVAL_MINS,
        MAX_UPDATE_INTERVAL_MINS
    )]
    IntervalOutOfRange(u32),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Minutes between refresh cycles.
    pub update_interval_mins: u32,

    /// Upstream feed settings.
    pub feed: FeedConfig,

    pub retry: RetryPolicy,

    pub cache: CacheConfig,

    /// Where the snapshot is persisted.
    pub cache_path: PathBuf,

    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Load from process environment variables.
    ///
    /// - `WATERLEVEL_UPDATE_INTERVAL`: minutes between refreshes (default 15)
    /// - `WATERLEVEL_FEED_URL`: GeoJSON endpoint
    /// - `WATERLEVEL_CACHE_PATH`: snapshot file (default `waterlevel_cache.json`)
    /// - `WATERLEVEL_BIND_ADDR`: listen address (default `127.0.0.1:3000`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let update_interval_mins = match lookup("WATERLEVEL_UPDATE_INTERVAL") {
            Some(raw) => {
                let mins = raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
                    var: "WATERLEVEL_UPDATE_INTERVAL",
                    message: e.to_string(),
                })?;
                validate_update_interval(mins)?
            }
            None => DEFAULT_UPDATE_INTERVAL_MINS,
        };

        let feed_url = lookup("WATERLEVEL_FEED_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_string());

        let cache_path = lookup("WATERLEVEL_CACHE_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(FileStore::DEFAULT_PATH));

        let bind_raw = lookup("WATERLEVEL_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "WATERLEVEL_BIND_ADDR",
                message: e.to_string(),
            })?;

        Ok(Self {
            update_interval_mins,
            feed: FeedConfig::new(feed_url),
            retry: RetryPolicy::default(),
            cache: CacheConfig::default(),
            cache_path,
            bind_addr,
        })
    }

    /// Refresh interval as a Duration.
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.update_interval_mins) * 60)
    }

    /// Log the loaded configuration.
    pub fn log_config(&self) {
        info!("Configuration loaded:");
        info!("  feed url        : {}", self.feed.url);
        info!("  update interval : {} min", self.update_interval_mins);
        info!("  cache path      : {}", self.cache_path.display());
        info!("  bind address    : {}", self.bind_addr);
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            update_interval_mins: DEFAULT_UPDATE_INTERVAL_MINS,
            feed: FeedConfig::default(),
            retry: RetryPolicy::default(),
            cache: CacheConfig::default(),
            cache_path: PathBuf::from(FileStore::DEFAULT_PATH),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

/// Check a refresh interval against the permitted range.
pub fn validate_update_interval(mins: u32) -> Result<u32, ConfigError> {
    if (MIN_UPDATE_INTERVAL_MINS..=MAX_UPDATE_INTERVAL_MINS).contains(&mins) {
        Ok(mins)
    } else {
        Err(ConfigError::IntervalOutOfRange(mins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn config_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.update_interval_mins, 15);
        assert_eq!(config.update_interval(), Duration::from_secs(900));
        assert_eq!(config.feed.url, DEFAULT_FEED_URL);
        assert_eq!(config.cache_path, PathBuf::from("waterlevel_cache.json"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn default_matches_empty_environment() {
        let from_env = AppConfig::from_lookup(lookup(&[])).unwrap();
        let default = AppConfig::default();
        assert_eq!(from_env.update_interval_mins, default.update_interval_mins);
        assert_eq!(from_env.bind_addr, default.bind_addr);
        assert_eq!(from_env.cache_path, default.cache_path);
    }

    #[test]
    fn config_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("WATERLEVEL_UPDATE_INTERVAL", "60"),
            ("WATERLEVEL_FEED_URL", "http://localhost:8080/feed"),
            ("WATERLEVEL_CACHE_PATH", "/var/lib/waterlevel/cache.json"),
            ("WATERLEVEL_BIND_ADDR", "0.0.0.0:8000"),
        ]))
        .unwrap();

        assert_eq!(config.update_interval_mins, 60);
        assert_eq!(config.feed.url, "http://localhost:8080/feed");
        assert_eq!(
            config.cache_path,
            PathBuf::from("/var/lib/waterlevel/cache.json")
        );
        assert_eq!(config.bind_addr.port(), 8000);
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        assert_eq!(validate_update_interval(15), Ok(15));
        assert_eq!(validate_update_interval(1440), Ok(1440));
        assert_eq!(
            validate_update_interval(14),
            Err(ConfigError::IntervalOutOfRange(14))
        );
        assert_eq!(
            validate_update_interval(1441),
            Err(ConfigError::IntervalOutOfRange(1441))
        );
    }

    #[test]
    fn out_of_range_interval_rejected() {
        let err =
            AppConfig::from_lookup(lookup(&[("WATERLEVEL_UPDATE_INTERVAL", "5")])).unwrap_err();
        assert_eq!(err, ConfigError::IntervalOutOfRange(5));
        assert!(err.to_string().contains("15-1440"));
    }

    #[test]
    fn unparseable_values_rejected() {
        let err =
            AppConfig::from_lookup(lookup(&[("WATERLEVEL_UPDATE_INTERVAL", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "WATERLEVEL_UPDATE_INTERVAL",
                ..
            }
        ));

        let err =
            AppConfig::from_lookup(lookup(&[("WATERLEVEL_BIND_ADDR", "localhost")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "WATERLEVEL_BIND_ADDR",
                ..
            }
        ));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("WATERLEVEL_FEED_URL", "  "),
            ("WATERLEVEL_CACHE_PATH", ""),
        ]))
        .unwrap();
        assert_eq!(config.feed.url, DEFAULT_FEED_URL);
        assert_eq!(config.cache_path, PathBuf::from("waterlevel_cache.json"));
    }
}
