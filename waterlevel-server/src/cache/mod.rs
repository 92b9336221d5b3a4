//! Last-good snapshot cache.
//!
//! Keeps the most recent successfully parsed station data in memory and
//! mirrors it to a durable blob so it survives restarts. A snapshot is
//! only served while it is younger than the retention window (24 hours).

mod manager;
mod store;

pub use manager::{
    CacheConfig, CacheManager, CachedSnapshot, DATA_RETENTION_HOURS, STORAGE_VERSION, format_age,
};
pub use store::{CacheError, FileStore, MemoryStore, SnapshotStore};
