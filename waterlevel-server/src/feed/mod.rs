//! waterlevel.ie feed access.
//!
//! The feed is a single GeoJSON FeatureCollection with one feature per
//! station/sensor pair, refreshed upstream every 15 minutes.
//!
//! - [`FeedSource`] performs one attempt; [`FeedClient`] is the HTTP
//!   implementation and [`MockFeedSource`] replays scripted outcomes.
//! - [`Fetcher`] adds bounded retries with exponential backoff.
//! - [`parse_feed`] turns the raw body into station records.

mod client;
mod convert;
mod error;
mod mock;
mod retry;
mod types;

pub use client::{DEFAULT_FEED_URL, FeedClient, FeedConfig, FeedSource};
pub use convert::{FilteredStation, ParsedFeed, parse_feed};
pub use error::FetchError;
pub use mock::MockFeedSource;
pub use retry::{Fetcher, MAX_RETRY_ATTEMPTS, RETRY_BACKOFF_FACTOR, RetryPolicy};
pub use types::{Feature, FeatureCollection, FeatureProperties, Geometry};
