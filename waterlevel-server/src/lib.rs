//! waterlevel.ie station data server.
//!
//! Periodically pulls the OPW hydrometric GeoJSON feed, keeps the stations
//! eligible for republication, and serves them over HTTP. When the feed is
//! down, the last good snapshot (up to 24 hours old) is served instead.

pub mod board;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod feed;
pub mod scheduler;
pub mod web;
