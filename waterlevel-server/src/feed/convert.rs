//! Conversion from the raw GeoJSON feed to station records.
//!
//! Each feature carries one sensor reading for one station. Features are
//! merged per station; stations outside the republication range are dropped
//! in full and reported once per parse.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{
    Location, STATION_REF_MAX, STATION_REF_MIN, SensorReading, StationMap, StationNumber,
    StationRecord,
};

use super::types::{Feature, FeatureCollection};

/// Name used in the filtered-station report when upstream gives none.
const UNKNOWN_STATION_NAME: &str = "Unknown";

/// A station excluded by the republication rule.
///
/// Ordered by station number first, which is the order they are reported in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FilteredStation {
    pub number: i64,
    pub station_ref: String,
    pub name: String,
}

/// Result of parsing one feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    /// Eligible stations keyed by station reference.
    pub stations: StationMap,

    /// Stations dropped by the republication rule, sorted by number.
    pub filtered: Vec<FilteredStation>,

    /// Features dropped for missing fields or a non-numeric station reference.
    pub skipped: usize,
}

/// Parse a raw feed into per-station records.
///
/// Never fails: a body without a feature list yields no stations, and
/// malformed features are skipped individually.
pub fn parse_feed(raw: &Value) -> ParsedFeed {
    let features = serde_json::from_value::<FeatureCollection>(raw.clone())
        .ok()
        .and_then(|fc| fc.features)
        .unwrap_or_default();

    let mut stations = StationMap::new();
    let mut filtered = BTreeSet::new();
    let mut skipped = 0;

    for raw_feature in features {
        let Ok(feature) = serde_json::from_value::<Feature>(raw_feature) else {
            skipped += 1;
            continue;
        };
        let props = feature.properties.unwrap_or_default();

        let (Some(station_ref), Some(sensor_ref)) = (
            props.station_ref.as_deref().filter(|s| !s.is_empty()),
            props.sensor_ref.as_deref().filter(|s| !s.is_empty()),
        ) else {
            skipped += 1;
            continue;
        };

        let number = match StationNumber::parse(station_ref) {
            Ok(n) => n,
            Err(e) => {
                warn!("Invalid station_ref format: {e}");
                skipped += 1;
                continue;
            }
        };

        if !number.is_republishable() {
            filtered.insert(FilteredStation {
                number: number.value(),
                station_ref: station_ref.to_string(),
                name: props
                    .station_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_STATION_NAME.to_string()),
            });
            continue;
        }

        let timestamp = props.datetime.clone();

        let station = stations.entry(station_ref.to_string()).or_insert_with(|| {
            let location = feature
                .geometry
                .as_ref()
                .and_then(|g| g.lat_lon())
                .map(|(lat, lon)| Location::new(lat, lon))
                .unwrap_or_default();
            let name = props
                .station_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| station_ref.to_string());
            StationRecord::new(name, props.region_id.clone(), location, timestamp.clone())
        });

        station.upsert_sensor(
            sensor_ref,
            SensorReading {
                value: props.numeric_value(),
                datetime: timestamp.clone(),
            },
        );
        station.observe_timestamp(timestamp.as_deref());
    }

    let filtered: Vec<FilteredStation> = filtered.into_iter().collect();
    if !filtered.is_empty() {
        let listing = filtered
            .iter()
            .map(|f| format!("{} ({})", f.number, f.name))
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            "Filtered {} stations outside permitted range ({}-{}): {}",
            filtered.len(),
            STATION_REF_MIN,
            STATION_REF_MAX,
            listing
        );
    }

    debug!(
        stations = stations.len(),
        filtered = filtered.len(),
        skipped,
        "parsed feed"
    );

    ParsedFeed {
        stations,
        filtered,
        skipped,
    }
}
