//! Domain types for hydrometric station data.
//!
//! Stations are keyed by their upstream reference string. Each station
//! carries the latest reading for every sensor type it reports.

mod sensor;
mod station;

pub use sensor::SensorKind;
pub use station::{
    InvalidStationRef, Location, STATION_REF_MAX, STATION_REF_MIN, SensorReading, StationMap,
    StationNumber, StationRecord,
};
