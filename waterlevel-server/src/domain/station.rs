//! Hydrometric station types.

use std::collections::BTreeMap;
use std::fmt;
use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};

/// Lowest station reference permitted for republication.
pub const STATION_REF_MIN: i64 = 1;

/// Highest station reference permitted for republication.
pub const STATION_REF_MAX: i64 = 41_000;

/// All stations in a snapshot, keyed by station reference.
pub type StationMap = BTreeMap<String, StationRecord>;

/// Error returned when a station reference is not numeric.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station reference {raw:?}: {reason}")]
pub struct InvalidStationRef {
    raw: String,
    reason: &'static str,
}

/// Numeric value of a station reference.
///
/// Upstream references are zero-padded strings (`"00301"`); the number is
/// what the republication rule is defined over.
///
/// # Examples
///
/// ```
/// use waterlevel_server::domain::StationNumber;
///
/// let n = StationNumber::parse("0301").unwrap();
/// assert_eq!(n.value(), 301);
/// assert!(n.is_republishable());
///
/// assert!(!StationNumber::parse("45000").unwrap().is_republishable());
/// assert!(StationNumber::parse("abc").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationNumber(i64);

impl StationNumber {
    /// Parse a station reference as a (possibly signed) integer.
    ///
    /// Surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Result<Self, InvalidStationRef> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidStationRef {
                raw: s.to_string(),
                reason: "empty",
            });
        }

        // Integers too large for i64 saturate; they are out of range either way.
        match trimmed.parse::<i64>() {
            Ok(n) => Ok(StationNumber(n)),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => Ok(StationNumber(i64::MAX)),
                IntErrorKind::NegOverflow => Ok(StationNumber(i64::MIN)),
                _ => Err(InvalidStationRef {
                    raw: s.to_string(),
                    reason: "not an integer",
                }),
            },
        }
    }

    /// The numeric value.
    pub fn value(self) -> i64 {
        self.0
    }

    /// Whether the station falls in the closed range that may be redistributed.
    pub fn is_republishable(self) -> bool {
        (STATION_REF_MIN..=STATION_REF_MAX).contains(&self.0)
    }
}

impl fmt::Display for StationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Station position in decimal degrees.
///
/// Serialized as the display string `"lat, lon"`. A string that does not
/// parse falls back to `(0.0, 0.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Parse the `"lat, lon"` display form.
    pub fn parse(s: &str) -> Option<Self> {
        let (lat, lon) = s.split_once(',')?;
        let latitude = lat.trim().parse::<f64>().ok()?;
        let longitude = lon.trim().parse::<f64>().ok()?;
        Some(Self::new(latitude, longitude))
    }

    /// Link to this position on a map.
    pub fn map_link(&self) -> String {
        format!(
            "https://www.google.com/maps/search/?api=1&query={},{}",
            self.latitude, self.longitude
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

impl From<String> for Location {
    fn from(s: String) -> Self {
        Self::parse(&s).unwrap_or_default()
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.to_string()
    }
}

/// The latest reading of one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Measured value, `None` when missing or unparseable upstream.
    pub value: Option<f64>,
    /// Timestamp as supplied upstream.
    pub datetime: Option<String>,
}

/// One hydrometric station and its current sensor readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub name: String,
    pub region: Option<String>,
    pub location: Location,
    /// Greatest timestamp seen across this station's sensors.
    pub last_updated: Option<String>,
    /// Sensor-type code → reading.
    pub sensors: BTreeMap<String, SensorReading>,
}

impl StationRecord {
    /// Create a station with no sensors yet.
    pub fn new(
        name: impl Into<String>,
        region: Option<String>,
        location: Location,
        last_updated: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            region,
            location,
            last_updated,
            sensors: BTreeMap::new(),
        }
    }

    /// Insert or replace the reading for a sensor type.
    pub fn upsert_sensor(&mut self, sensor_ref: impl Into<String>, reading: SensorReading) {
        self.sensors.insert(sensor_ref.into(), reading);
    }

    /// Advance `last_updated` if `timestamp` is later.
    ///
    /// Timestamps compare as strings. An absent timestamp never replaces a
    /// present one.
    pub fn observe_timestamp(&mut self, timestamp: Option<&str>) {
        let Some(ts) = timestamp else {
            return;
        };
        match &self.last_updated {
            Some(current) if current.as_str() >= ts => {}
            _ => self.last_updated = Some(ts.to_string()),
        }
    }

    /// Look up a sensor reading.
    pub fn sensor(&self, sensor_ref: &str) -> Option<&SensorReading> {
        self.sensors.get(sensor_ref)
    }
}
