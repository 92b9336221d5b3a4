//! Data transfer objects for web responses.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::board::BoardSnapshot;
use crate::coordinator::{ApiState, CoordinatorStatus};
use crate::domain::{SensorKind, SensorReading, StationRecord};

/// Attribution required when republishing waterlevel.ie data.
pub const ATTRIBUTION: &str = "Data provided by WaterLevel.ie (OPW)";

/// Upstream feed status.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub api_url: String,
    pub api_available: bool,
    pub state: ApiState,

    /// RFC 3339 time of the last successful fetch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_update: Option<String>,

    /// Only present while the feed is failing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consecutive_failures: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// Number of stations currently served
    pub station_count: usize,
}

impl StatusResponse {
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Self {
        let status = &snapshot.status;
        Self {
            api_url: snapshot.api_url.clone(),
            api_available: status.api_available,
            state: status.state,
            last_successful_update: status.last_successful_update.map(|ts| ts.to_rfc3339()),
            consecutive_failures: (status.consecutive_failures > 0)
                .then_some(status.consecutive_failures),
            last_error: snapshot.last_error.clone(),
            station_count: snapshot.stations.as_ref().map_or(0, |s| s.len()),
        }
    }
}

/// A sensor reading within a station.
#[derive(Debug, Serialize)]
pub struct SensorSummary {
    /// Sensor-type code (e.g. "0001")
    pub sensor_type: String,

    /// Display name (e.g. "Water Level")
    pub name: String,

    pub value: Option<f64>,
    pub unit: Option<&'static str>,

    /// Upstream reading time
    pub datetime: Option<String>,
}

impl SensorSummary {
    pub fn from_reading(sensor_type: &str, reading: &SensorReading) -> Self {
        let kind = SensorKind::from_code(sensor_type);
        Self {
            sensor_type: sensor_type.to_string(),
            name: kind.display_name().to_string(),
            value: reading.value,
            unit: kind.unit(),
            datetime: reading.datetime.clone(),
        }
    }
}

/// A station with all its sensors.
#[derive(Debug, Serialize)]
pub struct StationResult {
    /// Station reference (e.g. "0000001041")
    pub id: String,
    pub name: String,
    pub region: Option<String>,
    pub latitude: f64,
    pub longitude: f64,

    /// Latest reading time across all sensors
    pub last_updated: Option<String>,
    pub sensors: Vec<SensorSummary>,
}

impl StationResult {
    pub fn from_record(id: &str, record: &StationRecord) -> Self {
        Self {
            id: id.to_string(),
            name: record.name.clone(),
            region: record.region.clone(),
            latitude: record.location.latitude,
            longitude: record.location.longitude,
            last_updated: record.last_updated.clone(),
            sensors: record
                .sensors
                .iter()
                .map(|(code, reading)| SensorSummary::from_reading(code, reading))
                .collect(),
        }
    }
}

/// Response listing every served station.
#[derive(Debug, Serialize)]
pub struct StationListResponse {
    pub api_available: bool,
    pub using_cached_data: bool,
    pub stations: Vec<StationResult>,
}

/// One sensor reading with display metadata.
#[derive(Debug, Serialize)]
pub struct SensorDetail {
    pub station_id: String,
    pub sensor_type: String,

    /// "{station name} {sensor name}"
    pub name: String,

    pub value: Option<f64>,
    pub unit: Option<&'static str>,

    /// Suggested decimal places
    pub precision: Option<u8>,

    pub region: Option<String>,
    pub datetime: Option<String>,
    pub latitude: f64,
    pub longitude: f64,

    /// Map link to the station
    pub location_link: String,

    pub attribution: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub using_cached_data: Option<bool>,

    /// Age of the cached data in hours, one decimal place
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_age_hours: Option<f64>,
}

impl SensorDetail {
    /// Build the detail view for one sensor, or `None` if the station has
    /// no reading of that type.
    ///
    /// Cached-data annotations are added while the feed is unavailable and
    /// a previous successful fetch exists.
    pub fn build(
        station_id: &str,
        record: &StationRecord,
        sensor_type: &str,
        status: &CoordinatorStatus,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let reading = record.sensor(sensor_type)?;
        let kind = SensorKind::from_code(sensor_type);

        let (using_cached_data, data_age_hours) = match status.last_successful_update {
            Some(ts) if !status.api_available => (Some(true), Some(age_hours(ts, now))),
            _ => (None, None),
        };

        Some(Self {
            station_id: station_id.to_string(),
            sensor_type: sensor_type.to_string(),
            name: format!("{} {}", record.name, kind.display_name()),
            value: reading.value,
            unit: kind.unit(),
            precision: kind.precision(),
            region: record.region.clone(),
            datetime: reading.datetime.clone(),
            latitude: record.location.latitude,
            longitude: record.location.longitude,
            location_link: record.location.map_link(),
            attribution: ATTRIBUTION,
            using_cached_data,
            data_age_hours,
        })
    }
}

/// Hours between `since` and `now`, rounded to one decimal place.
fn age_hours(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let hours = (now - since).num_seconds() as f64 / 3600.0;
    (hours * 10.0).round() / 10.0
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Location;
    use chrono::{TimeDelta, TimeZone};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
    }

    fn make_station() -> StationRecord {
        let mut record = StationRecord::new(
            "Ballybofey",
            Some("3".into()),
            Location::new(54.8, -7.79),
            None,
        );
        record.upsert_sensor(
            "0001",
            SensorReading {
                value: Some(1.234),
                datetime: Some("2024-01-02T11:45:00Z".into()),
            },
        );
        record.upsert_sensor(
            "OD",
            SensorReading {
                value: Some(12.5),
                datetime: Some("2024-01-02T11:30:00Z".into()),
            },
        );
        record.observe_timestamp(Some("2024-01-02T11:45:00Z"));
        record
    }

    fn healthy() -> CoordinatorStatus {
        CoordinatorStatus {
            state: ApiState::Healthy,
            api_available: true,
            consecutive_failures: 0,
            last_successful_update: Some(now()),
        }
    }

    #[test]
    fn station_result_lists_sensors_in_code_order() {
        let result = StationResult::from_record("0000001041", &make_station());

        assert_eq!(result.id, "0000001041");
        assert_eq!(result.name, "Ballybofey");
        assert_eq!(result.region.as_deref(), Some("3"));
        assert_eq!(result.last_updated.as_deref(), Some("2024-01-02T11:45:00Z"));

        let codes: Vec<_> = result.sensors.iter().map(|s| s.sensor_type.as_str()).collect();
        assert_eq!(codes, vec!["0001", "OD"]);
        assert_eq!(result.sensors[0].name, "Water Level");
        assert_eq!(result.sensors[0].unit, Some("m"));
        assert_eq!(result.sensors[1].unit, None);
    }

    #[test]
    fn sensor_detail_carries_metadata() {
        let detail =
            SensorDetail::build("0000001041", &make_station(), "0001", &healthy(), now()).unwrap();

        assert_eq!(detail.name, "Ballybofey Water Level");
        assert_eq!(detail.value, Some(1.234));
        assert_eq!(detail.unit, Some("m"));
        assert_eq!(detail.precision, Some(3));
        assert_eq!(detail.region.as_deref(), Some("3"));
        assert_eq!(detail.latitude, 54.8);
        assert_eq!(detail.longitude, -7.79);
        assert!(detail.location_link.contains("54.8"));
        assert_eq!(detail.attribution, ATTRIBUTION);
        assert_eq!(detail.using_cached_data, None);
        assert_eq!(detail.data_age_hours, None);
    }

    #[test]
    fn sensor_detail_unknown_sensor() {
        let detail = SensorDetail::build("0000001041", &make_station(), "0003", &healthy(), now());
        assert!(detail.is_none());
    }

    #[test]
    fn sensor_detail_flags_cached_data() {
        let status = CoordinatorStatus {
            state: ApiState::Degraded,
            api_available: false,
            consecutive_failures: 2,
            last_successful_update: Some(now() - TimeDelta::minutes(100)),
        };
        let detail =
            SensorDetail::build("0000001041", &make_station(), "0001", &status, now()).unwrap();

        assert_eq!(detail.using_cached_data, Some(true));
        assert_eq!(detail.data_age_hours, Some(1.7));

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["using_cached_data"], true);
    }

    #[test]
    fn cached_annotations_omitted_from_json_when_live() {
        let detail =
            SensorDetail::build("0000001041", &make_station(), "0001", &healthy(), now()).unwrap();
        let json = serde_json::to_value(&detail).unwrap();
        assert!(json.get("using_cached_data").is_none());
        assert!(json.get("data_age_hours").is_none());
    }

    #[test]
    fn age_rounds_to_one_decimal() {
        assert_eq!(age_hours(now() - TimeDelta::minutes(30), now()), 0.5);
        assert_eq!(age_hours(now() - TimeDelta::minutes(62), now()), 1.0);
        assert_eq!(age_hours(now() - TimeDelta::hours(23), now()), 23.0);
    }

    #[test]
    fn status_omits_empty_fields() {
        let snapshot = BoardSnapshot {
            api_url: "https://waterlevel.ie/geojson/latest/".into(),
            stations: None,
            status: CoordinatorStatus {
                last_successful_update: None,
                ..healthy()
            },
            last_error: None,
            published_at: None,
        };
        let json = serde_json::to_value(StatusResponse::from_snapshot(&snapshot)).unwrap();

        assert_eq!(json["state"], "healthy");
        assert_eq!(json["api_available"], true);
        assert_eq!(json["station_count"], 0);
        assert!(json.get("last_successful_update").is_none());
        assert!(json.get("consecutive_failures").is_none());
        assert!(json.get("last_error").is_none());
    }

    #[test]
    fn status_reports_failures() {
        let mut stations = crate::domain::StationMap::new();
        stations.insert("0000001041".into(), make_station());
        let snapshot = BoardSnapshot {
            api_url: "https://waterlevel.ie/geojson/latest/".into(),
            stations: Some(Arc::new(stations)),
            status: CoordinatorStatus {
                state: ApiState::Degraded,
                api_available: false,
                consecutive_failures: 3,
                last_successful_update: Some(now()),
            },
            last_error: Some("request timed out: deadline".into()),
            published_at: Some(now()),
        };
        let json = serde_json::to_value(StatusResponse::from_snapshot(&snapshot)).unwrap();

        assert_eq!(json["state"], "degraded");
        assert_eq!(json["consecutive_failures"], 3);
        assert_eq!(json["station_count"], 1);
        assert_eq!(json["last_error"], "request timed out: deadline");
        assert_eq!(json["last_successful_update"], "2024-01-02T12:00:00+00:00");
    }
}
