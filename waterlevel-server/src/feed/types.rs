//! GeoJSON feed DTOs.
//!
//! These map the `waterlevel.ie` latest-readings FeatureCollection. Every
//! field is optional and scalar fields accept strings or numbers, because
//! the feed is not validated before parsing and one bad feature must not
//! reject the rest.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Top-level FeatureCollection. Features are kept raw so that each one can
/// be decoded (and rejected) on its own.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Option<Vec<Value>>,
}

/// One reading: a station/sensor pair with its point geometry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Option<FeatureProperties>,

    #[serde(default)]
    pub geometry: Option<Geometry>,
}

/// Feature properties we consume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, deserialize_with = "scalar_string")]
    pub station_ref: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub sensor_ref: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub station_name: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub region_id: Option<String>,

    /// Reading value, usually a decimal string such as `"1.230"`.
    #[serde(default)]
    pub value: Option<Value>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub datetime: Option<String>,
}

/// Point geometry. Coordinates are `[lon, lat]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub coordinates: Option<Value>,
}

impl Geometry {
    /// `(lat, lon)` if both coordinates are numeric.
    pub fn lat_lon(&self) -> Option<(f64, f64)> {
        let coords = self.coordinates.as_ref()?.as_array()?;
        let lon = number(coords.first()?)?;
        let lat = number(coords.get(1)?)?;
        Some((lat, lon))
    }
}

impl FeatureProperties {
    /// The reading value as a finite float.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.as_ref().and_then(number)
    }
}

/// Accept a JSON number or a numeric string.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Deserialize a scalar as a string: numbers and booleans are stringified,
/// anything else is treated as absent.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_full_feature() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "properties": {
                "station_ref": "0000001041",
                "station_name": "Sandy Mills",
                "sensor_ref": "0001",
                "region_id": 3,
                "datetime": "2024-01-01T00:00:00Z",
                "value": "0.867",
                "err_code": 99
            },
            "geometry": { "type": "Point", "coordinates": [-7.575758, 54.838318] }
        }))
        .unwrap();

        let props = feature.properties.unwrap();
        assert_eq!(props.station_ref.as_deref(), Some("0000001041"));
        assert_eq!(props.region_id.as_deref(), Some("3"));
        assert_eq!(props.numeric_value(), Some(0.867));
        assert_eq!(
            feature.geometry.unwrap().lat_lon(),
            Some((54.838318, -7.575758))
        );
    }

    #[test]
    fn nulls_are_absent() {
        let feature: Feature = serde_json::from_value(json!({
            "properties": {
                "station_ref": null,
                "value": null,
                "region_id": {"nested": true}
            },
            "geometry": null
        }))
        .unwrap();

        let props = feature.properties.unwrap();
        assert_eq!(props.station_ref, None);
        assert_eq!(props.region_id, None);
        assert_eq!(props.numeric_value(), None);
        assert!(feature.geometry.is_none());
    }

    #[test]
    fn numeric_value_accepts_numbers_and_strings() {
        let props = |v: Value| FeatureProperties {
            value: Some(v),
            ..Default::default()
        };
        assert_eq!(props(json!(1.5)).numeric_value(), Some(1.5));
        assert_eq!(props(json!(" 2.25 ")).numeric_value(), Some(2.25));
        assert_eq!(props(json!("n/a")).numeric_value(), None);
        assert_eq!(props(json!("NaN")).numeric_value(), None);
        assert_eq!(props(json!(true)).numeric_value(), None);
    }

    #[test]
    fn short_or_non_numeric_coordinates() {
        let geometry = |v: Value| Geometry {
            coordinates: Some(v),
        };
        assert_eq!(geometry(json!([-7.1])).lat_lon(), None);
        assert_eq!(geometry(json!(["x", 53.2])).lat_lon(), None);
        assert_eq!(geometry(json!("53.2,-7.1")).lat_lon(), None);
        assert_eq!(geometry(json!(["-7.1", "53.2"])).lat_lon(), Some((53.2, -7.1)));
        assert_eq!(Geometry::default().lat_lon(), None);
    }

    #[test]
    fn missing_features_list() {
        let fc: FeatureCollection =
            serde_json::from_value(json!({"type": "FeatureCollection"})).unwrap();
        assert!(fc.features.is_none());
    }
}
