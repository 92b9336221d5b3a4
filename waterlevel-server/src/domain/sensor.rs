//! Sensor-type codes and their display metadata.

use std::fmt;

/// Kind of measurement identified by a sensor-type code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// `0001`
    WaterLevel,
    /// `0002`
    WaterTemperature,
    /// `0003`
    FlowRate,
    /// `OD`
    OrdnanceDatum,
    /// Any code we have no metadata for.
    Other(String),
}

impl SensorKind {
    /// Classify a sensor-type code. Never fails.
    pub fn from_code(code: &str) -> Self {
        match code {
            "0001" => SensorKind::WaterLevel,
            "0002" => SensorKind::WaterTemperature,
            "0003" => SensorKind::FlowRate,
            "OD" => SensorKind::OrdnanceDatum,
            other => SensorKind::Other(other.to_string()),
        }
    }

    /// The upstream code for this kind.
    pub fn code(&self) -> &str {
        match self {
            SensorKind::WaterLevel => "0001",
            SensorKind::WaterTemperature => "0002",
            SensorKind::FlowRate => "0003",
            SensorKind::OrdnanceDatum => "OD",
            SensorKind::Other(code) => code,
        }
    }

    /// Human-readable name. Unknown codes are shown as-is.
    pub fn display_name(&self) -> &str {
        match self {
            SensorKind::WaterLevel => "Water Level",
            SensorKind::WaterTemperature => "Water Temperature",
            SensorKind::FlowRate => "Flow Rate",
            SensorKind::OrdnanceDatum => "Ordnance Datum",
            SensorKind::Other(code) => code,
        }
    }

    /// Unit of measurement. Ordnance datum is a plain number.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            SensorKind::WaterLevel => Some("m"),
            SensorKind::WaterTemperature => Some("°C"),
            SensorKind::FlowRate => Some("m³/s"),
            SensorKind::OrdnanceDatum | SensorKind::Other(_) => None,
        }
    }

    /// Suggested number of decimal places when displaying a value.
    pub fn precision(&self) -> Option<u8> {
        match self {
            SensorKind::WaterLevel | SensorKind::FlowRate => Some(3),
            SensorKind::WaterTemperature => Some(1),
            SensorKind::OrdnanceDatum => Some(2),
            SensorKind::Other(_) => None,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
