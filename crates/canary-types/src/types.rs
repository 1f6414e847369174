//! Core types for Canary API data.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Physical quantity a reading represents.
///
/// The Canary API identifies readings by a free-form `sensor_type` string;
/// these are the kinds the bridge exposes as accessory characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SensorKind {
    /// Temperature in degrees Celsius.
    Temperature,
    /// Relative humidity in percent.
    Humidity,
    /// Raw air-quality score (continuous, higher is worse).
    AirQuality,
}

impl SensorKind {
    /// All kinds exposed by the bridge.
    pub const ALL: [SensorKind; 3] = [
        SensorKind::Temperature,
        SensorKind::Humidity,
        SensorKind::AirQuality,
    ];

    /// The `sensor_type` name used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::AirQuality => "air_quality",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(SensorKind::Temperature),
            "humidity" => Ok(SensorKind::Humidity),
            "air_quality" => Ok(SensorKind::AirQuality),
            other => Err(ParseError::UnknownSensorType(other.to_string())),
        }
    }
}

/// A single reading as returned by `/api/readings`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorReading {
    /// Sensor type name (e.g. `temperature`).
    pub sensor_type: String,
    /// Observed value.
    pub value: f64,
}

impl SensorReading {
    /// Create a reading for the given sensor type name.
    pub fn new(sensor_type: impl Into<String>, value: f64) -> Self {
        Self {
            sensor_type: sensor_type.into(),
            value,
        }
    }

    /// The known kind of this reading, if any.
    pub fn kind(&self) -> Option<SensorKind> {
        self.sensor_type.parse().ok()
    }
}

/// Remote device identifier.
///
/// The API has been observed to return both numeric and string ids, so both
/// are accepted and rendered verbatim in query strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum DeviceId {
    Number(u64),
    Text(String),
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceId::Number(n) => write!(f, "{n}"),
            DeviceId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for DeviceId {
    fn from(id: u64) -> Self {
        DeviceId::Number(id)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        DeviceId::Text(id.to_string())
    }
}

/// A device entry inside a location.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Device {
    /// Remote id used by `/api/readings`.
    pub id: DeviceId,
    /// Hardware serial number, matched against configuration.
    pub serial_number: String,
    /// Display name, if the API provides one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
}

/// A location as returned by `/api/locations`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: Option<DeviceId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
    /// Devices installed at this location. Missing in the payload means none.
    #[cfg_attr(feature = "serde", serde(default))]
    pub devices: Vec<Device>,
}
