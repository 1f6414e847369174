//! Accessor interface for the smart-home platform.
//!
//! The platform asks for characteristic values synchronously, passing a
//! completion callback. Every getter here is a pure cache lookup; there is no
//! network I/O on the read path, so answers are immediate whatever the state
//! of the upstream API.

use std::sync::Arc;

use serde::Serialize;

use canary_types::SensorKind;

use crate::air_quality::AirQuality;
use crate::cache::SensorCache;
use crate::error::Result;

pub const MANUFACTURER: &str = "Canary";
pub const MODEL: &str = "Homebridge";

/// Characteristics the accessory can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Characteristic {
    CurrentTemperature,
    CurrentRelativeHumidity,
    AirQuality,
}

impl Characteristic {
    /// The sensor whose cached value backs this characteristic.
    pub fn sensor(&self) -> SensorKind {
        match self {
            Characteristic::CurrentTemperature => SensorKind::Temperature,
            Characteristic::CurrentRelativeHumidity => SensorKind::Humidity,
            Characteristic::AirQuality => SensorKind::AirQuality,
        }
    }
}

/// Kinds of services exposed to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceKind {
    AccessoryInformation,
    TemperatureSensor,
    HumiditySensor,
    AirQualitySensor,
}

/// One service in the services descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDescriptor {
    pub kind: ServiceKind,
    pub name: String,
    /// Static information fields (manufacturer, model, serial).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<(String, String)>,
    /// Characteristics answered through [`CanaryAccessory::handle_get`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub characteristics: Vec<Characteristic>,
}

/// A Canary device as seen by the smart-home platform.
#[derive(Debug, Clone)]
pub struct CanaryAccessory {
    name: String,
    serial: String,
    cache: Arc<SensorCache>,
}

impl CanaryAccessory {
    pub fn new(name: impl Into<String>, serial: impl Into<String>, cache: Arc<SensorCache>) -> Self {
        Self {
            name: name.into(),
            serial: serial.into(),
            cache,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn cache(&self) -> &Arc<SensorCache> {
        &self.cache
    }

    /// Current temperature in degrees Celsius.
    pub fn temperature(&self) -> Result<f64> {
        self.cache.get_kind(SensorKind::Temperature)
    }

    /// Current relative humidity in percent.
    pub fn humidity(&self) -> Result<f64> {
        self.cache.get_kind(SensorKind::Humidity)
    }

    /// Current air-quality category, bucketed from the cached raw score.
    pub fn air_quality(&self) -> Result<AirQuality> {
        self.cache
            .get_kind(SensorKind::AirQuality)
            .map(AirQuality::from_score)
    }

    /// The value reported for a characteristic.
    ///
    /// Air quality is reported as its 1-5 category.
    pub fn value(&self, characteristic: Characteristic) -> Result<f64> {
        match characteristic {
            Characteristic::CurrentTemperature => self.temperature(),
            Characteristic::CurrentRelativeHumidity => self.humidity(),
            Characteristic::AirQuality => self.air_quality().map(|q| f64::from(q.as_u8())),
        }
    }

    /// Answer a get request through a completion callback.
    pub fn handle_get<F>(&self, characteristic: Characteristic, callback: F)
    where
        F: FnOnce(Result<f64>),
    {
        callback(self.value(characteristic));
    }

    pub fn get_temperature<F: FnOnce(Result<f64>)>(&self, callback: F) {
        self.handle_get(Characteristic::CurrentTemperature, callback);
    }

    pub fn get_humidity<F: FnOnce(Result<f64>)>(&self, callback: F) {
        self.handle_get(Characteristic::CurrentRelativeHumidity, callback);
    }

    pub fn get_air_quality<F: FnOnce(Result<f64>)>(&self, callback: F) {
        self.handle_get(Characteristic::AirQuality, callback);
    }

    /// The services this accessory declares to the platform.
    pub fn services(&self) -> Vec<ServiceDescriptor> {
        vec![
            ServiceDescriptor {
                kind: ServiceKind::AccessoryInformation,
                name: self.name.clone(),
                info: vec![
                    ("Manufacturer".to_string(), MANUFACTURER.to_string()),
                    ("Model".to_string(), MODEL.to_string()),
                    ("SerialNumber".to_string(), self.serial.clone()),
                ],
                characteristics: Vec::new(),
            },
            self.sensor_service(
                ServiceKind::TemperatureSensor,
                "Temperature",
                Characteristic::CurrentTemperature,
            ),
            self.sensor_service(
                ServiceKind::HumiditySensor,
                "Humidity",
                Characteristic::CurrentRelativeHumidity,
            ),
            self.sensor_service(
                ServiceKind::AirQualitySensor,
                "Air Quality",
                Characteristic::AirQuality,
            ),
        ]
    }

    fn sensor_service(
        &self,
        kind: ServiceKind,
        suffix: &str,
        characteristic: Characteristic,
    ) -> ServiceDescriptor {
        ServiceDescriptor {
            kind,
            name: format!("{} {}", self.name, suffix),
            info: Vec::new(),
            characteristics: vec![characteristic],
        }
    }
}
