//! Last-known sensor values.
//!
//! The cache maps a sensor type name to the most recently observed value.
//! Writes happen per type (last write wins) from the poller only; reads are
//! plain map lookups and never wait on network activity. A cycle that writes
//! several types is not atomic across types.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;

use canary_types::{SensorKind, SensorReading};

use crate::error::{Error, Result};

/// A cached value and when it was written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CachedValue {
    pub value: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Thread-safe map from sensor type to its latest value.
#[derive(Debug, Default)]
pub struct SensorCache {
    values: RwLock<HashMap<String, CachedValue>>,
}

impl SensorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the value of each reading under its sensor type.
    ///
    /// Returns the number of values written.
    pub fn apply(&self, readings: &[SensorReading]) -> usize {
        let now = OffsetDateTime::now_utc();
        for reading in readings {
            self.write().insert(
                reading.sensor_type.clone(),
                CachedValue {
                    value: reading.value,
                    updated_at: now,
                },
            );
            debug!("Updated {} value: {}", reading.sensor_type, reading.value);
        }
        readings.len()
    }

    /// The latest value for a sensor type name.
    ///
    /// Fails with [`Error::NotInitialized`] if nothing was cached for it yet.
    pub fn get(&self, sensor_type: &str) -> Result<f64> {
        self.get_entry(sensor_type).map(|entry| entry.value)
    }

    /// The latest value for a known sensor kind.
    pub fn get_kind(&self, kind: SensorKind) -> Result<f64> {
        self.get(kind.as_str())
    }

    /// The latest value and its timestamp.
    pub fn get_entry(&self, sensor_type: &str) -> Result<CachedValue> {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(sensor_type)
            .copied()
            .ok_or_else(|| Error::not_initialized(sensor_type))
    }

    /// Copy of all cached values.
    pub fn snapshot(&self) -> HashMap<String, CachedValue> {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, CachedValue>> {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
