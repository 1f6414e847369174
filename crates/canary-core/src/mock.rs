//! Mock API implementation for testing.
//!
//! [`MockApi`] implements [`CanaryApi`] without any network access, so the
//! session manager and poller can be exercised deterministically.
//!
//! # Features
//!
//! - **Failure injection**: fail login, or fail the next N readings fetches
//! - **Call counting**: observe how many times each endpoint was hit
//! - **Mutable fixtures**: swap locations and readings between cycles

use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use canary_types::{Device, DeviceId, Location, SensorReading};

use crate::error::{AuthFailure, Error, Result};
use crate::session::{Credentials, Session};
use crate::traits::CanaryApi;

/// A mock Canary API for testing.
///
/// # Example
///
/// ```
/// use canary_core::{CanaryApi, MockApi, Session};
///
/// #[tokio::main]
/// async fn main() {
///     let api = MockApi::new().with_device("C100", 42u64);
///     let locations = api.locations(&Session::new("t")).await.unwrap();
///     assert_eq!(locations[0].devices[0].serial_number, "C100");
/// }
/// ```
#[derive(Debug)]
pub struct MockApi {
    token: String,
    locations: RwLock<Vec<Location>>,
    readings: RwLock<Vec<SensorReading>>,
    last_device_id: RwLock<Option<DeviceId>>,
    login_failure: RwLock<Option<AuthFailure>>,
    /// Number of readings fetches to fail before succeeding.
    remaining_failures: AtomicU32,
    login_count: AtomicU32,
    locations_count: AtomicU32,
    readings_count: AtomicU32,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    /// Create an empty mock that issues the token `mock-token`.
    pub fn new() -> Self {
        Self {
            token: "mock-token".to_string(),
            locations: RwLock::new(Vec::new()),
            readings: RwLock::new(Vec::new()),
            last_device_id: RwLock::new(None),
            login_failure: RwLock::new(None),
            remaining_failures: AtomicU32::new(0),
            login_count: AtomicU32::new(0),
            locations_count: AtomicU32::new(0),
            readings_count: AtomicU32::new(0),
        }
    }

    /// Set the token issued by a successful login.
    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    /// Add a single-device location.
    #[must_use]
    pub fn with_device(self, serial: &str, id: impl Into<DeviceId>) -> Self {
        self.write_locations().push(Location {
            id: None,
            name: None,
            devices: vec![Device {
                id: id.into(),
                serial_number: serial.to_string(),
                name: None,
            }],
        });
        self
    }

    /// Set the readings returned by every fetch.
    #[must_use]
    pub fn with_readings(self, readings: Vec<SensorReading>) -> Self {
        self.set_readings(readings);
        self
    }

    /// Replace the readings returned by subsequent fetches.
    pub fn set_readings(&self, readings: Vec<SensorReading>) {
        *self
            .readings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = readings;
    }

    /// Replace the locations listing.
    pub fn set_locations(&self, locations: Vec<Location>) {
        *self.write_locations() = locations;
    }

    /// Make every login attempt fail with the given reason.
    pub fn fail_login(&self, reason: AuthFailure) {
        *self
            .login_failure
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(reason);
    }

    /// Fail the next `count` readings fetches with an API error.
    pub fn fail_next_readings(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::SeqCst);
    }

    pub fn login_count(&self) -> u32 {
        self.login_count.load(Ordering::SeqCst)
    }

    pub fn locations_count(&self) -> u32 {
        self.locations_count.load(Ordering::SeqCst)
    }

    pub fn readings_count(&self) -> u32 {
        self.readings_count.load(Ordering::SeqCst)
    }

    /// The device id passed to the most recent readings fetch.
    pub fn last_device_id(&self) -> Option<DeviceId> {
        self.last_device_id
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn write_locations(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Location>> {
        self.locations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_session(&self, session: &Session) -> Result<()> {
        if session.token() == self.token {
            Ok(())
        } else {
            Err(Error::Api {
                status: 401,
                message: "Unauthorized".to_string(),
            })
        }
    }
}

#[async_trait]
impl CanaryApi for MockApi {
    async fn login(&self, _credentials: &Credentials) -> Result<Session> {
        self.login_count.fetch_add(1, Ordering::SeqCst);

        let failure = self
            .login_failure
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        match failure {
            Some(reason) => Err(Error::Auth(reason)),
            None => Ok(Session::new(self.token.clone())),
        }
    }

    async fn locations(&self, session: &Session) -> Result<Vec<Location>> {
        self.locations_count.fetch_add(1, Ordering::SeqCst);
        self.check_session(session)?;

        Ok(self
            .locations
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    async fn readings(
        &self,
        session: &Session,
        device_id: &DeviceId,
    ) -> Result<Vec<SensorReading>> {
        self.readings_count.fetch_add(1, Ordering::SeqCst);
        self.check_session(session)?;
        *self
            .last_device_id
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(device_id.clone());

        if self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Api {
                status: 503,
                message: "Mock failure".to_string(),
            });
        }

        Ok(self
            .readings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }
}
