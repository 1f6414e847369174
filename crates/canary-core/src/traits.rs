//! Trait abstraction over the Canary cloud API.
//!
//! This module provides the [`CanaryApi`] trait that abstracts over the real
//! HTTP client and the mock API used in tests.

use async_trait::async_trait;

use canary_types::{DeviceId, Location, SensorReading};

use crate::error::Result;
use crate::session::{Credentials, Session};

/// The three remote operations the bridge relies on.
///
/// # Example
///
/// ```ignore
/// use canary_core::{CanaryApi, Result, Session};
///
/// async fn count_devices<A: CanaryApi + ?Sized>(api: &A, session: &Session) -> Result<usize> {
///     let locations = api.locations(session).await?;
///     Ok(locations.iter().map(|l| l.devices.len()).sum())
/// }
/// ```
#[async_trait]
pub trait CanaryApi: Send + Sync {
    /// Run the XSRF + credentials login flow and return a bearer session.
    async fn login(&self, credentials: &Credentials) -> Result<Session>;

    /// List all locations with their devices.
    async fn locations(&self, session: &Session) -> Result<Vec<Location>>;

    /// Fetch the latest readings for a device.
    async fn readings(&self, session: &Session, device_id: &DeviceId)
    -> Result<Vec<SensorReading>>;
}
