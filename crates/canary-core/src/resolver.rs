//! Serial number to remote device id resolution.
//!
//! Resolution is not cached: every update cycle lists the locations again, so
//! a device moved between locations is picked up on the next cycle.

use tracing::debug;

use canary_types::{DeviceId, Location};

use crate::error::{Error, Result};
use crate::session::Session;
use crate::traits::CanaryApi;

/// Find the id of the device with `serial` across all locations.
///
/// Scans every device of every location in order; the first exact match wins.
pub fn find_device_id(locations: &[Location], serial: &str) -> Result<DeviceId> {
    locations
        .iter()
        .flat_map(|location| location.devices.iter())
        .find(|device| device.serial_number == serial)
        .map(|device| device.id.clone())
        .ok_or_else(|| Error::NotFound {
            serial: serial.to_string(),
        })
}

/// Fetch the locations listing and resolve `serial` to a device id.
pub async fn resolve_device_id(
    api: &dyn CanaryApi,
    session: &Session,
    serial: &str,
) -> Result<DeviceId> {
    let locations = api.locations(session).await?;
    let id = find_device_id(&locations, serial)?;
    debug!("Resolved serial {} to device {}", serial, id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockApi;
    use canary_types::Device;

    fn device(serial: &str, id: u64) -> Device {
        Device {
            id: DeviceId::Number(id),
            serial_number: serial.to_string(),
            name: None,
        }
    }

    fn locations() -> Vec<Location> {
        vec![
            Location {
                devices: vec![device("A", 1)],
                ..Default::default()
            },
            Location {
                devices: vec![device("B", 2)],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_find_matching_serial() {
        assert_eq!(find_device_id(&locations(), "B").unwrap(), DeviceId::Number(2));
    }

    #[test]
    fn test_find_missing_serial() {
        let err = find_device_id(&locations(), "C").unwrap_err();
        assert!(matches!(err, Error::NotFound { ref serial } if serial == "C"));
    }

    #[test]
    fn test_find_in_empty_listing() {
        assert!(find_device_id(&[], "A").is_err());
        let empty = vec![Location::default()];
        assert!(find_device_id(&empty, "A").is_err());
    }

    #[test]
    fn test_first_match_wins() {
        let mut listing = locations();
        listing[1].devices.push(device("A", 99));
        assert_eq!(find_device_id(&listing, "A").unwrap(), DeviceId::Number(1));
    }

    #[tokio::test]
    async fn test_resolve_via_api() {
        let api = MockApi::new().with_device("A", 1u64).with_device("B", 2u64);
        let session = Session::new("mock-token");

        let id = resolve_device_id(&api, &session, "B").await.unwrap();
        assert_eq!(id, DeviceId::Number(2));

        // Not cached: a second call lists locations again
        resolve_device_id(&api, &session, "B").await.unwrap();
        assert_eq!(api.locations_count(), 2);
    }
}
