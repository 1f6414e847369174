//! Core library for bridging Canary security devices to a smart-home platform.
//!
//! This crate talks to the Canary cloud API, keeps the latest temperature,
//! humidity and air-quality readings of one device in memory, and answers
//! accessory reads from that cache.
//!
//! # Features
//!
//! - **Login flow**: XSRF cookie exchange followed by bearer-token issuance
//! - **Device resolution**: serial number to remote device id, every cycle
//! - **Background polling**: cancellable fixed-interval task that never dies on errors
//! - **Non-blocking reads**: accessor getters are pure cache lookups
//! - **Air-quality buckets**: raw score mapped to a 1-5 category at read time
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use canary_core::{Bridge, BridgeSettings, CanaryClient, Credentials, PollOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(CanaryClient::new(canary_core::client::DEFAULT_BASE_URL)?);
//!     let bridge = Bridge::new(client, BridgeSettings {
//!         name: "Living Room".to_string(),
//!         serial: "C100XXXX".to_string(),
//!         session: None,
//!         credentials: Some(Credentials::new("me@example.com", "secret")),
//!         poll: PollOptions::from_secs(300),
//!     })?;
//!
//!     let accessory = bridge.accessory();
//!     let poller = bridge.start().await;
//!
//!     accessory.get_temperature(|result| match result {
//!         Ok(value) => println!("Temperature: {value}"),
//!         Err(e) => eprintln!("Not ready: {e}"),
//!     });
//!
//!     poller.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod accessory;
pub mod air_quality;
pub mod bridge;
pub mod cache;
pub mod client;
pub mod error;
pub mod mock;
pub mod poller;
pub mod resolver;
pub mod session;
pub mod traits;

pub use canary_types as types;

pub use accessory::{CanaryAccessory, Characteristic, ServiceDescriptor, ServiceKind};
pub use air_quality::AirQuality;
pub use bridge::{Bridge, BridgeSettings};
pub use cache::{CachedValue, SensorCache};
pub use client::CanaryClient;
pub use error::{AuthFailure, Error, Result};
pub use mock::MockApi;
pub use poller::{PollOptions, PollStats, PollStatsSnapshot, Poller, PollerHandle, UpdateOutcome};
pub use resolver::{find_device_id, resolve_device_id};
pub use session::{Credentials, Session, SessionManager};
pub use traits::CanaryApi;

pub use canary_types::{Device, DeviceId, Location, SensorKind, SensorReading};
