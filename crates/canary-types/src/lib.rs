//! Wire types for the Canary cloud API.
//!
//! This crate provides the shared data types exchanged with
//! `https://my.canary.is`: locations, devices and sensor readings.
//!
//! # Example
//!
//! ```
//! use canary_types::{SensorKind, SensorReading};
//!
//! let reading = SensorReading::new("temperature", 21.5);
//! assert_eq!(reading.kind(), Some(SensorKind::Temperature));
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{Device, DeviceId, Location, SensorKind, SensorReading};
