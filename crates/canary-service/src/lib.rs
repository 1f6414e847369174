//! Background poller and HTTP accessory API for a Canary device.
//!
//! This crate provides a service that:
//! - Logs in to the Canary cloud once at startup (or uses a configured token)
//! - Polls the device's readings on a fixed interval into an in-memory cache
//! - Exposes the accessory characteristics over a small REST API
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Service health check
//! - `GET /api/status` - Session, poller statistics and cached values
//! - `GET /api/accessory` - Services descriptor
//! - `GET /api/sensors/{kind}` - Current value of `temperature`, `humidity` or `air_quality`
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/canary/bridge.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8581"
//!
//! [accessory]
//! name = "Living Room"
//! serial = "C100XXXX"
//! username = "me@example.com"
//! password = "secret"
//! polling_interval = 300
//! ```

pub mod api;
pub mod config;
pub mod state;

pub use config::{AccessoryConfig, ApiConfig, Config, ConfigError, ServerConfig};
pub use state::AppState;
