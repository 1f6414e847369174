//! Error types for canary-core.
//!
//! # Error Handling Policy
//!
//! | Error Type | Where it surfaces | Recovery |
//! |------------|-------------------|----------|
//! | [`Error::Auth`] | Startup login | Logged; session stays unset until restart |
//! | [`Error::NotFound`] | Update cycle | Logged; next cycle re-resolves |
//! | [`Error::Network`] | Update cycle | Logged; next cycle retries |
//! | [`Error::Api`] | Update cycle | Logged; next cycle retries |
//! | [`Error::Decode`] | Update cycle | Logged; next cycle retries |
//! | [`Error::NotInitialized`] | Sensor read | Returned to the caller |
//! | [`Error::InvalidConfig`] | Client construction | Fix configuration and restart |
//!
//! Errors raised inside the background poller never stop it; see
//! [`crate::poller`] for the retry-by-repetition policy.

use thiserror::Error;

/// Errors that can occur while talking to the Canary API or reading the cache.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The login flow failed.
    #[error("Authentication failed: {0}")]
    Auth(AuthFailure),

    /// No device with the configured serial exists in any location.
    #[error("Device with serial {serial} not found")]
    NotFound {
        /// The serial number that was searched for.
        serial: String,
    },

    /// A sensor was read before any value was cached for it.
    #[error("Sensor {sensor} not initialized")]
    NotInitialized {
        /// The sensor type name that was requested.
        sensor: String,
    },

    /// Transport-level failure (connection, TLS, timeout).
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Structured reasons for login failures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthFailure {
    /// The login page did not set an `XSRF-TOKEN` cookie.
    MissingXsrfToken,
    /// The credentials POST was answered with a non-success status.
    Rejected { status: u16 },
    /// The credentials POST succeeded but carried no `access_token`.
    MissingAccessToken,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::MissingXsrfToken => write!(f, "no XSRF token found"),
            AuthFailure::Rejected { status } => write!(f, "login rejected with status {status}"),
            AuthFailure::MissingAccessToken => write!(f, "no access token in login response"),
        }
    }
}

impl Error {
    /// Create a not-initialized error for a sensor type name.
    pub fn not_initialized(sensor: impl Into<String>) -> Self {
        Error::NotInitialized {
            sensor: sensor.into(),
        }
    }

    /// Whether this error came from the login flow.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}

/// Result type alias using canary-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
