//! Error types for data parsing in canary-types.

use thiserror::Error;

/// Errors that can occur when interpreting Canary API data.
///
/// This error type does not include transport errors (those belong in
/// canary-core).
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The sensor type name is not one of the known kinds.
    #[error("Unknown sensor type: {0}")]
    UnknownSensorType(String),
}

/// Result type alias using canary-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
