//! Service configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use canary_core::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use canary_core::{BridgeSettings, Credentials, PollOptions, Session};

/// Service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Canary API settings.
    pub api: ApiConfig,
    /// The bridged device.
    pub accessory: AccessoryConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return every problem found.
    ///
    /// This checks:
    /// - Server bind address is `host:port`
    /// - API base URL is http(s) and the timeout is non-zero
    /// - A serial is set
    /// - Polling interval is within bounds (10s - 1 hour)
    /// - Either a session or both username and password are set
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.server.validate());
        errors.extend(self.api.validate());
        errors.extend(self.accessory.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8581").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8581".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError::new("server.bind", "bind address cannot be empty"));
            return errors;
        }

        match self.bind.rsplit_once(':') {
            None => errors.push(ValidationError::new(
                "server.bind",
                format!("invalid bind address '{}': expected format 'host:port'", self.bind),
            )),
            Some((_, port)) => match port.parse::<u16>() {
                Ok(0) => errors.push(ValidationError::new("server.bind", "port cannot be 0")),
                Err(_) => errors.push(ValidationError::new(
                    "server.bind",
                    format!("invalid port '{}': must be a number 1-65535", port),
                )),
                Ok(_) => {}
            },
        }

        errors
    }
}

/// Canary API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate API configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            errors.push(ValidationError::new(
                "api.base_url",
                format!("'{}' must start with http:// or https://", self.base_url),
            ));
        }
        if self.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "api.request_timeout_secs",
                "request timeout must be at least 1 second",
            ));
        }

        errors
    }
}

/// Minimum polling interval in seconds.
pub const MIN_POLLING_INTERVAL: u64 = 10;
/// Maximum polling interval in seconds (1 hour).
pub const MAX_POLLING_INTERVAL: u64 = 3600;

fn default_polling_interval() -> u64 {
    60
}

fn default_name() -> String {
    "Canary".to_string()
}

/// Configuration of the bridged device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessoryConfig {
    /// Display name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Device serial number.
    #[serde(default)]
    pub serial: String,
    /// Login username; used only when `session` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Login password; used only when `session` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Pre-obtained bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    /// Seconds between update cycles.
    #[serde(default = "default_polling_interval", alias = "pollingInterval")]
    pub polling_interval: u64,
}

impl Default for AccessoryConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            serial: String::new(),
            username: None,
            password: None,
            session: None,
            polling_interval: default_polling_interval(),
        }
    }
}

impl AccessoryConfig {
    /// Validate accessory configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.serial.trim().is_empty() {
            errors.push(ValidationError::new(
                "accessory.serial",
                "device serial number is required",
            ));
        }

        if self.polling_interval < MIN_POLLING_INTERVAL {
            errors.push(ValidationError::new(
                "accessory.polling_interval",
                format!(
                    "polling interval {} is too short (minimum {} seconds)",
                    self.polling_interval, MIN_POLLING_INTERVAL
                ),
            ));
        } else if self.polling_interval > MAX_POLLING_INTERVAL {
            errors.push(ValidationError::new(
                "accessory.polling_interval",
                format!(
                    "polling interval {} is too long (maximum {} seconds / 1 hour)",
                    self.polling_interval, MAX_POLLING_INTERVAL
                ),
            ));
        }

        let has_session = self.session.as_deref().is_some_and(|s| !s.is_empty());
        if !has_session && self.credentials().is_none() {
            errors.push(ValidationError::new(
                "accessory",
                "either session or both username and password must be set",
            ));
        }

        errors
    }

    /// Credentials, when both username and password are non-empty.
    pub fn credentials(&self) -> Option<Credentials> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some(Credentials::new(user, pass))
            }
            _ => None,
        }
    }

    /// Settings for the core bridge.
    pub fn bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            name: self.name.clone(),
            serial: self.serial.clone(),
            session: self
                .session
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(Session::new),
            credentials: self.credentials(),
            poll: PollOptions::from_secs(self.polling_interval),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `accessory.serial`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("canary")
        .join("bridge.toml")
}
