//! REST API endpoints exposing the accessory.
//!
//! Every handler answers from the sensor cache or the poller statistics and
//! never waits on the Canary API.
//!
//! ## Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]. Reads of a
//! sensor that has no value yet return 503; unknown sensor names return 404.
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use canary_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use time::OffsetDateTime;

use canary_core::{CachedValue, Characteristic, PollStatsSnapshot, SensorKind, ServiceDescriptor};

use crate::state::AppState;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(get_status))
        .route("/api/accessory", get(get_accessory))
        .route("/api/sensors/{kind}", get(get_sensor))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

/// Service status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub serial: String,
    /// Whether a bearer token is held.
    pub session: bool,
    /// Whether the background poller is running.
    pub polling: bool,
    pub polling_interval_secs: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub stats: PollStatsSnapshot,
    /// Raw cached values by sensor type.
    pub values: HashMap<String, CachedValue>,
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        name: state.accessory.name().to_string(),
        serial: state.accessory.serial().to_string(),
        session: state.session.has_session(),
        polling: state.is_polling(),
        polling_interval_secs: state.config.accessory.polling_interval,
        started_at: state.started_at,
        stats: state.stats.snapshot(),
        values: state.accessory.cache().snapshot(),
    })
}

/// Accessory descriptor response.
#[derive(Debug, Serialize)]
pub struct AccessoryResponse {
    pub name: String,
    pub serial: String,
    pub services: Vec<ServiceDescriptor>,
}

async fn get_accessory(State(state): State<Arc<AppState>>) -> Json<AccessoryResponse> {
    Json(AccessoryResponse {
        name: state.accessory.name().to_string(),
        serial: state.accessory.serial().to_string(),
        services: state.accessory.services(),
    })
}

/// A characteristic value as reported to the platform.
#[derive(Debug, Serialize)]
pub struct SensorResponse {
    pub characteristic: Characteristic,
    pub value: f64,
    /// Category label, for air quality only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

async fn get_sensor(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<SensorResponse>, AppError> {
    let kind: SensorKind = kind
        .parse()
        .map_err(|e: canary_core::types::ParseError| AppError::NotFound(e.to_string()))?;

    let accessory = &state.accessory;
    let response = match kind {
        SensorKind::Temperature => SensorResponse {
            characteristic: Characteristic::CurrentTemperature,
            value: accessory.temperature()?,
            description: None,
        },
        SensorKind::Humidity => SensorResponse {
            characteristic: Characteristic::CurrentRelativeHumidity,
            value: accessory.humidity()?,
            description: None,
        },
        SensorKind::AirQuality => {
            let quality = accessory.air_quality()?;
            SensorResponse {
                characteristic: Characteristic::AirQuality,
                value: f64::from(quality.as_u8()),
                description: Some(quality.description()),
            }
        }
    };

    Ok(Json(response))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl From<canary_core::Error> for AppError {
    fn from(e: canary_core::Error) -> Self {
        match e {
            canary_core::Error::NotInitialized { .. } => AppError::Unavailable(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
