//! Errors surfaced by the temperature endpoint
//!
//! Every variant terminates the whole request. The `Display` text is sent
//! back to the caller as the `detail` field of the error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemperatureError {
    #[error("Failed to fetch data for sensor {device_id}")]
    UpstreamFetch { device_id: String, reason: String },

    #[error("No temperature sensor found for box {0}")]
    NoTemperatureSensor(String),

    #[error("No recent temperature reading for sensor {0}")]
    NoRecentReading(String),

    #[error("No valid temperature reading for sensor {0}")]
    InvalidReading(String),

    #[error("No temperature readings available")]
    NoReadingsAvailable,
}

/// Result type for temperature operations
pub type TemperatureResult<T> = Result<T, TemperatureError>;

impl TemperatureError {
    pub fn upstream(device_id: &str, reason: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            device_id: device_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UpstreamFetch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoTemperatureSensor(_)
            | Self::NoRecentReading(_)
            | Self::InvalidReading(_)
            | Self::NoReadingsAvailable => StatusCode::NOT_FOUND,
        }
    }
}

/// JSON body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl IntoResponse for TemperatureError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
