//! API Error Types
//!
//! Failures that end a request. Unreadable quota tokens and out-of-range
//! pages are absorbed before they get here and never reach the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::directory::{Dataset, DatasetError};

/// Error types for request handling
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No verified caller identity
    #[error("Unauthenticated request")]
    Unauthenticated,

    /// The dataset provider could not produce records
    #[error("Upstream dataset unavailable: {0}")]
    UpstreamUnavailable(#[from] DatasetError),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Caller-facing message; carries no internal detail
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Unauthenticated => "Unauthorized".to_string(),
            ApiError::UpstreamUnavailable(e) => match e.dataset() {
                Dataset::Agencies => "Failed to load agencies".to_string(),
                Dataset::Contacts => "Failed to load contacts".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Unauthenticated => warn!("Rejected unauthenticated request"),
            ApiError::UpstreamUnavailable(e) => error!(error = %e, "Dataset provider failed"),
        }

        let body = ErrorBody {
            message: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
