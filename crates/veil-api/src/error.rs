//! Error types for veil-api

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;

/// Result type alias for veil-api operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in veil-api
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from veil-core
    #[error(transparent)]
    Core(#[from] veil_core::Error),

    /// A request parameter could not be understood
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The listener could not be bound or the server failed
    #[error("Server error: {0}")]
    Server(#[source] std::io::Error),
}

impl Error {
    /// The HTTP status and category for this error.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Core(veil_core::Error::PermissionDenied { .. }) => {
                (StatusCode::FORBIDDEN, "permission_denied")
            }
            Error::Core(veil_core::Error::RecordNotFound { .. }) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            Error::Core(veil_core::Error::ValidationFailed { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed")
            }
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, category) = self.classify();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
        }
        let body = serde_json::json!({
            "error": {
                "category": category,
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}
