//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`sb_core::Error`] via a wrapper so that
//! route handlers can return `Result<T, AppError>` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError(pub sb_core::Error);

impl From<sb_core::Error> for AppError {
    fn from(e: sb_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            // Internal details go to the log, not the client.
            tracing::error!(status = %status, error = %self.0, "request failed");
            let body = json!({ "error": { "message": "internal error" } });
            return (status, axum::Json(body)).into_response();
        }

        let body = json!({ "error": { "message": self.0.to_string() } });
        (status, axum::Json(body)).into_response()
    }
}

/// Shorthand for a validation failure with a caller-facing message.
pub fn bad_request(msg: impl Into<String>) -> AppError {
    AppError(sb_core::Error::Validation(msg.into()))
}
