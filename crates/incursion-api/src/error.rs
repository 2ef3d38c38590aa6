//! Error types for the read API.
//!
//! [`ApiError`] converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation, always as
//! a JSON body of the form `{"error": .., "status": ..}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use incursion_core::HistoryError;
use incursion_db::DbError;

/// Errors that can occur while serving a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A view could not be reconstructed.
    #[error("history unavailable: {0}")]
    History(#[from] HistoryError),

    /// A direct store read failed.
    #[error("store unavailable: {0}")]
    Store(#[from] DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        tracing::error!(error = %self, "Request failed");

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
