//! Error types for the HTTP layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body has the shape `{"error": "...", "status": 400}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tally_db::DbError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The store rejected or failed the operation.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A query string could not be parsed or failed validation.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A request body could not be parsed as an event.
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// The bearer token is missing or does not match.
    #[error("missing or invalid bearer token")]
    Unauthorized,
}

impl ApiError {
    /// HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Db(DbError::NotInitialized) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Db(DbError::InvalidEvent(_) | DbError::InvalidQuery(_))
            | Self::InvalidQuery(_)
            | Self::InvalidEvent(_) => StatusCode::BAD_REQUEST,
            Self::Db(DbError::StoreIo(_) | DbError::StoreInit { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            // Storage details stay in the log.
            tracing::error!(error = %self, "Request failed");
            String::from("internal storage error")
        } else {
            self.to_string()
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_expected_statuses() {
        assert_eq!(
            ApiError::from(DbError::NotInitialized).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(DbError::InvalidEvent(String::from("x"))).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidQuery(String::from("start")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }
}
