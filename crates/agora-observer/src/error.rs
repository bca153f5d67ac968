//! Error types for the HTTP gateway.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use agora_core::driver::DriverError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The simulation has already been started.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A post ID could not be parsed from the request path.
    #[error("invalid post ID: {0}")]
    InvalidPostId(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DriverError> for ObserverError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::AlreadyStarted => Self::Conflict(err.to_string()),
            DriverError::NoSubreddits
            | DriverError::EngineNotReady { .. }
            | DriverError::Engine { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::InvalidPostId(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
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
    fn already_started_maps_to_conflict() {
        let err = ObserverError::from(DriverError::AlreadyStarted);
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_post_id_is_bad_request() {
        let err = ObserverError::InvalidPostId("xyz".to_owned());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_driver_failures_are_internal() {
        let err = ObserverError::from(DriverError::NoSubreddits);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
