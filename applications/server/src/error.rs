/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bloodbridge_checkout::CheckoutError;
use bloodbridge_core::BloodBridgeError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Body of every 401; which check failed is only logged
pub const UNAUTHORIZED_MESSAGE: &str = "unauthorized access";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] BloodBridgeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),
}

impl From<bloodbridge_storage::StorageError> for ServerError {
    fn from(err: bloodbridge_storage::StorageError) -> Self {
        // Convert StorageError -> BloodBridgeError -> ServerError
        ServerError::Database(err.into())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::Unauthenticated(ref reason) => {
                tracing::warn!("Unauthenticated request: {}", reason);
                (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.to_string())
            }
            ServerError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ServerError::UpstreamUnavailable(ref msg) => {
                tracing::warn!("Upstream unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Payment processor unavailable, try again later".to_string(),
                )
            }
            ServerError::Database(e) => match e {
                BloodBridgeError::Duplicate(msg) => (StatusCode::CONFLICT, msg),
                BloodBridgeError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
                other => {
                    tracing::error!("Database error: {:?}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Database error".to_string(),
                    )
                }
            },
            ServerError::Checkout(ref e) if e.is_transient() => {
                tracing::warn!("Payment processor unreachable: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Payment processor unavailable, try again later".to_string(),
                )
            }
            ServerError::Checkout(CheckoutError::SessionNotFound(id)) => (
                StatusCode::NOT_FOUND,
                format!("Checkout session not found: {}", id),
            ),
            ServerError::Checkout(ref e) => {
                tracing::error!("Checkout error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Payment processor error".to_string(),
                )
            }
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            ServerError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ServerError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(ServerError::Unauthenticated("expired".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(ServerError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(ServerError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(BloodBridgeError::invalid_input("bad field").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BloodBridgeError::duplicate("transactionId").into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(BloodBridgeError::storage("disk full").into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(CheckoutError::Unreachable("timeout".into()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(CheckoutError::SessionNotFound("cs_1".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(
                CheckoutError::Api {
                    status: 401,
                    message: "bad key".into()
                }
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
