//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use views::ViewError;

const INTERNAL_MESSAGE: &str = "internal server error";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Caller identity missing or malformed.
    Unauthorized(String),
    /// Caller is authenticated but acting in the wrong role.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order operation error.
    Order(OrderError),
    /// View composition error.
    View(ViewError),
    /// Internal server error. The message is logged, never returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Order(err) => order_error_to_response(err),
            ApiError::View(err) => view_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, String) {
    if !err.is_client_error() {
        tracing::error!(error = %err, "order operation failed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_MESSAGE.to_string(),
        );
    }

    let status = match &err {
        OrderError::ForbiddenTransition { .. } | OrderError::BuyerUnavailable => {
            StatusCode::FORBIDDEN
        }
        OrderError::NotFound(_) | OrderError::ItemNotFound { .. } => StatusCode::NOT_FOUND,
        OrderError::IllegalTransition { .. }
        | OrderError::TransitionRejected { .. }
        | OrderError::CartChanged => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string())
}

fn view_error_to_response(err: ViewError) -> (StatusCode, String) {
    match &err {
        ViewError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        ViewError::Repository(_) => {
            tracing::error!(error = %err, "view query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<ViewError> for ApiError {
    fn from(err: ViewError) -> Self {
        ApiError::View(err)
    }
}
