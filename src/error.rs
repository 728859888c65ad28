use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ErrorResponse;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}

/// Transport-facing error. Handlers pick the variant so that the same
/// `ServiceError::NotFound` can render differently per route.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    BadRequest(String),
    BookmarkNotFound,
    NotFound,
    Internal { message: String, expose: bool },
}

impl ApiError {
    pub fn internal(err: &ServiceError, expose: bool) -> Self {
        ApiError::Internal {
            message: crate::unpack_error(err),
            expose,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use ApiError::*;
        match self {
            Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Unauthorized request" })),
            )
                .into_response(),
            BadRequest(msg) => (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(&msg))).into_response(),
            BookmarkNotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Bookmark Not Found")),
            )
                .into_response(),
            NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            Internal { message, expose } => {
                let msg = if expose { message } else { "server error".to_string() };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(&msg))).into_response()
            }
        }
    }
}
