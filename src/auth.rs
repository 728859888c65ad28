use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::handler::AppState;

/// Rejects any request that does not carry `Authorization: Bearer <api_token>`.
pub async fn require_api_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == state.api_token.as_ref());

    if !authorized {
        tracing::error!(path = %request.uri().path(), "unauthorized request");
        return ApiError::Unauthorized.into_response();
    }
    next.run(request).await
}
