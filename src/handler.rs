use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use tracing::info;

use crate::error::{ApiError, ServiceError};
use crate::model::CreateBookmark;
use crate::service::BookmarkService;

#[derive(Clone)]
pub struct AppState {
    pub bookmarks: BookmarkService,
    pub api_token: Arc<str>,
    /// Whether 500 responses carry the underlying error text.
    pub expose_errors: bool,
}

impl AppState {
    fn server_error(&self, err: &ServiceError) -> Response {
        tracing::error!(error = %crate::unpack_error(err), "request failed");
        ApiError::internal(err, self.expose_errors).into_response()
    }
}

pub async fn hello() -> &'static str {
    info!("got hello request");
    "Hello, world!"
}

pub async fn list_bookmarks(State(state): State<AppState>) -> Response {
    match state.bookmarks.list().await {
        Ok(bookmarks) => (StatusCode::OK, Json(bookmarks)).into_response(),
        Err(e) => state.server_error(&e),
    }
}

pub async fn get_bookmark(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.bookmarks.get(&id).await {
        Ok(bookmark) => (StatusCode::OK, Json(bookmark)).into_response(),
        Err(ServiceError::NotFound(_)) => ApiError::BookmarkNotFound.into_response(),
        Err(e) => state.server_error(&e),
    }
}

pub async fn create_bookmark(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookmark>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "rejected bookmark payload");
            return ApiError::BadRequest("Invalid data".to_string()).into_response();
        }
    };

    match state.bookmarks.create(payload).await {
        Ok(created) => (
            StatusCode::CREATED,
            [(LOCATION, created.location)],
            Json(created.bookmark),
        )
            .into_response(),
        Err(ServiceError::Validation(e)) => ApiError::BadRequest(e.message.to_string()).into_response(),
        Err(e) => state.server_error(&e),
    }
}

pub async fn delete_bookmark(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.bookmarks.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(ServiceError::NotFound(_)) => ApiError::NotFound.into_response(),
        Err(e) => state.server_error(&e),
    }
}
