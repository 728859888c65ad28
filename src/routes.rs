use axum::{
    Router,
    http::Method,
    middleware,
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::handler::{self, AppState};

pub fn routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handler::hello))
        .route("/bookmarks", get(handler::list_bookmarks).post(handler::create_bookmark))
        .route(
            "/bookmarks/:id",
            get(handler::get_bookmark).delete(handler::delete_bookmark),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_api_token))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
