// src/routes/mod.rs
pub mod reply;

use crate::state::SharedState;
use axum::{
    Router,
    routing::{get, post},
};
use reply::get_reply_handler;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route("/get-reply", post(get_reply_handler))
        .route("/health", get(|| async { "OK" }))
        .route("/", get(|| async { "Emotion reply service is running" }))
        .layer(TraceLayer::new_for_http())
        // Every origin may call every route.
        .layer(CorsLayer::very_permissive())
}
