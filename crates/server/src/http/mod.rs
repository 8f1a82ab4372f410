//! HTTP interface.

pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/add", post(routes::add))
        .route("/query", post(routes::query))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
