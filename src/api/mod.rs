//! HTTP API server

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::store::TodoStore;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

/// Build the API router using the provided application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/:id",
            get(handlers::get_todo)
                .patch(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Convenience helper wrapping a store directly
pub fn create_store_router(store: Arc<dyn TodoStore>) -> Router {
    create_router(AppState::new(store))
}
