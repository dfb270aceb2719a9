//! Axum routes for conversation endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{ask, cancel_turn, get_artifacts, get_conversation};
use crate::adapters::http::state::AppState;

/// Creates routes for conversation endpoints.
///
/// - POST /ask
/// - GET  /conversation/{thread_id}
/// - POST /conversation/{thread_id}/cancel
/// - GET  /conversation/{thread_id}/artifacts
pub fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route("/ask", post(ask))
        .route("/conversation/:thread_id", get(get_conversation))
        .route("/conversation/:thread_id/cancel", post(cancel_turn))
        .route("/conversation/:thread_id/artifacts", get(get_artifacts))
}
