//! Axum routes for publishing endpoints.

use axum::routing::post;
use axum::Router;

use super::handlers::{publish, republish};
use crate::adapters::http::state::AppState;

pub fn publishing_routes() -> Router<AppState> {
    Router::new()
        .route("/publish", post(publish))
        .route("/republish", post(republish))
}
