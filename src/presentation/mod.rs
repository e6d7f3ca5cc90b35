// Presentation layer - HTTP surface of the rendered dashboard
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_chart, get_fields, get_history, get_status, health_check, stream_dashboard,
};
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    // chart bodies are compressed in the handler
    Router::new()
        .route("/healthz", get(health_check))
        .route("/status", get(get_status))
        .route("/fields", get(get_fields))
        .route("/charts/:field", get(get_chart))
        .route("/history/:field", get(get_history))
        .route("/stream", get(stream_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
