//! Server-Sent Events endpoint

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use guardian_common::sse::create_event_sse_stream;

use crate::{AppState, MODULE_NAME};

/// GET /events
///
/// Streams assessment, decision and delivery-proof events.
pub async fn event_stream(State(state): State<AppState>) -> impl IntoResponse {
    create_event_sse_stream(MODULE_NAME, state.event_bus.subscribe())
}

/// Build event routes
pub fn event_routes() -> Router<AppState> {
    Router::new().route("/events", get(event_stream))
}
