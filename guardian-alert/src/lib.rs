//! guardian-alert library: distress signal assessment and alert dispatch
//!
//! Runs the normalize → assess → score → decide → compose → dispatch →
//! record pipeline behind an axum HTTP API.

use axum::http::{header, HeaderName, Method};
use axum::Router;
use guardian_common::events::EventBus;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod pipeline;
pub mod services;

pub use error::{ApiError, ApiResult};
pub use pipeline::Pipeline;

/// Module name reported on `/health` and in SSE logs
pub const MODULE_NAME: &str = "guardian-alert";

/// Response header carrying the request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub event_bus: EventBus,
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        let event_bus = pipeline.event_bus().clone();
        Self {
            pipeline: Arc::new(pipeline),
            event_bus,
            startup_time: Instant::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]);

    Router::new()
        .merge(api::health_routes())
        .merge(api::assessment_routes())
        .merge(api::alert_routes())
        .merge(api::event_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// New request identifier (UUID v4)
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
