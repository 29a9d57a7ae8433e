//! HTTP API handlers for guardian-alert

use axum::http::HeaderValue;
use axum::response::Response;

use crate::REQUEST_ID_HEADER;

pub mod alerts;
pub mod assess;
pub mod events;
pub mod health;
pub mod types;

pub use alerts::alert_routes;
pub use assess::assessment_routes;
pub use events::event_routes;
pub use health::health_routes;

/// Stamp the request identifier header onto a response
pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
