//! Error types for guardian-alert
//!
//! Dispatch endpoints do not use [`ApiError`]: they always answer with the
//! send-response envelope. Everything else reports failures as
//! `{ "error": { "code", "message" }, "requestId" }`.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::NormalizeError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// guardian-common error
    #[error("{0}")]
    Common(#[from] guardian_common::Error),
}

impl From<NormalizeError> for ApiError {
    fn from(err: NormalizeError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
            ApiError::Common(guardian_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            ApiError::Common(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        }
    }

    /// Attach the request identifier the response should carry
    pub fn with_request_id(self, request_id: impl Into<String>) -> RequestError {
        RequestError {
            request_id: request_id.into(),
            error: self,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// An [`ApiError`] tied to a request identifier
#[derive(Debug)]
pub struct RequestError {
    pub request_id: String,
    pub error: ApiError,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.error.parts();
        if status.is_server_error() {
            tracing::error!(request_id = %self.request_id, code = error_code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            },
            "requestId": self.request_id,
        }));

        let mut response = (status, body).into_response();
        if let Ok(value) = HeaderValue::from_str(&self.request_id) {
            response.headers_mut().insert(crate::REQUEST_ID_HEADER, value);
        }
        response
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, RequestError>;
