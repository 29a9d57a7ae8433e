//! Alert preview and manual send

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use guardian_common::model::{DeliveryErrorCode, DispatchTrigger};
use serde::Serialize;
use tracing::{info, warn};

use super::types::{delivery_response, PreviewAlertRequest, SendAlertRequest};
use super::with_request_id;
use crate::error::{ApiError, ApiResult};
use crate::pipeline::{AlertPreview, SendMeta};
use crate::services::ProofDetails;
use crate::{new_request_id, AppState};

/// POST /api/alerts/preview response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    #[serde(flatten)]
    pub preview: AlertPreview,
    pub request_id: String,
}

/// POST /api/alerts/preview
///
/// Composes the message a send with the same draft would carry. Nothing is
/// dispatched or recorded.
pub async fn preview_alert(
    State(state): State<AppState>,
    body: Result<Json<PreviewAlertRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request_id = new_request_id();

    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()).with_request_id(&request_id))?;
    let payload = state
        .pipeline
        .payload(request.into_draft())
        .map_err(|e| ApiError::from(e).with_request_id(&request_id))?;

    let preview = state.pipeline.preview(&payload);
    info!(
        request_id = %request_id,
        to = %preview.to_masked,
        chars = preview.composed.char_count,
        warnings = preview.composed.warnings.len(),
        "Alert preview"
    );

    let body = PreviewResponse {
        preview,
        request_id: request_id.clone(),
    };
    Ok(with_request_id(Json(body).into_response(), &request_id))
}

/// POST /api/alerts/send
///
/// Always answers with the delivery envelope; the status is 200 only when
/// the gateway returned a message id.
pub async fn send_alert(
    State(state): State<AppState>,
    body: Result<Json<SendAlertRequest>, JsonRejection>,
) -> Response {
    let request_id = new_request_id();

    let request = match body {
        Ok(Json(request)) => request,
        Err(e) => {
            warn!(request_id = %request_id, "Malformed send request: {}", e.body_text());
            let (result, _) = state.pipeline.reject(
                DeliveryErrorCode::ValidationError,
                e.body_text(),
                None,
                DispatchTrigger::Manual,
                &request_id,
            );
            return delivery_response(&result);
        }
    };

    let send = request.into_canonical();
    let Some(destination) = send.destination else {
        let (result, _) = state.pipeline.reject(
            DeliveryErrorCode::ValidationError,
            "Missing destination: provide 'to' or 'phoneNumber'",
            None,
            DispatchTrigger::Manual,
            &request_id,
        );
        return delivery_response(&result);
    };

    let meta = SendMeta {
        build_id: send.build_id,
        details: ProofDetails {
            victim_name: send.victim_name,
            risk_level: send.risk_level,
            coordinates: send.coordinates,
            ..Default::default()
        },
    };
    let (result, _) = state
        .pipeline
        .send_text(&destination, &send.message, meta, &request_id)
        .await;

    delivery_response(&result)
}

/// Build alert routes
pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/api/alerts/preview", post(preview_alert))
        .route("/api/alerts/send", post(send_alert))
}
