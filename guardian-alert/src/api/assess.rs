//! Assessment endpoints
//!
//! `POST /api/assess` returns an assessment only. `POST /api/signal` runs the
//! whole pipeline, including at most one automatic alert.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use guardian_common::model::{Context, Signal, SubjectProfile};
use guardian_common::time::{now_iso, seconds_rounded};
use serde_json::json;
use std::time::Instant;
use tracing::{error, info};

use super::types::{AssessRequest, AssessResponse, AssessmentView, SignalResponse};
use super::with_request_id;
use crate::error::{ApiError, ApiResult};
use crate::services::normalizer::{apply_location_text, normalize, RawSignal};
use crate::{new_request_id, AppState};

/// POST /api/assess
pub async fn assess(
    State(state): State<AppState>,
    body: Result<Json<AssessRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let started = Instant::now();
    let request_id = new_request_id();

    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()).with_request_id(&request_id))?;
    info!(
        request_id = %request_id,
        transcript_chars = request.transcript.chars().count(),
        "Assessment request"
    );

    let signal = signal_from_request(request).map_err(|e| e.with_request_id(&request_id))?;

    // Panics inside the assessor surface as an ERROR-mode answer, not a dropped connection.
    let pipeline = state.pipeline.clone();
    let task_request_id = request_id.clone();
    let assessed = tokio::spawn(async move { pipeline.assess(&signal, &task_request_id).await }).await;

    let response_time = seconds_rounded(started.elapsed());
    match assessed {
        Ok(assessment) => {
            let body = AssessResponse {
                assessment: AssessmentView::from(&assessment),
                response_time,
                request_id: request_id.clone(),
            };
            Ok(with_request_id((StatusCode::OK, Json(body)).into_response(), &request_id))
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Assessment task failed");
            let body = json!({
                "risk_level": "MEDIUM",
                "confidence": 0.0,
                "reasoning": "Internal error during analysis",
                "indicators": ["INTERNAL_ERROR"],
                "recommended_action": "MONITOR",
                "mode": "ERROR",
                "response_time": response_time,
                "request_id": request_id,
            });
            Ok(with_request_id(
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response(),
                &request_id,
            ))
        }
    }
}

/// POST /api/signal
pub async fn process_signal(
    State(state): State<AppState>,
    body: Result<Json<RawSignal>, JsonRejection>,
) -> ApiResult<Response> {
    let request_id = new_request_id();

    let Json(raw) = body.map_err(|e| ApiError::BadRequest(e.body_text()).with_request_id(&request_id))?;
    let signal = normalize(raw, &now_iso()).map_err(|e| ApiError::from(e).with_request_id(&request_id))?;

    info!(
        request_id = %request_id,
        has_text = signal.text().is_some(),
        attachments = signal.attachments().count(),
        "Signal received"
    );

    let outcome = state.pipeline.process(signal, &request_id).await;
    let body = SignalResponse::from(&outcome);
    Ok(with_request_id(Json(body).into_response(), &request_id))
}

fn signal_from_request(request: AssessRequest) -> Result<Signal, ApiError> {
    let mut context = apply_location_text(Context::new(now_iso()), &request.location)
        .with_emergency_contact(request.contact);
    if !request.name.trim().is_empty() {
        context = context.with_subject_profile(SubjectProfile {
            name: Some(request.name),
            ..Default::default()
        });
    }

    Ok(Signal::new(Some(request.transcript), None, None, context)?)
}

/// Build assessment routes
pub fn assessment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/assess", post(assess))
        .route("/api/signal", post(process_signal))
}
