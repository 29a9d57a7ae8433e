//! Request and response bodies
//!
//! Legacy (`phoneNumber`, `emergencyMessage`) and current (`to`, `message`)
//! field names are reconciled here, once, by [`pick_field`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use guardian_common::model::{
    AlertDraft, Coordinates, Decision, DeliveryErrorCode, DeliveryResult, RiskAssessment,
    RiskLevel,
};
use serde::{Deserialize, Serialize};

use super::with_request_id;
use crate::pipeline::{AlertOutcome, SignalOutcome};
use crate::services::ComposeWarning;

/// POST /api/assess body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssessRequest {
    pub transcript: String,
    pub location: String,
    pub name: String,
    pub contact: String,
}

/// Wire form of an assessment
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentView {
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub reasoning: String,
    pub indicators: Vec<String>,
    pub recommended_action: String,
    /// "LIVE", "FALLBACK", or "ERROR"
    pub mode: String,
}

impl From<&RiskAssessment> for AssessmentView {
    fn from(a: &RiskAssessment) -> Self {
        Self {
            risk_level: a.risk_level(),
            confidence: a.confidence(),
            reasoning: a.reasoning().to_string(),
            indicators: a.indicators().iter().cloned().collect(),
            recommended_action: a.recommended_action().to_string(),
            mode: a.provenance().as_str().to_string(),
        }
    }
}

/// POST /api/assess response
#[derive(Debug, Clone, Serialize)]
pub struct AssessResponse {
    #[serde(flatten)]
    pub assessment: AssessmentView,
    /// Seconds, two decimals
    pub response_time: f64,
    pub request_id: String,
}

/// Metadata accompanying a manual send
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAlertMeta {
    #[serde(default)]
    pub victim_name: Option<String>,
    #[serde(default)]
    pub risk: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl SendAlertMeta {
    /// Unknown risk strings are dropped, not rejected
    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.risk.as_deref().and_then(|r| r.parse().ok())
    }

    /// Both coordinates, in range, or nothing
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng).ok(),
            _ => None,
        }
    }
}

/// Resolve a current/legacy field pair: current wins unless blank
pub fn pick_field(current: Option<String>, legacy: Option<String>) -> Option<String> {
    current
        .filter(|v| !v.trim().is_empty())
        .or(legacy)
        .filter(|v| !v.trim().is_empty())
}

/// POST /api/alerts/preview body, either naming convention
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewAlertRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub victim_name: Option<String>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub action_instruction: Option<String>,
}

impl PreviewAlertRequest {
    /// Missing destinations become empty and fail E.164 validation downstream
    pub fn into_draft(self) -> AlertDraft {
        AlertDraft {
            victim_name: self.victim_name,
            destination_address: pick_field(self.to, self.phone_number).unwrap_or_default(),
            risk_level: self.risk_level,
            recommendation: self.recommendation,
            transcript: self.transcript,
            lat: self.lat,
            lng: self.lng,
            timestamp: self.timestamp,
            action_instruction: self.action_instruction,
        }
    }
}

/// POST /api/alerts/send body, either naming convention
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAlertRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub emergency_message: Option<String>,
    #[serde(default)]
    pub build_id: Option<String>,
    #[serde(default)]
    pub meta: Option<SendAlertMeta>,
}

/// Send request after name reconciliation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalSend {
    pub destination: Option<String>,
    pub message: String,
    pub build_id: Option<String>,
    pub victim_name: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub coordinates: Option<Coordinates>,
}

impl SendAlertRequest {
    /// Current names (`to`, `message`) win over legacy ones when both are set
    pub fn into_canonical(self) -> CanonicalSend {
        let meta = self.meta.unwrap_or_default();
        CanonicalSend {
            destination: pick_field(self.to, self.phone_number),
            message: pick_field(self.message, self.emergency_message).unwrap_or_default(),
            build_id: self.build_id.filter(|b| !b.trim().is_empty()),
            victim_name: meta
                .victim_name
                .clone()
                .filter(|n| !n.trim().is_empty()),
            risk_level: meta.risk_level(),
            coordinates: meta.coordinates(),
        }
    }
}

/// Send response envelope; also used for automatic dispatch results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAlertResponse {
    pub ok: bool,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<DeliveryErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub to_masked: String,
    pub request_id: String,
    pub timestamp: String,
}

impl From<&DeliveryResult> for SendAlertResponse {
    fn from(result: &DeliveryResult) -> Self {
        Self {
            ok: result.ok(),
            provider: result.provider().to_string(),
            message_id: result.provider_message_id().map(str::to_string),
            error_code: result.error_code(),
            error_message: result.error_message().map(str::to_string),
            to_masked: result.destination_masked().to_string(),
            request_id: result.request_id().to_string(),
            timestamp: result.timestamp_iso().to_string(),
        }
    }
}

/// HTTP response for a delivery result: 200 only on success
pub fn delivery_response(result: &DeliveryResult) -> Response {
    let status =
        StatusCode::from_u16(result.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let response = (status, Json(SendAlertResponse::from(result))).into_response();
    with_request_id(response, result.request_id())
}

/// Wire form of an automatic alert
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    pub text: String,
    pub warnings: Vec<ComposeWarning>,
    pub delivery: SendAlertResponse,
}

impl From<&AlertOutcome> for AlertView {
    fn from(outcome: &AlertOutcome) -> Self {
        Self {
            text: outcome.text.clone(),
            warnings: outcome.warnings.clone(),
            delivery: SendAlertResponse::from(&outcome.result),
        }
    }
}

/// POST /api/signal response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalResponse {
    pub request_id: String,
    pub assessment: AssessmentView,
    pub decision: Decision,
    pub alert: Option<AlertView>,
}

impl From<&SignalOutcome> for SignalResponse {
    fn from(outcome: &SignalOutcome) -> Self {
        Self {
            request_id: outcome.request_id.clone(),
            assessment: AssessmentView::from(&outcome.assessment),
            decision: outcome.decision.clone(),
            alert: outcome.alert.as_ref().map(AlertView::from),
        }
    }
}
