//! Delivery results and proofs
//!
//! A successful [`DeliveryResult`] can only be built from a
//! [`ProviderMessageId`], which in turn cannot be blank.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Coordinates, RiskLevel};

/// Delivery failure taxonomy (wire names are part of the HTTP contract)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryErrorCode {
    /// Missing/empty/oversized fields
    ValidationError,
    /// Destination is not E.164
    InvalidPhoneFormat,
    /// Gateway reported a failure
    SnsPublishFailed,
    /// Gateway answered without a message identifier
    NoMessageId,
    /// Gateway unreachable or timed out
    NetworkError,
    /// Anything unexpected (including an unconfigured gateway)
    InternalError,
}

impl DeliveryErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryErrorCode::ValidationError => "VALIDATION_ERROR",
            DeliveryErrorCode::InvalidPhoneFormat => "INVALID_PHONE_FORMAT",
            DeliveryErrorCode::SnsPublishFailed => "SNS_PUBLISH_FAILED",
            DeliveryErrorCode::NoMessageId => "NO_MESSAGE_ID",
            DeliveryErrorCode::NetworkError => "NETWORK_ERROR",
            DeliveryErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for this failure; never 200
    pub fn http_status(&self) -> u16 {
        match self {
            DeliveryErrorCode::ValidationError | DeliveryErrorCode::InvalidPhoneFormat => 400,
            DeliveryErrorCode::SnsPublishFailed
            | DeliveryErrorCode::NoMessageId
            | DeliveryErrorCode::NetworkError => 502,
            DeliveryErrorCode::InternalError => 500,
        }
    }
}

impl fmt::Display for DeliveryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-blank message identifier issued by the messaging provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProviderMessageId(String);

impl ProviderMessageId {
    /// `None` for empty or whitespace-only identifiers
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of one dispatch attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    ok: bool,
    provider: String,
    provider_message_id: Option<ProviderMessageId>,
    destination_masked: String,
    error_code: Option<DeliveryErrorCode>,
    error_message: Option<String>,
    request_id: String,
    timestamp_iso: String,
}

impl DeliveryResult {
    pub fn delivered(
        provider: impl Into<String>,
        message_id: ProviderMessageId,
        destination_masked: impl Into<String>,
        request_id: impl Into<String>,
        timestamp_iso: impl Into<String>,
    ) -> Self {
        Self {
            ok: true,
            provider: provider.into(),
            provider_message_id: Some(message_id),
            destination_masked: destination_masked.into(),
            error_code: None,
            error_message: None,
            request_id: request_id.into(),
            timestamp_iso: timestamp_iso.into(),
        }
    }

    pub fn failed(
        provider: impl Into<String>,
        error_code: DeliveryErrorCode,
        error_message: impl Into<String>,
        destination_masked: impl Into<String>,
        request_id: impl Into<String>,
        timestamp_iso: impl Into<String>,
    ) -> Self {
        Self {
            ok: false,
            provider: provider.into(),
            provider_message_id: None,
            destination_masked: destination_masked.into(),
            error_code: Some(error_code),
            error_message: Some(error_message.into()),
            request_id: request_id.into(),
            timestamp_iso: timestamp_iso.into(),
        }
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn provider_message_id(&self) -> Option<&str> {
        self.provider_message_id.as_ref().map(ProviderMessageId::as_str)
    }

    pub fn destination_masked(&self) -> &str {
        &self.destination_masked
    }

    pub fn error_code(&self) -> Option<DeliveryErrorCode> {
        self.error_code
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn timestamp_iso(&self) -> &str {
        &self.timestamp_iso
    }

    /// 200 on success, the error code's status otherwise
    pub fn http_status(&self) -> u16 {
        match self.error_code {
            None if self.ok => 200,
            Some(code) => code.http_status(),
            None => 500,
        }
    }
}

/// What caused a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchTrigger {
    /// Decision engine asked for an alert
    Automatic,
    /// Operator-initiated send
    Manual,
}

/// Audit record of a dispatch attempt, safe to display (destination masked)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryProof {
    pub request_id: String,
    pub trigger: DispatchTrigger,
    pub ok: bool,
    pub http_status: u16,
    pub provider: String,
    pub message_id: Option<String>,
    pub to_masked: String,
    pub error_code: Option<DeliveryErrorCode>,
    pub error_message: Option<String>,
    pub message_chars: usize,
    pub build_id: Option<String>,
    pub victim_name: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub coordinates: Option<Coordinates>,
    pub recorded_at: String,
}
