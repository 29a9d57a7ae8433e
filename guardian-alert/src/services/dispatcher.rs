//! Alert dispatcher
//!
//! Validates the destination and the message, submits once to the gateway,
//! and reports success only when the gateway returns a message identifier.

use guardian_common::model::{DeliveryErrorCode, DeliveryResult, ProviderMessageId};
use guardian_common::phone::{is_e164, mask_phone};
use guardian_common::time::now_iso;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::gateway::{GatewayError, SmsGateway};

/// Length limits for outbound text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimits {
    /// Hard cap; longer messages are rejected
    pub max_chars: usize,
    /// Soft cap; longer messages are sent with a warning
    pub safe_chars: usize,
}

/// Non-fatal findings about a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LengthWarning {
    ExceedsSafeLength,
}

impl MessageLimits {
    /// Reject empty or oversized text; warn above the safe limit
    pub fn check(&self, message: &str) -> Result<Option<LengthWarning>, String> {
        if message.trim().is_empty() {
            return Err("Message text is empty".to_string());
        }
        let chars = message.chars().count();
        if chars > self.max_chars {
            return Err(format!(
                "Message is {} characters, limit is {}",
                chars, self.max_chars
            ));
        }
        if chars > self.safe_chars {
            return Ok(Some(LengthWarning::ExceedsSafeLength));
        }
        Ok(None)
    }
}

/// Submits composed alerts to the SMS gateway
#[derive(Clone)]
pub struct AlertDispatcher {
    gateway: Arc<dyn SmsGateway>,
    limits: MessageLimits,
    timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(gateway: Arc<dyn SmsGateway>, limits: MessageLimits, timeout: Duration) -> Self {
        Self {
            gateway,
            limits,
            timeout,
        }
    }

    pub fn provider(&self) -> &str {
        self.gateway.provider()
    }

    pub fn is_configured(&self) -> bool {
        self.gateway.is_configured()
    }

    pub fn limits(&self) -> MessageLimits {
        self.limits
    }

    /// Validate and submit one message
    ///
    /// Never panics and never returns `ok` without a provider message id.
    pub async fn dispatch(&self, destination: &str, message: &str, request_id: &str) -> DeliveryResult {
        let masked = mask_phone(destination);
        let provider = self.gateway.provider().to_string();

        let fail = |code: DeliveryErrorCode, msg: String| {
            DeliveryResult::failed(provider.clone(), code, msg, masked.clone(), request_id, now_iso())
        };

        if !is_e164(destination) {
            warn!(request_id, to = %masked, "Rejected destination: not E.164");
            return fail(
                DeliveryErrorCode::InvalidPhoneFormat,
                "Destination must be in E.164 format (e.g. +12025551234)".to_string(),
            );
        }

        match self.limits.check(message) {
            Err(reason) => {
                warn!(request_id, to = %masked, %reason, "Rejected message");
                return fail(DeliveryErrorCode::ValidationError, reason);
            }
            Ok(Some(LengthWarning::ExceedsSafeLength)) => {
                warn!(
                    request_id,
                    chars = message.chars().count(),
                    safe_chars = self.limits.safe_chars,
                    "Message exceeds safe length; carrier may split it"
                );
            }
            Ok(None) => {}
        }

        info!(request_id, to = %masked, provider = %provider, "Publishing alert");

        let published = tokio::time::timeout(self.timeout, self.gateway.publish(destination, message))
            .await
            .unwrap_or(Err(GatewayError::Timeout(self.timeout)));

        match published {
            Ok(ack) => match ack.message_id.and_then(ProviderMessageId::new) {
                Some(message_id) => {
                    info!(
                        request_id,
                        to = %masked,
                        message_id = message_id.as_str(),
                        "Alert accepted by gateway"
                    );
                    DeliveryResult::delivered(provider.clone(), message_id, masked.clone(), request_id, now_iso())
                }
                None => {
                    error!(request_id, to = %masked, "Gateway acknowledged without a message id");
                    fail(
                        DeliveryErrorCode::NoMessageId,
                        "Gateway returned no message identifier".to_string(),
                    )
                }
            },
            Err(e) => {
                let code = match &e {
                    GatewayError::Network(_) | GatewayError::Timeout(_) => DeliveryErrorCode::NetworkError,
                    GatewayError::Rejected { .. } => DeliveryErrorCode::SnsPublishFailed,
                    GatewayError::NotConfigured => DeliveryErrorCode::InternalError,
                };
                error!(request_id, to = %masked, error = %e, code = %code, "Alert dispatch failed");
                fail(code, e.to_string())
            }
        }
    }
}
