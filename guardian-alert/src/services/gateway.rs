//! SMS gateway clients
//!
//! [`HttpSmsGateway`] posts an SNS-style publish request to a relay
//! endpoint. [`UnconfiguredGateway`] stands in when no endpoint is set and
//! fails every publish, so a missing gateway can never look like a delivery.

use async_trait::async_trait;
use guardian_common::config::GatewayConfig;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("guardian-alert/", env!("CARGO_PKG_VERSION"));
const SMS_TYPE_ATTRIBUTE: &str = "AWS.SNS.SMS.SMSType";
const MAX_PRICE_ATTRIBUTE: &str = "AWS.SNS.SMS.MaxPrice";

/// Gateway call errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Gateway timed out after {0:?}")]
    Timeout(Duration),

    #[error("Gateway rejected publish ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("SMS gateway is not configured")]
    NotConfigured,
}

/// What the gateway said after accepting a publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishAck {
    /// Provider identifier, if the acknowledgement carried one
    pub message_id: Option<String>,
}

/// Text-message gateway
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Provider tag reported in delivery results
    fn provider(&self) -> &str;

    fn is_configured(&self) -> bool {
        true
    }

    /// Submit one message; called at most once per triggering event
    async fn publish(&self, destination: &str, message: &str) -> Result<PublishAck, GatewayError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PublishRequest<'a> {
    phone_number: &'a str,
    message: &'a str,
    message_attributes: BTreeMap<&'static str, MessageAttribute>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MessageAttribute {
    data_type: &'static str,
    string_value: String,
}

/// SNS-compatible HTTP publish relay
pub struct HttpSmsGateway {
    http_client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
    provider: String,
    sms_type: String,
    max_price: String,
    timeout: Duration,
}

impl HttpSmsGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let endpoint = config
            .endpoint()
            .ok_or(GatewayError::NotConfigured)?
            .to_string();

        let timeout = Duration::from_millis(config.timeout_ms);
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            auth_token: config
                .auth_token
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            provider: config.provider.clone(),
            sms_type: config.sms_type.clone(),
            max_price: config.max_price.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn attributes(&self) -> BTreeMap<&'static str, MessageAttribute> {
        BTreeMap::from([
            (
                SMS_TYPE_ATTRIBUTE,
                MessageAttribute {
                    data_type: "String",
                    string_value: self.sms_type.clone(),
                },
            ),
            (
                MAX_PRICE_ATTRIBUTE,
                MessageAttribute {
                    data_type: "Number",
                    string_value: self.max_price.clone(),
                },
            ),
        ])
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn publish(&self, destination: &str, message: &str) -> Result<PublishAck, GatewayError> {
        let body = PublishRequest {
            phone_number: destination,
            message,
            message_attributes: self.attributes(),
        };

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.timeout)
            } else {
                GatewayError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&text),
            });
        }

        let message_id = serde_json::from_str::<Value>(&text)
            .ok()
            .as_ref()
            .and_then(extract_message_id);

        Ok(PublishAck { message_id })
    }
}

/// Message id from the known acknowledgement shapes
///
/// Accepts `MessageId`, `messageId`, and the SNS XML-to-JSON form
/// `PublishResponse.PublishResult.MessageId`.
pub fn extract_message_id(ack: &Value) -> Option<String> {
    let candidates = [
        ack.get("MessageId"),
        ack.get("messageId"),
        ack.pointer("/PublishResponse/PublishResult/MessageId"),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

fn rejection_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.pointer("/Error/Message")
            .or_else(|| v.get("message"))
            .or_else(|| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "no response body".to_string(),
        None => body.trim().chars().take(200).collect(),
    }
}

/// Gateway used when no endpoint is configured
#[derive(Debug, Clone)]
pub struct UnconfiguredGateway {
    provider: String,
}

impl UnconfiguredGateway {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }
}

#[async_trait]
impl SmsGateway for UnconfiguredGateway {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn publish(&self, _destination: &str, _message: &str) -> Result<PublishAck, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}
