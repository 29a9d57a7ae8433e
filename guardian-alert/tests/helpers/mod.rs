//! Test Helper Utilities
//!
//! Scripted reasoning service and recording SMS gateway for driving the
//! HTTP API without network access.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use guardian_alert::services::{
    GatewayError, PublishAck, ReasoningError, ReasoningRequest, ReasoningService, SmsGateway,
};
use guardian_alert::{build_router, AppState, Pipeline};
use guardian_common::config::TomlConfig;
use guardian_common::events::EventBus;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Reasoning service that always answers with the same text
pub struct FakeReasoning {
    reply: Result<String, ()>,
    calls: AtomicUsize,
}

impl FakeReasoning {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningService for FakeReasoning {
    fn model(&self) -> &str {
        "fake-model"
    }

    async fn generate(&self, _request: &ReasoningRequest) -> Result<String, ReasoningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map_err(|_| ReasoningError::Network("connection refused".to_string()))
    }
}

/// Gateway that records every publish
pub struct RecordingGateway {
    message_id: Option<String>,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingGateway {
    pub fn accepting(message_id: &str) -> Arc<Self> {
        Arc::new(Self {
            message_id: Some(message_id.to_string()),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Acknowledges without a message id
    pub fn silent() -> Arc<Self> {
        Arc::new(Self {
            message_id: None,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsGateway for RecordingGateway {
    fn provider(&self) -> &str {
        "sns"
    }

    async fn publish(&self, destination: &str, message: &str) -> Result<PublishAck, GatewayError> {
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.to_string()));
        Ok(PublishAck {
            message_id: self.message_id.clone(),
        })
    }
}

/// App with the given reasoning service (None = keyword fallback) and gateway
pub fn setup_app(
    reasoning: Option<Arc<FakeReasoning>>,
    gateway: Arc<RecordingGateway>,
) -> (Router, EventBus) {
    let event_bus = EventBus::new(16);
    let reasoning = reasoning.map(|r| r as Arc<dyn ReasoningService>);
    let pipeline = Pipeline::new(&TomlConfig::default(), reasoning, gateway, event_bus.clone());
    (build_router(AppState::new(pipeline)), event_bus)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_raw(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Extract JSON body from response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
