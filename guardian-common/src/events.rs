//! Pipeline events and the EventBus that broadcasts them
//!
//! Events are fire-and-forget: the pipeline never waits on a subscriber, and
//! no subscriber can influence a decision or a delivery.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::model::{DeliveryProof, Priority, Provenance, RiskLevel};

/// Guardian event types, serialized for SSE transmission
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum GuardianEvent {
    /// An assessment was produced (live or fallback)
    AssessmentCompleted {
        request_id: String,
        risk_level: RiskLevel,
        confidence: f64,
        provenance: Provenance,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The decision engine classified a scored assessment
    DecisionMade {
        request_id: String,
        should_alert: bool,
        priority: Priority,
        score: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A dispatch attempt finished (success or failure)
    DeliveryRecorded { proof: DeliveryProof },
}

impl GuardianEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            GuardianEvent::AssessmentCompleted { .. } => "AssessmentCompleted",
            GuardianEvent::DecisionMade { .. } => "DecisionMade",
            GuardianEvent::DeliveryRecorded { .. } => "DeliveryRecorded",
        }
    }
}

/// Broadcast channel for [`GuardianEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GuardianEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per slow subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<GuardianEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: GuardianEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
