//! Delivery proof recorder
//!
//! Turns a dispatch outcome into a [`DeliveryProof`], writes it to the audit
//! log and broadcasts it on the event bus. Nothing here keeps state.

use guardian_common::events::{EventBus, GuardianEvent};
use guardian_common::model::{Coordinates, DeliveryProof, DeliveryResult, DispatchTrigger, RiskLevel};
use guardian_common::time::now_iso;
use tracing::{info, warn};

/// Alert details echoed into a proof (no destination: only the mask is kept)
#[derive(Debug, Clone, Default)]
pub struct ProofDetails {
    pub build_id: Option<String>,
    pub victim_name: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub coordinates: Option<Coordinates>,
    pub message_chars: usize,
}

#[derive(Debug, Clone)]
pub struct DeliveryProofRecorder {
    event_bus: EventBus,
    default_build_id: Option<String>,
}

impl DeliveryProofRecorder {
    pub fn new(event_bus: EventBus, default_build_id: Option<String>) -> Self {
        Self {
            event_bus,
            default_build_id,
        }
    }

    pub fn record(
        &self,
        result: &DeliveryResult,
        trigger: DispatchTrigger,
        details: ProofDetails,
    ) -> DeliveryProof {
        let proof = DeliveryProof {
            request_id: result.request_id().to_string(),
            trigger,
            ok: result.ok(),
            http_status: result.http_status(),
            provider: result.provider().to_string(),
            message_id: result.provider_message_id().map(str::to_string),
            to_masked: result.destination_masked().to_string(),
            error_code: result.error_code(),
            error_message: result.error_message().map(str::to_string),
            message_chars: details.message_chars,
            build_id: details.build_id.or_else(|| self.default_build_id.clone()),
            victim_name: details.victim_name,
            risk_level: details.risk_level,
            coordinates: details.coordinates,
            recorded_at: now_iso(),
        };

        if proof.ok {
            info!(
                target: "guardian::audit",
                request_id = %proof.request_id,
                trigger = ?proof.trigger,
                to = %proof.to_masked,
                message_id = proof.message_id.as_deref().unwrap_or_default(),
                build_id = proof.build_id.as_deref().unwrap_or("n/a"),
                victim = proof.victim_name.as_deref().unwrap_or("n/a"),
                risk = proof.risk_level.map(|r| r.as_str()).unwrap_or("n/a"),
                "Delivery confirmed"
            );
        } else {
            warn!(
                target: "guardian::audit",
                request_id = %proof.request_id,
                trigger = ?proof.trigger,
                to = %proof.to_masked,
                status = proof.http_status,
                code = proof.error_code.map(|c| c.as_str()).unwrap_or("n/a"),
                error = proof.error_message.as_deref().unwrap_or_default(),
                build_id = proof.build_id.as_deref().unwrap_or("n/a"),
                "Delivery failed"
            );
        }

        self.event_bus
            .emit_lossy(GuardianEvent::DeliveryRecorded { proof: proof.clone() });
        proof
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_common::model::{DeliveryErrorCode, ProviderMessageId};

    #[tokio::test]
    async fn test_proof_broadcast() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let recorder = DeliveryProofRecorder::new(bus, Some("build-7".to_string()));

        let result = DeliveryResult::delivered(
            "sns",
            ProviderMessageId::new("msg-9").unwrap(),
            "+12***1234",
            "req-1",
            "2026-01-28T12:34:56.789Z",
        );
        let proof = recorder.record(
            &result,
            DispatchTrigger::Manual,
            ProofDetails {
                victim_name: Some("Ana".to_string()),
                risk_level: Some(RiskLevel::High),
                message_chars: 120,
                ..Default::default()
            },
        );

        assert!(proof.ok);
        assert_eq!(proof.message_id.as_deref(), Some("msg-9"));
        assert_eq!(proof.build_id.as_deref(), Some("build-7"));
        assert_eq!(proof.http_status, 200);

        match rx.recv().await.unwrap() {
            GuardianEvent::DeliveryRecorded { proof: received } => assert_eq!(received, proof),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_failure_proof_keeps_error_taxonomy() {
        let recorder = DeliveryProofRecorder::new(EventBus::new(8), None);
        let result = DeliveryResult::failed(
            "sns",
            DeliveryErrorCode::NoMessageId,
            "Gateway returned no message identifier",
            "+12***1234",
            "req-2",
            "t",
        );
        let proof = recorder.record(
            &result,
            DispatchTrigger::Automatic,
            ProofDetails {
                build_id: Some("override".to_string()),
                ..Default::default()
            },
        );

        assert!(!proof.ok);
        assert_eq!(proof.error_code, Some(DeliveryErrorCode::NoMessageId));
        assert_eq!(proof.http_status, 502);
        assert!(proof.message_id.is_none());
        assert_eq!(proof.build_id.as_deref(), Some("override"));
        assert_eq!(proof.to_masked, "+12***1234");
    }
}
