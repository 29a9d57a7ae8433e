//! Assessment → decision → alert pipeline
//!
//! Holds the read-only client handles shared by every request. Each call
//! works on its own values; nothing is cached between requests.

use guardian_common::config::TomlConfig;
use guardian_common::events::{EventBus, GuardianEvent};
use guardian_common::model::{
    AlertDraft, AlertPayload, Decision, DeliveryErrorCode, DeliveryProof, DeliveryResult,
    DispatchTrigger, Provenance, RiskAssessment, Signal,
};
use guardian_common::phone::{is_e164, mask_optional};
use guardian_common::time::{millis_to_duration, now, now_iso};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::services::{
    decide, score, select_assessor, AlertComposer, AlertDispatcher, Assessor, ComposeWarning,
    ComposedAlert, DeliveryProofRecorder, LengthWarning, MessageLimits, ProofDetails,
    ReasoningService, SmsGateway,
};

/// Preview output: the exact text a send would carry, plus any findings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPreview {
    #[serde(flatten)]
    pub composed: ComposedAlert,
    pub to_masked: String,
    pub length_warning: Option<LengthWarning>,
}

/// A composed alert and what happened when it was dispatched
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertOutcome {
    pub text: String,
    pub warnings: Vec<ComposeWarning>,
    pub result: DeliveryResult,
    pub proof: DeliveryProof,
}

/// Everything the pipeline produced for one signal
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalOutcome {
    pub request_id: String,
    pub assessment: RiskAssessment,
    pub decision: Decision,
    /// Present only when the decision engine asked for an alert
    pub alert: Option<AlertOutcome>,
}

/// Manual-send metadata echoed into the proof
#[derive(Debug, Clone, Default)]
pub struct SendMeta {
    pub build_id: Option<String>,
    pub details: ProofDetails,
}

pub struct Pipeline {
    assessor: Arc<dyn Assessor>,
    composer: AlertComposer,
    dispatcher: AlertDispatcher,
    recorder: DeliveryProofRecorder,
    event_bus: EventBus,
    action_instruction: String,
}

impl Pipeline {
    /// Wire the stages from configuration and injected client handles
    pub fn new(
        config: &TomlConfig,
        reasoning: Option<Arc<dyn ReasoningService>>,
        gateway: Arc<dyn SmsGateway>,
        event_bus: EventBus,
    ) -> Self {
        let assessor = select_assessor(reasoning, millis_to_duration(config.reasoning.timeout_ms));
        let dispatcher = AlertDispatcher::new(
            gateway,
            MessageLimits {
                max_chars: config.alert.max_message_chars,
                safe_chars: config.alert.safe_message_chars,
            },
            millis_to_duration(config.gateway.timeout_ms),
        );

        Self {
            assessor,
            composer: AlertComposer::new(
                config.alert.transcript_max_chars,
                config.alert.reason_max_chars,
                config.alert.max_message_chars,
            ),
            dispatcher,
            recorder: DeliveryProofRecorder::new(event_bus.clone(), config.alert.build_id.clone()),
            event_bus,
            action_instruction: config.alert.action_instruction.clone(),
        }
    }

    /// LIVE when a reasoning service is wired in, FALLBACK otherwise
    pub fn mode(&self) -> Provenance {
        self.assessor.mode()
    }

    pub fn gateway_configured(&self) -> bool {
        self.dispatcher.is_configured()
    }

    pub fn provider(&self) -> &str {
        self.dispatcher.provider()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Assess a signal; never fails
    pub async fn assess(&self, signal: &Signal, request_id: &str) -> RiskAssessment {
        let assessment = self.assessor.assess(signal).await;

        info!(
            request_id,
            risk_level = %assessment.risk_level(),
            confidence = assessment.confidence(),
            provenance = %assessment.provenance(),
            indicators = assessment.indicators().len(),
            "Assessment completed"
        );
        self.event_bus.emit_lossy(GuardianEvent::AssessmentCompleted {
            request_id: request_id.to_string(),
            risk_level: assessment.risk_level(),
            confidence: assessment.confidence(),
            provenance: assessment.provenance(),
            timestamp: now(),
        });

        assessment
    }

    /// Full run: assess, score, decide, and dispatch at most one alert
    pub async fn process(&self, signal: Signal, request_id: &str) -> SignalOutcome {
        let assessment = self.assess(&signal, request_id).await;
        let score = score(&assessment, signal.context());
        let decision = decide(assessment.risk_level(), score);

        info!(
            request_id,
            should_alert = decision.should_alert,
            priority = %decision.priority,
            score = decision.score,
            "Decision made"
        );
        self.event_bus.emit_lossy(GuardianEvent::DecisionMade {
            request_id: request_id.to_string(),
            should_alert: decision.should_alert,
            priority: decision.priority,
            score: decision.score,
            timestamp: now(),
        });

        let alert = if decision.should_alert {
            Some(self.dispatch_for_signal(&signal, &assessment, request_id).await)
        } else {
            None
        };

        SignalOutcome {
            request_id: request_id.to_string(),
            assessment,
            decision,
            alert,
        }
    }

    /// Validate a draft into a payload, filling timestamp and instruction defaults
    pub fn payload(&self, draft: AlertDraft) -> guardian_common::Result<AlertPayload> {
        AlertPayload::from_draft(draft, &now_iso(), &self.action_instruction)
    }

    /// Compose without sending, using the composer the dispatch path uses
    pub fn preview(&self, payload: &AlertPayload) -> AlertPreview {
        let composed = self.composer.compose(payload);
        let length_warning = self.dispatcher.limits().check(&composed.text).ok().flatten();
        AlertPreview {
            composed,
            to_masked: guardian_common::phone::mask_phone(payload.destination_address()),
            length_warning,
        }
    }

    /// Compose a payload and dispatch it
    pub async fn send_payload(
        &self,
        payload: &AlertPayload,
        trigger: DispatchTrigger,
        request_id: &str,
    ) -> AlertOutcome {
        let composed = self.composer.compose(payload);
        let result = self
            .dispatcher
            .dispatch(payload.destination_address(), &composed.text, request_id)
            .await;

        let proof = self.recorder.record(
            &result,
            trigger,
            ProofDetails {
                build_id: None,
                victim_name: Some(payload.victim_name().to_string()).filter(|n| !n.trim().is_empty()),
                risk_level: Some(payload.risk_level()),
                coordinates: payload.coordinates(),
                message_chars: composed.char_count,
            },
        );

        AlertOutcome {
            text: composed.text,
            warnings: composed.warnings,
            result,
            proof,
        }
    }

    /// Dispatch caller-supplied text (manual send)
    pub async fn send_text(
        &self,
        destination: &str,
        message: &str,
        meta: SendMeta,
        request_id: &str,
    ) -> (DeliveryResult, DeliveryProof) {
        let result = self.dispatcher.dispatch(destination, message, request_id).await;
        let details = ProofDetails {
            build_id: meta.build_id,
            message_chars: message.chars().count(),
            ..meta.details
        };
        let proof = self.recorder.record(&result, DispatchTrigger::Manual, details);
        (result, proof)
    }

    /// Record a dispatch that failed before reaching the dispatcher
    pub fn reject(
        &self,
        code: DeliveryErrorCode,
        message: impl Into<String>,
        destination: Option<&str>,
        trigger: DispatchTrigger,
        request_id: &str,
    ) -> (DeliveryResult, DeliveryProof) {
        let result = DeliveryResult::failed(
            self.dispatcher.provider(),
            code,
            message,
            mask_optional(destination),
            request_id,
            now_iso(),
        );
        let proof = self.recorder.record(&result, trigger, ProofDetails::default());
        (result, proof)
    }

    async fn dispatch_for_signal(
        &self,
        signal: &Signal,
        assessment: &RiskAssessment,
        request_id: &str,
    ) -> AlertOutcome {
        let context = signal.context();
        let destination = context.emergency_contact().unwrap_or_default();

        let draft = AlertDraft {
            victim_name: context.subject_name().map(str::to_string),
            destination_address: destination.to_string(),
            risk_level: Some(assessment.risk_level()),
            recommendation: Some(assessment.reasoning().to_string()),
            transcript: signal.transcript().to_string(),
            lat: context.location().map(|c| c.lat()),
            lng: context.location().map(|c| c.lng()),
            timestamp: Some(context.timestamp_iso().to_string()),
            action_instruction: None,
        };

        let payload = match self.payload(draft) {
            Ok(payload) => payload,
            Err(e) => {
                let code = if is_e164(destination) {
                    DeliveryErrorCode::ValidationError
                } else {
                    DeliveryErrorCode::InvalidPhoneFormat
                };
                let (result, proof) = self.reject(
                    code,
                    e.to_string(),
                    Some(destination).filter(|d| !d.is_empty()),
                    DispatchTrigger::Automatic,
                    request_id,
                );
                return AlertOutcome {
                    text: String::new(),
                    warnings: Vec::new(),
                    result,
                    proof,
                };
            }
        };

        self.send_payload(&payload, DispatchTrigger::Automatic, request_id).await
    }
}
