//! Assessment strategies
//!
//! [`ModelAssessor`] asks the reasoning service and validates its answer;
//! [`HeuristicAssessor`] runs the keyword fallback directly. Both are total.
//! [`select_assessor`] is the single place that picks one.

use async_trait::async_trait;
use guardian_common::model::{Provenance, RiskAssessment, Signal};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::fallback::fallback_assess;
use super::reasoning::{AssessmentRequestor, ReasoningService};
use super::validator::validate_assessment;

/// Produces a complete assessment for any signal
#[async_trait]
pub trait Assessor: Send + Sync {
    /// Provenance this strategy reports when everything goes to plan
    fn mode(&self) -> Provenance;

    async fn assess(&self, signal: &Signal) -> RiskAssessment;
}

/// Live reasoning with fallback on any transport or validation failure
pub struct ModelAssessor {
    requestor: AssessmentRequestor,
}

impl ModelAssessor {
    pub fn new(requestor: AssessmentRequestor) -> Self {
        Self { requestor }
    }
}

#[async_trait]
impl Assessor for ModelAssessor {
    fn mode(&self) -> Provenance {
        Provenance::Live
    }

    async fn assess(&self, signal: &Signal) -> RiskAssessment {
        let raw = match self.requestor.request(signal).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(model = self.requestor.model(), error = %e, "Reasoning call failed, using fallback");
                return fallback_assess(signal.transcript());
            }
        };

        match validate_assessment(&raw) {
            Ok(assessment) => {
                info!(
                    risk_level = %assessment.risk_level(),
                    confidence = assessment.confidence(),
                    "Live assessment validated"
                );
                assessment
            }
            Err(e) => {
                warn!(error = %e, "Reasoning response rejected, using fallback");
                fallback_assess(signal.transcript())
            }
        }
    }
}

/// Keyword heuristic only
#[derive(Debug, Default)]
pub struct HeuristicAssessor;

#[async_trait]
impl Assessor for HeuristicAssessor {
    fn mode(&self) -> Provenance {
        Provenance::Fallback
    }

    async fn assess(&self, signal: &Signal) -> RiskAssessment {
        fallback_assess(signal.transcript())
    }
}

/// Model-backed when a reasoning service is available, heuristic otherwise
pub fn select_assessor(
    reasoning: Option<Arc<dyn ReasoningService>>,
    timeout: Duration,
) -> Arc<dyn Assessor> {
    match reasoning {
        Some(service) => {
            info!(model = service.model(), "Assessment mode: LIVE");
            Arc::new(ModelAssessor::new(AssessmentRequestor::new(service, timeout)))
        }
        None => {
            info!("Assessment mode: FALLBACK (no reasoning service configured)");
            Arc::new(HeuristicAssessor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reasoning::{ReasoningError, ReasoningRequest};
    use guardian_common::model::{Context, RiskLevel};

    struct Canned(Result<&'static str, ()>);

    #[async_trait]
    impl ReasoningService for Canned {
        fn model(&self) -> &str {
            "canned"
        }

        async fn generate(&self, _request: &ReasoningRequest) -> Result<String, ReasoningError> {
            self.0
                .map(str::to_string)
                .map_err(|_| ReasoningError::Network("connection refused".to_string()))
        }
    }

    fn signal(text: &str) -> Signal {
        Signal::new(
            Some(text.to_string()),
            None,
            None,
            Context::new("2026-01-28T12:34:56.789Z"),
        )
        .unwrap()
    }

    fn assessor(reply: Result<&'static str, ()>) -> Arc<dyn Assessor> {
        select_assessor(Some(Arc::new(Canned(reply))), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_live_assessment() {
        let a = assessor(Ok(r#"{"risk_level":"CRITICAL","confidence":0.95,"reasoning":"r","indicators":["weapon"],"recommended_action":"ALERT"}"#));
        assert_eq!(a.mode(), Provenance::Live);
        let result = a.assess(&signal("he has a knife")).await;
        assert_eq!(result.risk_level(), RiskLevel::Critical);
        assert_eq!(result.provenance(), Provenance::Live);
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let a = assessor(Ok("Sorry, I can't do that."));
        let result = a.assess(&signal("help me, someone is following me")).await;
        assert_eq!(result.provenance(), Provenance::Fallback);
        assert_eq!(result.risk_level(), RiskLevel::Medium);
        assert_eq!(result.confidence(), 0.6);
    }

    #[tokio::test]
    async fn test_transport_error_falls_back() {
        let a = assessor(Err(()));
        let result = a.assess(&signal("help")).await;
        assert_eq!(result.provenance(), Provenance::Fallback);
    }

    #[tokio::test]
    async fn test_no_service_selects_heuristic() {
        let a = select_assessor(None, Duration::from_secs(1));
        assert_eq!(a.mode(), Provenance::Fallback);
        let result = a.assess(&signal("help me, someone is following me")).await;
        assert_eq!(result.provenance(), Provenance::Fallback);
    }
}
