//! Pipeline stages
//!
//! Leaves first: normalizer, requestor ([`reasoning`]), validator and
//! fallback (behind [`assessor`]), scorer, decision engine, composer,
//! dispatcher (over a [`gateway`]), proof recorder.

pub mod assessor;
pub mod composer;
pub mod decision;
pub mod dispatcher;
pub mod fallback;
pub mod gateway;
pub mod normalizer;
pub mod prompt;
pub mod proof;
pub mod reasoning;
pub mod scorer;
pub mod validator;

pub use assessor::{select_assessor, Assessor, HeuristicAssessor, ModelAssessor};
pub use composer::{AlertComposer, ComposeWarning, ComposedAlert, VICTIM_NAME_PLACEHOLDER};
pub use decision::decide;
pub use dispatcher::{AlertDispatcher, LengthWarning, MessageLimits};
pub use fallback::fallback_assess;
pub use gateway::{GatewayError, HttpSmsGateway, PublishAck, SmsGateway, UnconfiguredGateway};
pub use normalizer::{normalize, NormalizeError, RawLocation, RawMedia, RawSignal};
pub use proof::{DeliveryProofRecorder, ProofDetails};
pub use reasoning::{
    AssessmentRequestor, GeminiClient, ReasoningError, ReasoningRequest, ReasoningService,
};
pub use scorer::score;
pub use validator::{validate_assessment, ValidationFailure};
