//! Domain model for the assessment → decision → alert pipeline
//!
//! Every value here is immutable once constructed. Constructors validate
//! their inputs so downstream stages can rely on the invariants without
//! re-checking them.

mod alert;
mod assessment;
mod decision;
mod delivery;
mod signal;

pub use alert::{AlertDraft, AlertPayload};
pub use assessment::{Provenance, RecommendedAction, RiskAssessment, RiskLevel};
pub use decision::{Decision, DecisionState, Priority, RoutingChannel};
pub use delivery::{DeliveryErrorCode, DeliveryProof, DeliveryResult, DispatchTrigger, ProviderMessageId};
pub use signal::{Context, Coordinates, MediaKind, MediaRef, MediaSource, Signal, SubjectProfile};
