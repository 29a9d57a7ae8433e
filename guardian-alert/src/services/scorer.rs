//! Risk scorer: level × confidence × context multiplier, clamped to [0, 1]

use guardian_common::model::{Context, RiskAssessment, RiskLevel};

const MINOR_AGE: u32 = 18;
const MINOR_MULTIPLIER: f64 = 1.2;
const VULNERABLE_MULTIPLIER: f64 = 1.3;
const MULTIPLIER_MIN: f64 = 0.5;
const MULTIPLIER_MAX: f64 = 1.5;

/// Base score per risk level
pub fn base_score(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Critical => 1.0,
        RiskLevel::High => 0.8,
        RiskLevel::Medium => 0.5,
        RiskLevel::Low => 0.2,
        RiskLevel::None => 0.0,
    }
}

/// Vulnerability multiplier for the subject, clamped to [0.5, 1.5]
pub fn context_multiplier(context: &Context) -> f64 {
    let mut multiplier = 1.0;
    if let Some(profile) = context.subject_profile() {
        if profile.age.is_some_and(|age| age < MINOR_AGE) {
            multiplier *= MINOR_MULTIPLIER;
        }
        if profile.vulnerable {
            multiplier *= VULNERABLE_MULTIPLIER;
        }
    }
    multiplier.clamp(MULTIPLIER_MIN, MULTIPLIER_MAX)
}

/// Normalized score in [0, 1]; pure
pub fn score(assessment: &RiskAssessment, context: &Context) -> f64 {
    let raw = base_score(assessment.risk_level()) * assessment.confidence() * context_multiplier(context);
    raw.clamp(0.0, 1.0)
}
