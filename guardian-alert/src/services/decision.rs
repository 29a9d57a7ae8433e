//! Decision engine
//!
//! `RECEIVED → SCORED → {ALERT_PENDING | MONITOR_ONLY}`. Pure: it only
//! classifies, the pipeline acts on the result.

use guardian_common::model::{Decision, DecisionState, Priority, RiskLevel, RoutingChannel};

pub const HIGH_ALERT_THRESHOLD: f64 = 0.7;
pub const MEDIUM_ALERT_THRESHOLD: f64 = 0.9;
pub const IMMEDIATE_SCORE: f64 = 0.95;
pub const URGENT_SCORE: f64 = 0.75;

/// Whether a level/score pair warrants an alert
pub fn should_alert(risk_level: RiskLevel, score: f64) -> bool {
    match risk_level {
        RiskLevel::Critical => true,
        RiskLevel::High => score >= HIGH_ALERT_THRESHOLD,
        RiskLevel::Medium => score >= MEDIUM_ALERT_THRESHOLD,
        RiskLevel::Low | RiskLevel::None => false,
    }
}

pub fn priority(risk_level: RiskLevel, score: f64) -> Priority {
    if risk_level == RiskLevel::Critical || score >= IMMEDIATE_SCORE {
        Priority::Immediate
    } else if risk_level == RiskLevel::High || score >= URGENT_SCORE {
        Priority::Urgent
    } else {
        Priority::Standard
    }
}

pub fn routing(priority: Priority) -> Vec<RoutingChannel> {
    match priority {
        Priority::Immediate => vec![
            RoutingChannel::EmergencyServices,
            RoutingChannel::Contact,
            RoutingChannel::Sms,
        ],
        Priority::Urgent => vec![RoutingChannel::Contact, RoutingChannel::Sms],
        Priority::Standard => vec![RoutingChannel::Log],
    }
}

fn advance(state: DecisionState, alert: bool) -> DecisionState {
    match state {
        DecisionState::Received => DecisionState::Scored,
        DecisionState::Scored if alert => DecisionState::AlertPending,
        DecisionState::Scored => DecisionState::MonitorOnly,
        terminal => terminal,
    }
}

/// Classify a scored assessment
///
/// A non-finite score is treated as 0.
pub fn decide(risk_level: RiskLevel, score: f64) -> Decision {
    let score = if score.is_finite() { score } else { 0.0 };
    let alert = should_alert(risk_level, score);
    let priority = priority(risk_level, score);

    let mut state = DecisionState::Received;
    while !state.is_terminal() {
        state = advance(state, alert);
    }

    Decision {
        should_alert: alert,
        priority,
        routing: routing(priority),
        score,
        state,
    }
}
