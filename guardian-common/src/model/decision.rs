//! Alert decision derived from a scored assessment

use serde::{Deserialize, Serialize};
use std::fmt;

/// How quickly the alert must go out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Immediate,
    Urgent,
    Standard,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Immediate => "IMMEDIATE",
            Priority::Urgent => "URGENT",
            Priority::Standard => "STANDARD",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel tag in a routing list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingChannel {
    EmergencyServices,
    Contact,
    Sms,
    Log,
}

/// Decision engine states; `AlertPending` and `MonitorOnly` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionState {
    Received,
    Scored,
    AlertPending,
    MonitorOnly,
}

impl DecisionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecisionState::AlertPending | DecisionState::MonitorOnly)
    }
}

/// Outcome of the decision engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub should_alert: bool,
    pub priority: Priority,
    pub routing: Vec<RoutingChannel>,
    pub score: f64,
    pub state: DecisionState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!DecisionState::Received.is_terminal());
        assert!(!DecisionState::Scored.is_terminal());
        assert!(DecisionState::AlertPending.is_terminal());
        assert!(DecisionState::MonitorOnly.is_terminal());
    }

    #[test]
    fn test_routing_wire_names() {
        let routing = vec![RoutingChannel::EmergencyServices, RoutingChannel::Contact, RoutingChannel::Sms];
        assert_eq!(
            serde_json::to_string(&routing).unwrap(),
            r#"["emergency_services","contact","sms"]"#
        );
    }
}
