//! Structured risk assessment

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Ordinal distress severity (NONE < LOW < MEDIUM < HIGH < CRITICAL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Critical,
        RiskLevel::High,
        RiskLevel::Medium,
        RiskLevel::Low,
        RiskLevel::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
            RiskLevel::None => "NONE",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; surrounding whitespace ignored
impl FromStr for RiskLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown risk level: {}", s)))
    }
}

/// What the assessor recommends doing about the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    Alert,
    Monitor,
    None,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::Alert => "ALERT",
            RecommendedAction::Monitor => "MONITOR",
            RecommendedAction::None => "NONE",
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendedAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALERT" => Ok(RecommendedAction::Alert),
            "MONITOR" => Ok(RecommendedAction::Monitor),
            "NONE" => Ok(RecommendedAction::None),
            _ => Err(Error::InvalidInput(format!("Unknown recommended action: {}", s))),
        }
    }
}

/// Where an assessment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    /// Validated output of the reasoning service
    Live,
    /// Keyword heuristic
    Fallback,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Live => "LIVE",
            Provenance::Fallback => "FALLBACK",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete risk assessment
///
/// All five fields are always present; `confidence` is finite and in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    risk_level: RiskLevel,
    confidence: f64,
    reasoning: String,
    indicators: BTreeSet<String>,
    recommended_action: RecommendedAction,
    provenance: Provenance,
}

impl RiskAssessment {
    pub fn new(
        risk_level: RiskLevel,
        confidence: f64,
        reasoning: impl Into<String>,
        indicators: impl IntoIterator<Item = String>,
        recommended_action: RecommendedAction,
        provenance: Provenance,
    ) -> Result<Self> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(Error::InvalidInput(format!(
                "Confidence out of range [0, 1]: {}",
                confidence
            )));
        }

        Ok(Self {
            risk_level,
            confidence,
            reasoning: reasoning.into(),
            indicators: indicators.into_iter().collect(),
            recommended_action,
            provenance,
        })
    }

    /// Heuristic assessment from a whole-percent confidence
    ///
    /// Percentages above 100 are clamped, so this cannot fail.
    pub fn heuristic(
        risk_level: RiskLevel,
        confidence_pct: u32,
        reasoning: impl Into<String>,
        indicators: impl IntoIterator<Item = String>,
        recommended_action: RecommendedAction,
    ) -> Self {
        Self {
            risk_level,
            confidence: f64::from(confidence_pct.min(100)) / 100.0,
            reasoning: reasoning.into(),
            indicators: indicators.into_iter().collect(),
            recommended_action,
            provenance: Provenance::Fallback,
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn indicators(&self) -> &BTreeSet<String> {
        &self.indicators
    }

    pub fn recommended_action(&self) -> RecommendedAction {
        self.recommended_action
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::None < RiskLevel::Low);
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_risk_level_parse_case_insensitive() {
        assert_eq!("HIGH".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert_eq!(" critical ".parse::<RiskLevel>().unwrap(), RiskLevel::Critical);
        assert_eq!("None".parse::<RiskLevel>().unwrap(), RiskLevel::None);
        assert!("SEVERE".parse::<RiskLevel>().is_err());
        assert!("".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_recommended_action_parse() {
        assert_eq!("alert".parse::<RecommendedAction>().unwrap(), RecommendedAction::Alert);
        assert!("ESCALATE".parse::<RecommendedAction>().is_err());
    }

    #[test]
    fn test_serde_wire_names() {
        assert_eq!(serde_json::to_string(&RiskLevel::Critical).unwrap(), "\"CRITICAL\"");
        assert_eq!(serde_json::to_string(&RecommendedAction::Monitor).unwrap(), "\"MONITOR\"");
        assert_eq!(serde_json::to_string(&Provenance::Fallback).unwrap(), "\"FALLBACK\"");
    }

    #[test]
    fn test_confidence_bounds_enforced() {
        let make = |c: f64| {
            RiskAssessment::new(
                RiskLevel::Low,
                c,
                "r",
                Vec::new(),
                RecommendedAction::Monitor,
                Provenance::Live,
            )
        };
        assert!(make(0.0).is_ok());
        assert!(make(1.0).is_ok());
        assert!(make(-0.01).is_err());
        assert!(make(1.01).is_err());
        assert!(make(f64::NAN).is_err());
    }

    #[test]
    fn test_indicators_deduplicated_and_sorted() {
        let a = RiskAssessment::new(
            RiskLevel::Medium,
            0.6,
            "r",
            vec!["b".to_string(), "a".to_string(), "b".to_string()],
            RecommendedAction::Monitor,
            Provenance::Fallback,
        )
        .unwrap();
        let got: Vec<&str> = a.indicators().iter().map(String::as_str).collect();
        assert_eq!(got, vec!["a", "b"]);
    }

    #[test]
    fn test_heuristic_confidence_from_percent() {
        let a = RiskAssessment::heuristic(
            RiskLevel::Medium,
            60,
            "r",
            Vec::new(),
            RecommendedAction::Monitor,
        );
        assert_eq!(a.confidence(), 0.6);
        assert_eq!(a.provenance(), Provenance::Fallback);

        let capped = RiskAssessment::heuristic(
            RiskLevel::High,
            250,
            "r",
            Vec::new(),
            RecommendedAction::Alert,
        );
        assert_eq!(capped.confidence(), 1.0);
    }
}
