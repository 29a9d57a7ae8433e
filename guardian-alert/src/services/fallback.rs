//! Keyword fallback assessor
//!
//! Deterministic heuristic used whenever a live assessment is unavailable
//! or fails validation. Scans the transcript against a fixed taxonomy and
//! grades the result into confidence bands.

use guardian_common::model::{RecommendedAction, RiskAssessment, RiskLevel};

/// One distress category and the phrases that trigger it
#[derive(Debug, Clone, Copy)]
pub struct KeywordCategory {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

impl KeywordCategory {
    /// Indicator tag reported when the category matches
    pub fn indicator(&self) -> String {
        format!("{}_detected", self.name)
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

pub const TAXONOMY: &[KeywordCategory] = &[
    KeywordCategory {
        name: "help",
        keywords: &["help", "help me", "need help"],
    },
    KeywordCategory {
        name: "fear",
        keywords: &["scared", "afraid", "frightened", "terrified"],
    },
    KeywordCategory {
        name: "danger",
        keywords: &["danger", "dangerous", "threat", "threatening"],
    },
    KeywordCategory {
        name: "unsafe",
        keywords: &["unsafe", "don't feel safe", "not safe"],
    },
    KeywordCategory {
        name: "following",
        keywords: &["following", "stalking", "chasing"],
    },
    KeywordCategory {
        name: "attack",
        keywords: &["attack", "attacking", "hurt", "hurting"],
    },
];

// Confidence is accumulated in whole percent so band edges compare exactly.
const BASE_CONFIDENCE_PCT: u32 = 30;
const PER_CATEGORY_PCT: u32 = 15;
const MAX_CONFIDENCE_PCT: u32 = 100;

/// Assess a transcript with the keyword heuristic
///
/// Total: any input, including an empty transcript, yields a complete
/// FALLBACK assessment.
pub fn fallback_assess(transcript: &str) -> RiskAssessment {
    let lowered = transcript.to_lowercase().replace('\u{2019}', "'");

    let indicators: Vec<String> = TAXONOMY
        .iter()
        .filter(|category| category.matches(&lowered))
        .map(KeywordCategory::indicator)
        .collect();

    let matched = indicators.len() as u32;
    let confidence_pct = (BASE_CONFIDENCE_PCT + PER_CATEGORY_PCT * matched).min(MAX_CONFIDENCE_PCT);
    let (risk_level, action) = band(confidence_pct);

    let reasoning = format!(
        "Fallback analysis detected {} distress indicator{} using keyword matching.",
        matched,
        if matched == 1 { "" } else { "s" }
    );

    RiskAssessment::heuristic(risk_level, confidence_pct, reasoning, indicators, action)
}

fn band(confidence_pct: u32) -> (RiskLevel, RecommendedAction) {
    match confidence_pct {
        80.. => (RiskLevel::High, RecommendedAction::Alert),
        60.. => (RiskLevel::Medium, RecommendedAction::Monitor),
        40.. => (RiskLevel::Low, RecommendedAction::Monitor),
        _ => (RiskLevel::None, RecommendedAction::None),
    }
}
