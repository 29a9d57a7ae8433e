//! Response validator
//!
//! Extracts the JSON object from raw model output and checks it against the
//! five-field assessment schema. Callers route every failure to the
//! fallback assessor; see [`super::assessor`].

use guardian_common::model::{Provenance, RecommendedAction, RiskAssessment, RiskLevel};
use serde_json::{Map, Value};
use thiserror::Error;

/// Fields every assessment object must carry
pub const REQUIRED_FIELDS: [&str; 5] = [
    "risk_level",
    "confidence",
    "reasoning",
    "indicators",
    "recommended_action",
];

/// Why a model response was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("No JSON object found in response")]
    NoJsonObject,

    #[error("Invalid JSON: {0}")]
    Parse(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid risk_level: {0}")]
    InvalidRiskLevel(String),

    #[error("Invalid recommended_action: {0}")]
    InvalidAction(String),

    #[error("Confidence must be a number in [0, 1], got {0}")]
    InvalidConfidence(String),

    #[error("Field {0} has the wrong type")]
    WrongType(&'static str),
}

/// Validate raw model output into a LIVE assessment
pub fn validate_assessment(raw: &str) -> Result<RiskAssessment, ValidationFailure> {
    let body = strip_code_fence(raw);
    let json = extract_json_object(body).ok_or(ValidationFailure::NoJsonObject)?;

    let value: Value =
        serde_json::from_str(json).map_err(|e| ValidationFailure::Parse(e.to_string()))?;
    let object = value.as_object().ok_or(ValidationFailure::NoJsonObject)?;

    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(ValidationFailure::MissingField(field));
        }
    }

    let risk_level_text = string_field(object, "risk_level")?;
    let risk_level: RiskLevel = risk_level_text
        .parse()
        .map_err(|_| ValidationFailure::InvalidRiskLevel(risk_level_text.to_string()))?;

    let confidence = match object.get("confidence") {
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|c| (0.0..=1.0).contains(c))
            .ok_or_else(|| ValidationFailure::InvalidConfidence(n.to_string()))?,
        Some(other) => return Err(ValidationFailure::InvalidConfidence(other.to_string())),
        None => return Err(ValidationFailure::MissingField("confidence")),
    };

    let reasoning = string_field(object, "reasoning")?;

    let indicators = match object.get("indicators") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or(ValidationFailure::WrongType("indicators"))
            })
            .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(ValidationFailure::WrongType("indicators")),
    };

    let action_text = string_field(object, "recommended_action")?;
    let action: RecommendedAction = action_text
        .parse()
        .map_err(|_| ValidationFailure::InvalidAction(action_text.to_string()))?;

    RiskAssessment::new(
        risk_level,
        confidence,
        reasoning,
        indicators,
        action,
        Provenance::Live,
    )
    .map_err(|e| ValidationFailure::InvalidConfidence(e.to_string()))
}

fn string_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationFailure> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ValidationFailure::WrongType(field)),
        None => Err(ValidationFailure::MissingField(field)),
    }
}

/// Contents of the first ```` ``` ```` fence, or the input unchanged
///
/// A language tag on the opening fence line (```` ```json ````) is skipped.
pub fn strip_code_fence(raw: &str) -> &str {
    let Some(open) = raw.find("```") else {
        return raw;
    };
    let after_open = &raw[open + 3..];
    let body_start = match after_open.find('\n') {
        Some(newline) if !after_open[..newline].contains('{') => newline + 1,
        _ => 0,
    };
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// First balanced `{...}` object in `raw`
///
/// Braces inside JSON string literals are ignored.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let mut start = None;
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in raw.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if start.is_some() => in_string = true,
            '{' => {
                if start.is_none() {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &raw[s..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "risk_level": "HIGH",
        "confidence": 0.85,
        "reasoning": "Explicit help request.",
        "indicators": ["explicit_help_request", "fear_expressed"],
        "recommended_action": "ALERT"
    }"#;

    #[test]
    fn test_valid_response() {
        let assessment = validate_assessment(VALID).unwrap();
        assert_eq!(assessment.risk_level(), RiskLevel::High);
        assert_eq!(assessment.confidence(), 0.85);
        assert_eq!(assessment.indicators().len(), 2);
        assert_eq!(assessment.recommended_action(), RecommendedAction::Alert);
        assert_eq!(assessment.provenance(), Provenance::Live);
    }

    #[test]
    fn test_fenced_response() {
        let raw = format!("Here is my analysis:\n```json\n{}\n```\nStay safe.", VALID);
        assert!(validate_assessment(&raw).is_ok());

        let raw = format!("```\n{}\n```", VALID);
        assert!(validate_assessment(&raw).is_ok());
    }

    #[test]
    fn test_braces_inside_strings() {
        let raw = r#"{"risk_level":"LOW","confidence":0.4,"reasoning":"said \"}{\" twice","indicators":[],"recommended_action":"MONITOR"}"#;
        let assessment = validate_assessment(raw).unwrap();
        assert_eq!(assessment.reasoning(), "said \"}{\" twice");
    }

    #[test]
    fn test_lowercase_enums_accepted() {
        let raw = r#"{"risk_level":"critical","confidence":1,"reasoning":"r","indicators":["x"],"recommended_action":"alert"}"#;
        let assessment = validate_assessment(raw).unwrap();
        assert_eq!(assessment.risk_level(), RiskLevel::Critical);
        assert_eq!(assessment.confidence(), 1.0);
    }

    #[test]
    fn test_missing_field() {
        let raw = r#"{"risk_level":"HIGH","confidence":0.9,"reasoning":"r","indicators":[]}"#;
        assert_eq!(
            validate_assessment(raw).unwrap_err(),
            ValidationFailure::MissingField("recommended_action")
        );
    }

    #[test]
    fn test_out_of_range_confidence() {
        let raw = r#"{"risk_level":"HIGH","confidence":1.5,"reasoning":"r","indicators":[],"recommended_action":"ALERT"}"#;
        assert!(matches!(
            validate_assessment(raw),
            Err(ValidationFailure::InvalidConfidence(_))
        ));

        let raw = r#"{"risk_level":"HIGH","confidence":"0.9","reasoning":"r","indicators":[],"recommended_action":"ALERT"}"#;
        assert!(matches!(
            validate_assessment(raw),
            Err(ValidationFailure::InvalidConfidence(_))
        ));
    }

    #[test]
    fn test_unknown_enum_values() {
        let raw = r#"{"risk_level":"SEVERE","confidence":0.9,"reasoning":"r","indicators":[],"recommended_action":"ALERT"}"#;
        assert!(matches!(
            validate_assessment(raw),
            Err(ValidationFailure::InvalidRiskLevel(_))
        ));

        let raw = r#"{"risk_level":"HIGH","confidence":0.9,"reasoning":"r","indicators":[],"recommended_action":"CALL"}"#;
        assert!(matches!(
            validate_assessment(raw),
            Err(ValidationFailure::InvalidAction(_))
        ));
    }

    #[test]
    fn test_indicators_must_be_strings() {
        let raw = r#"{"risk_level":"HIGH","confidence":0.9,"reasoning":"r","indicators":[1,2],"recommended_action":"ALERT"}"#;
        assert_eq!(
            validate_assessment(raw).unwrap_err(),
            ValidationFailure::WrongType("indicators")
        );
    }

    #[test]
    fn test_garbage() {
        assert_eq!(
            validate_assessment("I cannot help with that.").unwrap_err(),
            ValidationFailure::NoJsonObject
        );
        assert!(matches!(
            validate_assessment("{risk_level: HIGH}"),
            Err(ValidationFailure::Parse(_))
        ));
        assert_eq!(validate_assessment("").unwrap_err(), ValidationFailure::NoJsonObject);
    }

    #[test]
    fn test_extract_first_balanced_object() {
        assert_eq!(extract_json_object("x {\"a\":{\"b\":1}} y {}"), Some("{\"a\":{\"b\":1}}"));
        assert_eq!(extract_json_object("{ unbalanced"), None);
    }
}
