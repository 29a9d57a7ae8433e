//! Emergency-analysis prompt

use guardian_common::model::{MediaKind, Signal};
use std::fmt::Write;

const UNKNOWN: &str = "Unknown";

/// Render the analysis prompt for a signal
///
/// Deterministic: the same signal always renders the same prompt.
pub fn build_emergency_prompt(signal: &Signal) -> String {
    let context = signal.context();

    let person = context.subject_name().unwrap_or(UNKNOWN);
    let location = match (context.location(), context.location_label()) {
        (Some(coords), Some(label)) => format!("{:.6},{:.6} ({})", coords.lat(), coords.lng(), label),
        (Some(coords), None) => format!("{:.6},{:.6}", coords.lat(), coords.lng()),
        (None, Some(label)) => label.to_string(),
        (None, None) => UNKNOWN.to_string(),
    };
    let contact = context.emergency_contact().unwrap_or(UNKNOWN);
    let transcript = signal.text().unwrap_or("No text provided");

    let mut prompt = String::with_capacity(2048);
    prompt.push_str(
        "You are an AI emergency detection system analyzing a potential distress situation.\n\n",
    );
    prompt.push_str("**Context**:\n");
    let _ = writeln!(prompt, "- Person: {}", person);
    let _ = writeln!(prompt, "- Location: {}", location);
    let _ = writeln!(prompt, "- Emergency Contact: {}", contact);
    let _ = writeln!(prompt, "- Time: {}", context.timestamp_iso());
    if let Some(profile) = context.subject_profile() {
        if let Some(age) = profile.age {
            let _ = writeln!(prompt, "- Age: {}", age);
        }
        if profile.vulnerable {
            prompt.push_str("- Flagged as vulnerable\n");
        }
        if let Some(language) = profile.language.as_deref() {
            let _ = writeln!(prompt, "- Language: {}", language);
        }
    }

    let _ = write!(prompt, "\n**Transcript**:\n\"{}\"\n", transcript);

    for media in signal.attachments() {
        let label = match media.kind {
            MediaKind::Audio => "Audio",
            MediaKind::Image => "Image",
        };
        let _ = writeln!(
            prompt,
            "\n{} attached (type: {}). Consider it together with the transcript.",
            label, media.mime_type
        );
    }

    prompt.push_str(RESPONSE_INSTRUCTIONS);
    prompt
}

const RESPONSE_INSTRUCTIONS: &str = r#"
**Task**: Analyze this situation for emergency indicators and respond with a JSON object containing:

1. **risk_level**: One of ["CRITICAL", "HIGH", "MEDIUM", "LOW", "NONE"]
   - CRITICAL: Immediate life-threatening danger
   - HIGH: Serious threat requiring urgent response
   - MEDIUM: Concerning situation requiring monitoring
   - LOW: Minor concern, no immediate action needed
   - NONE: No emergency indicators detected

2. **confidence**: Float between 0.0 and 1.0 indicating certainty

3. **reasoning**: Explanation of the assessment (2-3 sentences)

4. **indicators**: Array of specific distress signals detected (e.g., ["explicit_help_request", "fear_expressed", "stalking_concern"])

5. **recommended_action**: One of ["ALERT", "MONITOR", "NONE"]
   - ALERT: Notify the emergency contact now
   - MONITOR: Continue monitoring, prepare for escalation
   - NONE: No action needed

**Important**:
- Be sensitive to subtle distress signals
- Consider context (location, time, explicit requests)
- Respond ONLY with valid JSON, no additional text

Example response:
{
  "risk_level": "HIGH",
  "confidence": 0.85,
  "reasoning": "Explicit help request combined with fear expression and stalking concern indicates genuine distress.",
  "indicators": ["explicit_help_request", "fear_expressed", "stalking_concern"],
  "recommended_action": "ALERT"
}

Now analyze the situation above:"#;
