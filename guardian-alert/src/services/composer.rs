//! Alert composer
//!
//! Renders the alert text from an [`AlertPayload`]. One composer instance
//! serves both the preview endpoint and the dispatch path, so the text a
//! person reviews is byte-for-byte the text that gets sent.

use guardian_common::model::AlertPayload;
use serde::Serialize;
use std::fmt::Write;

/// Shown when the payload has no usable victim name
pub const VICTIM_NAME_PLACEHOLDER: &str = "Unknown User";
pub const DEFAULT_REASON: &str = "Possible threat detected from voice/text cues.";
const ELLIPSIS: &str = "...";

/// Machine-checkable notes about substitutions made while composing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComposeWarning {
    /// Victim name was blank and the placeholder was used
    VictimNamePlaceholder,
    /// Transcript exceeded the excerpt bound and was cut
    TranscriptTruncated,
    /// Reasoning text exceeded its bound and was cut
    ReasonTruncated,
}

/// Composer output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedAlert {
    pub text: String,
    pub warnings: Vec<ComposeWarning>,
    pub map_link: Option<String>,
    pub char_count: usize,
}

impl ComposedAlert {
    pub fn has_warning(&self, warning: ComposeWarning) -> bool {
        self.warnings.contains(&warning)
    }
}

/// Deterministic alert renderer
///
/// The reason and transcript are the only free-text fields that grow with
/// upstream input. Each has its own bound, and both are shortened further
/// (reason first) when the rendered text would exceed `max_message_chars`.
#[derive(Debug, Clone)]
pub struct AlertComposer {
    transcript_max_chars: usize,
    reason_max_chars: usize,
    max_message_chars: usize,
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    reason: usize,
    transcript: usize,
}

impl AlertComposer {
    pub fn new(transcript_max_chars: usize, reason_max_chars: usize, max_message_chars: usize) -> Self {
        Self {
            transcript_max_chars: transcript_max_chars.max(1),
            reason_max_chars: reason_max_chars.max(1),
            max_message_chars: max_message_chars.max(1),
        }
    }

    /// Render a payload; total and free of I/O or clock reads
    pub fn compose(&self, payload: &AlertPayload) -> ComposedAlert {
        let mut warnings = Vec::new();

        let victim_name = match payload.victim_name().trim() {
            "" => {
                warnings.push(ComposeWarning::VictimNamePlaceholder);
                VICTIM_NAME_PLACEHOLDER
            }
            name => name,
        };

        let reason = match payload.recommendation().trim() {
            "" => DEFAULT_REASON,
            reason => reason,
        };
        let transcript = payload.transcript().trim();
        let map_link = payload.map_link();

        let mut limits = Limits {
            reason: self.reason_max_chars,
            transcript: self.transcript_max_chars,
        };
        let mut text = render(payload, victim_name, reason, transcript, limits, map_link.as_deref());

        let overflow = text.chars().count().saturating_sub(self.max_message_chars);
        if overflow > 0 {
            limits.reason = shrink(reason, limits.reason, overflow);
            text = render(payload, victim_name, reason, transcript, limits, map_link.as_deref());
        }
        let overflow = text.chars().count().saturating_sub(self.max_message_chars);
        if overflow > 0 {
            limits.transcript = shrink(transcript, limits.transcript, overflow);
            text = render(payload, victim_name, reason, transcript, limits, map_link.as_deref());
        }

        if is_cut(reason, limits.reason) {
            warnings.push(ComposeWarning::ReasonTruncated);
        }
        if is_cut(transcript, limits.transcript) {
            warnings.push(ComposeWarning::TranscriptTruncated);
        }

        let char_count = text.chars().count();
        ComposedAlert {
            text,
            warnings,
            map_link,
            char_count,
        }
    }
}

fn render(
    payload: &AlertPayload,
    victim_name: &str,
    reason: &str,
    transcript: &str,
    limits: Limits,
    map_link: Option<&str>,
) -> String {
    let reason = excerpt(reason, limits.reason);
    let transcript = excerpt(transcript, limits.transcript);

    let mut text = String::with_capacity(512);
    text.push_str("Guardian Alert\n\n");
    let _ = write!(text, "Contact: {}\n\n", victim_name);
    let _ = writeln!(text, "Risk: {}", payload.risk_level());
    let _ = write!(text, "Reason: {}\n\n", reason);
    if transcript.is_empty() {
        text.push_str("Message: (none)\n\n");
    } else {
        let _ = write!(text, "Message: \"{}\"\n\n", transcript);
    }

    match (payload.coordinates(), map_link) {
        (Some(coords), Some(link)) => {
            text.push_str("Location:\n");
            let _ = writeln!(text, "Lat: {:.6}", coords.lat());
            let _ = write!(text, "Lng: {:.6}\n\n", coords.lng());
            let _ = write!(text, "View Location: {}\n\n", link);
        }
        _ => text.push_str("Location: not available\n\n"),
    }

    let _ = write!(text, "Time: {}\n\n", payload.timestamp());
    text.push_str(payload.action_instruction());
    text
}

/// New limit that removes at least `overflow` rendered characters, floor 0
fn shrink(text: &str, limit: usize, overflow: usize) -> usize {
    let shown = text.chars().count().min(limit);
    let ellipsis = if is_cut(text, limit) { 0 } else { ELLIPSIS.len() };
    shown.saturating_sub(overflow + ellipsis)
}

fn is_cut(text: &str, limit: usize) -> bool {
    text.chars().nth(limit).is_some()
}

/// First `max_chars` characters, with an ellipsis when cut
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}
