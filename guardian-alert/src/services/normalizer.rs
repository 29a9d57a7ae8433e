//! Input normalizer
//!
//! Merges the raw modalities of an inbound request (text, audio reference,
//! image reference, context) into one canonical [`Signal`].

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use guardian_common::model::{
    Context, Coordinates, MediaKind, MediaRef, MediaSource, Signal, SubjectProfile,
};
use serde::Deserialize;
use thiserror::Error;

const AUDIO_FORMATS: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("m4a", "audio/mp4"),
    ("ogg", "audio/ogg"),
];

const IMAGE_FORMATS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

/// Normalization errors (all map to HTTP 400)
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Unsupported {kind} format: {format}")]
    UnsupportedFormat { kind: &'static str, format: String },

    #[error("{0} reference needs exactly one of uri or data")]
    MediaSource(&'static str),

    #[error("{0} data is not valid base64")]
    InvalidBase64(&'static str),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error(transparent)]
    Model(#[from] guardian_common::Error),
}

/// Raw media reference as sent by a client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMedia {
    /// Explicit MIME type (`audio/wav`)
    #[serde(default)]
    pub mime_type: Option<String>,
    /// File extension (`wav`, `.wav`)
    #[serde(default)]
    pub format: Option<String>,
    /// Remote handle
    #[serde(default)]
    pub uri: Option<String>,
    /// Base64 bytes
    #[serde(default)]
    pub data: Option<String>,
}

/// Location as either explicit coordinates or free text (`"lat,lng"` is parsed)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawLocation {
    Coordinates(Coordinates),
    Text(String),
}

/// Raw distress signal as posted to `/api/signal`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSignal {
    #[serde(default, alias = "transcript")]
    pub text: Option<String>,
    #[serde(default)]
    pub audio: Option<RawMedia>,
    #[serde(default)]
    pub image: Option<RawMedia>,
    #[serde(default)]
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, alias = "subjectProfile")]
    pub subject: Option<SubjectProfile>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Build a canonical [`Signal`]
///
/// `now_iso` stamps signals that arrive without a timestamp.
pub fn normalize(raw: RawSignal, now_iso: &str) -> Result<Signal, NormalizeError> {
    let timestamp = match raw.timestamp.as_deref().map(str::trim) {
        Some(ts) if !ts.is_empty() => {
            let parsed = chrono::DateTime::parse_from_rfc3339(ts)
                .map_err(|_| NormalizeError::InvalidTimestamp(ts.to_string()))?;
            guardian_common::time::to_iso(&parsed.with_timezone(&chrono::Utc))
        }
        _ => now_iso.to_string(),
    };

    let mut context = Context::new(timestamp);
    match raw.location {
        Some(RawLocation::Coordinates(coords)) => context = context.with_location(coords),
        Some(RawLocation::Text(text)) => context = apply_location_text(context, &text),
        None => {}
    }
    if let Some(profile) = raw.subject {
        context = context.with_subject_profile(profile);
    }
    if let Some(contact) = raw.contact {
        context = context.with_emergency_contact(contact);
    }

    let audio = raw
        .audio
        .map(|m| normalize_media(m, MediaKind::Audio))
        .transpose()?;
    let image = raw
        .image
        .map(|m| normalize_media(m, MediaKind::Image))
        .transpose()?;

    Ok(Signal::new(raw.text, audio, image, context)?)
}

/// `"lat,lng"` becomes coordinates; anything else is kept as a label
pub fn apply_location_text(context: Context, text: &str) -> Context {
    match Coordinates::parse(text) {
        Some(coords) => context.with_location(coords),
        None => context.with_location_label(text),
    }
}

fn normalize_media(raw: RawMedia, kind: MediaKind) -> Result<MediaRef, NormalizeError> {
    let (label, formats) = match kind {
        MediaKind::Audio => ("audio", AUDIO_FORMATS),
        MediaKind::Image => ("image", IMAGE_FORMATS),
    };

    let uri = raw.uri.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
    let data = raw.data.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());

    let source = match (uri, data) {
        (Some(uri), None) => MediaSource::Uri(uri),
        (None, Some(data)) => {
            BASE64
                .decode(data.as_bytes())
                .map_err(|_| NormalizeError::InvalidBase64(label))?;
            MediaSource::Inline(data)
        }
        _ => return Err(NormalizeError::MediaSource(label)),
    };

    let mime_type = resolve_mime(
        raw.mime_type.as_deref(),
        raw.format.as_deref(),
        match &source {
            MediaSource::Uri(uri) => Some(uri.as_str()),
            MediaSource::Inline(_) => None,
        },
        formats,
    )
    .ok_or_else(|| NormalizeError::UnsupportedFormat {
        kind: label,
        format: raw
            .mime_type
            .or(raw.format)
            .unwrap_or_else(|| "unknown".to_string()),
    })?;

    Ok(MediaRef {
        kind,
        mime_type: mime_type.to_string(),
        source,
    })
}

/// MIME type from an explicit type, an extension, or the URI's extension
fn resolve_mime(
    mime_type: Option<&str>,
    format: Option<&str>,
    uri: Option<&str>,
    formats: &[(&str, &'static str)],
) -> Option<&'static str> {
    if let Some(mime) = mime_type.map(str::trim).filter(|m| !m.is_empty()) {
        let mime = mime.to_ascii_lowercase();
        return formats.iter().find(|(_, m)| *m == mime).map(|(_, m)| *m);
    }

    let extension = match format.map(str::trim).filter(|f| !f.is_empty()) {
        Some(format) => format.trim_start_matches('.').to_ascii_lowercase(),
        None => {
            let path = uri?.split(['?', '#']).next()?;
            path.rsplit_once('.')?.1.to_ascii_lowercase()
        }
    };

    formats
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2026-01-28T12:34:56.789Z";

    fn text_signal(text: &str) -> RawSignal {
        RawSignal {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_text_only_signal() {
        let signal = normalize(text_signal("help me"), NOW).unwrap();
        assert_eq!(signal.transcript(), "help me");
        assert_eq!(signal.context().timestamp_iso(), NOW);
    }

    #[test]
    fn test_no_modality_rejected() {
        assert!(normalize(RawSignal::default(), NOW).is_err());
        assert!(normalize(text_signal("   "), NOW).is_err());
    }

    #[test]
    fn test_location_text_parsed_to_coordinates() {
        let mut raw = text_signal("help");
        raw.location = Some(RawLocation::Text("4.711,-74.0721".to_string()));
        let signal = normalize(raw, NOW).unwrap();
        let coords = signal.context().location().unwrap();
        assert_eq!(coords.lat(), 4.711);
        assert!(signal.context().location_label().is_none());
    }

    #[test]
    fn test_location_free_text_kept_as_label() {
        let mut raw = text_signal("help");
        raw.location = Some(RawLocation::Text("Parque 93, Bogotá".to_string()));
        let signal = normalize(raw, NOW).unwrap();
        assert!(signal.context().location().is_none());
        assert_eq!(signal.context().location_label(), Some("Parque 93, Bogotá"));
    }

    #[test]
    fn test_location_object_deserializes() {
        let raw: RawSignal =
            serde_json::from_str(r#"{"text": "help", "location": {"lat": 4.711, "lng": -74.0721}}"#)
                .unwrap();
        let signal = normalize(raw, NOW).unwrap();
        assert!(signal.context().location().is_some());
    }

    #[test]
    fn test_timestamp_normalized_to_utc() {
        let mut raw = text_signal("help");
        raw.timestamp = Some("2026-01-28T07:34:56-05:00".to_string());
        let signal = normalize(raw, NOW).unwrap();
        assert_eq!(signal.context().timestamp_iso(), "2026-01-28T12:34:56.000Z");

        let mut raw = text_signal("help");
        raw.timestamp = Some("yesterday".to_string());
        assert!(matches!(
            normalize(raw, NOW),
            Err(NormalizeError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_audio_uri_infers_mime_from_extension() {
        let raw = RawSignal {
            audio: Some(RawMedia {
                uri: Some("gs://bucket/clip.M4A".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let signal = normalize(raw, NOW).unwrap();
        let audio = signal.audio().unwrap();
        assert_eq!(audio.mime_type, "audio/mp4");
        assert_eq!(audio.source, MediaSource::Uri("gs://bucket/clip.M4A".to_string()));
    }

    #[test]
    fn test_inline_image_with_format() {
        let raw = RawSignal {
            image: Some(RawMedia {
                format: Some(".png".to_string()),
                data: Some("aGVsbG8=".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let signal = normalize(raw, NOW).unwrap();
        assert_eq!(signal.image().unwrap().mime_type, "image/png");
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let raw = RawSignal {
            audio: Some(RawMedia {
                uri: Some("https://example.test/clip.flac".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            normalize(raw, NOW),
            Err(NormalizeError::UnsupportedFormat { kind: "audio", .. })
        ));

        let raw = RawSignal {
            image: Some(RawMedia {
                mime_type: Some("image/gif".to_string()),
                uri: Some("https://example.test/a.gif".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(normalize(raw, NOW).is_err());
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let raw = RawSignal {
            audio: Some(RawMedia {
                format: Some("wav".to_string()),
                data: Some("not base64!!".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            normalize(raw, NOW),
            Err(NormalizeError::InvalidBase64("audio"))
        ));
    }

    #[test]
    fn test_media_needs_one_source() {
        let raw = RawSignal {
            audio: Some(RawMedia {
                format: Some("wav".to_string()),
                uri: Some("gs://a.wav".to_string()),
                data: Some("aGk=".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(normalize(raw, NOW), Err(NormalizeError::MediaSource("audio"))));
    }
}
