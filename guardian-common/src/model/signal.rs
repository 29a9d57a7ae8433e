//! Canonical distress signal and the context it was captured in

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Geographic coordinates (WGS84 degrees)
///
/// Construction validates ranges; deserialization goes through the same check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinatePair")]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct CoordinatePair {
    lat: f64,
    lng: f64,
}

impl TryFrom<CoordinatePair> for Coordinates {
    type Error = Error;

    fn try_from(pair: CoordinatePair) -> Result<Self> {
        Coordinates::new(pair.lat, pair.lng)
    }
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(Error::InvalidInput(format!("Latitude out of range: {}", lat)));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(Error::InvalidInput(format!("Longitude out of range: {}", lng)));
        }
        Ok(Self { lat, lng })
    }

    /// Parse a `"lat,lng"` string (whitespace tolerated around each part)
    ///
    /// Returns `None` for anything else, including out-of-range values.
    pub fn parse(text: &str) -> Option<Self> {
        let (lat, lng) = text.split_once(',')?;
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        Self::new(lat, lng).ok()
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Map URL for these coordinates, rendered to six decimal places
    ///
    /// Pure function of the coordinates: the link is derived on demand and
    /// never stored next to them.
    pub fn map_link(&self) -> String {
        format!("https://maps.google.com/?q={:.6},{:.6}", self.lat, self.lng)
    }
}

/// Known facts about the person the signal concerns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub vulnerable: bool,
    #[serde(default)]
    pub language: Option<String>,
}

/// Where and when the signal was captured
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Context {
    location: Option<Coordinates>,
    location_label: Option<String>,
    timestamp_iso: String,
    subject_profile: Option<SubjectProfile>,
    emergency_contact: Option<String>,
}

impl Context {
    pub fn new(timestamp_iso: impl Into<String>) -> Self {
        Self {
            location: None,
            location_label: None,
            timestamp_iso: timestamp_iso.into(),
            subject_profile: None,
            emergency_contact: None,
        }
    }

    pub fn with_location(mut self, location: Coordinates) -> Self {
        self.location = Some(location);
        self
    }

    /// Free-text location description (address, landmark, unparsed input)
    pub fn with_location_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if !label.trim().is_empty() {
            self.location_label = Some(label.trim().to_string());
        }
        self
    }

    pub fn with_subject_profile(mut self, profile: SubjectProfile) -> Self {
        self.subject_profile = Some(profile);
        self
    }

    pub fn with_emergency_contact(mut self, contact: impl Into<String>) -> Self {
        let contact = contact.into();
        if !contact.trim().is_empty() {
            self.emergency_contact = Some(contact);
        }
        self
    }

    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    pub fn location_label(&self) -> Option<&str> {
        self.location_label.as_deref()
    }

    pub fn timestamp_iso(&self) -> &str {
        &self.timestamp_iso
    }

    pub fn subject_profile(&self) -> Option<&SubjectProfile> {
        self.subject_profile.as_ref()
    }

    pub fn emergency_contact(&self) -> Option<&str> {
        self.emergency_contact.as_deref()
    }

    /// Subject name if one was given and is not blank
    pub fn subject_name(&self) -> Option<&str> {
        self.subject_profile
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Modality of an attached media reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Image,
}

/// Where the media bytes live
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    /// Remote handle the reasoning service can fetch itself
    Uri(String),
    /// Base64-encoded bytes carried in the request
    Inline(String),
}

/// Opaque handle to an audio clip or image attached to a signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub mime_type: String,
    pub source: MediaSource,
}

/// One inbound distress signal, normalized
///
/// Holds at least one modality: non-blank text, audio, or an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    text: Option<String>,
    audio: Option<MediaRef>,
    image: Option<MediaRef>,
    context: Context,
}

impl Signal {
    pub fn new(
        text: Option<String>,
        audio: Option<MediaRef>,
        image: Option<MediaRef>,
        context: Context,
    ) -> Result<Self> {
        let text = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        if text.is_none() && audio.is_none() && image.is_none() {
            return Err(Error::InvalidInput(
                "At least one modality (text, audio, or image) is required".to_string(),
            ));
        }
        if matches!(&audio, Some(m) if m.kind != MediaKind::Audio) {
            return Err(Error::InvalidInput("Audio reference has non-audio kind".to_string()));
        }
        if matches!(&image, Some(m) if m.kind != MediaKind::Image) {
            return Err(Error::InvalidInput("Image reference has non-image kind".to_string()));
        }

        Ok(Self {
            text,
            audio,
            image,
            context,
        })
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Transcript text, empty when the signal is media-only
    pub fn transcript(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn audio(&self) -> Option<&MediaRef> {
        self.audio.as_ref()
    }

    pub fn image(&self) -> Option<&MediaRef> {
        self.image.as_ref()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Attached media in a stable order (audio first)
    pub fn attachments(&self) -> impl Iterator<Item = &MediaRef> {
        self.audio.iter().chain(self.image.iter())
    }
}
