//! Alert payload: the single input to message composition
//!
//! The same payload value feeds the preview and the outbound message, so
//! the text a user reviews is the text that gets sent.

use serde::Serialize;

use super::{Coordinates, RiskLevel};
use crate::phone::{is_e164, mask_phone};
use crate::{Error, Result};

/// Unvalidated alert fields, assembled by the HTTP layer or the pipeline
#[derive(Debug, Clone, Default)]
pub struct AlertDraft {
    pub victim_name: Option<String>,
    pub destination_address: String,
    pub risk_level: Option<RiskLevel>,
    pub recommendation: Option<String>,
    pub transcript: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub timestamp: Option<String>,
    pub action_instruction: Option<String>,
}

/// Validated alert payload
///
/// `victim_name` is stored as given; placeholder substitution is the
/// composer's job so it can be reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    victim_name: String,
    #[serde(skip)]
    destination_address: String,
    risk_level: RiskLevel,
    recommendation: String,
    transcript: String,
    coordinates: Option<Coordinates>,
    timestamp: String,
    action_instruction: String,
}

impl AlertPayload {
    /// Validate a draft
    ///
    /// `timestamp` falls back to `default_timestamp` and `action_instruction`
    /// to `default_action_instruction` when absent or blank.
    pub fn from_draft(
        draft: AlertDraft,
        default_timestamp: &str,
        default_action_instruction: &str,
    ) -> Result<Self> {
        let destination = draft.destination_address;
        if !is_e164(&destination) {
            return Err(Error::InvalidInput(format!(
                "Destination must be in E.164 format (e.g. +12025551234), got {}",
                mask_phone(&destination)
            )));
        }

        let risk_level = draft
            .risk_level
            .ok_or_else(|| Error::InvalidInput("Missing risk level".to_string()))?;

        let coordinates = match (draft.lat, draft.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)?),
            (None, None) => None,
            _ => {
                return Err(Error::InvalidInput(
                    "Coordinates require both lat and lng".to_string(),
                ))
            }
        };

        let timestamp = non_blank(draft.timestamp).unwrap_or_else(|| default_timestamp.to_string());
        let action_instruction = non_blank(draft.action_instruction)
            .unwrap_or_else(|| default_action_instruction.to_string());

        Ok(Self {
            victim_name: draft.victim_name.unwrap_or_default(),
            destination_address: destination,
            risk_level,
            recommendation: draft.recommendation.unwrap_or_default(),
            transcript: draft.transcript,
            coordinates,
            timestamp,
            action_instruction,
        })
    }

    pub fn victim_name(&self) -> &str {
        &self.victim_name
    }

    pub fn destination_address(&self) -> &str {
        &self.destination_address
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// Derived from the coordinates, never stored separately
    pub fn map_link(&self) -> Option<String> {
        self.coordinates.map(|c| c.map_link())
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn action_instruction(&self) -> &str {
        &self.action_instruction
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
