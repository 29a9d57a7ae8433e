//! # Guardian Common Library
//!
//! Shared code for the Guardian alerting service including:
//! - Domain model (signals, assessments, decisions, alert payloads, delivery results)
//! - Configuration loading (CLI → ENV → TOML → defaults)
//! - Logging bootstrap
//! - E.164 phone number validation and masking
//! - Event bus and SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod model;
pub mod phone;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
