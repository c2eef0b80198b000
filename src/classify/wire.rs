//! Inbound frame shapes as pushed by the pipeline's `/ws/stats` endpoint.
//!
//! ```text
//! { "type": "LIVE_FEED", "objects": [ {id, category, details, status}, ... ] }
//! { "fps": 12.5, "log": { "type": "INFO", "message": "...", "timestamp": "..." } }
//! { "type": "CRITICAL", "message": "...", "timestamp": "..." }   (legacy)
//! ```
//!
//! Field presence, not a discriminant, decides what a frame is, so every
//! field is optional here and interpreted by [`super::classify`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `type` tag of a live feed snapshot.
pub const LIVE_FEED_TAG: &str = "LIVE_FEED";

/// `type` tag of a legacy top-level critical alert.
pub const LEGACY_CRITICAL_TAG: &str = "CRITICAL";

/// A decoded but not yet classified frame.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawFrame {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub objects: Option<Value>,
    pub fps: Option<Value>,
    pub log: Option<Value>,
    pub message: Option<String>,
    pub timestamp: Option<String>,
}

/// Threat assessment attached to a tracked target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatLevel {
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl ThreatLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ThreatLevel::Normal => "Normal",
            ThreatLevel::Warning => "WARNING",
            ThreatLevel::Critical => "CRITICAL",
        }
    }
}

/// One object currently tracked in view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveTarget {
    pub id: i64,
    pub category: String,
    #[serde(default)]
    pub details: String,
    #[serde(rename = "status")]
    pub threat_level: ThreatLevel,
}
