//! Alert derivation: severity model, incident records, and the ledger.
//!
//! Alert-severity log records (WARNING / CRITICAL) are turned into
//! [`Incident`]s by the [`AlertPipeline`]. The kind of an incident is inferred
//! from keywords in the log message.

pub mod engine;
pub mod incident;

pub use self::engine::{AlertPipeline, DerivedAlert, NoticeDraft, DEFAULT_LOCATION};
pub use self::incident::IncidentLedger;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("unknown incident status '{0}' (expected PENDING, RESOLVED or FALSE_ALARM)")]
    UnknownStatus(String),
}

/// Severity levels carried by pipeline log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Whether a record of this severity feeds the alert pipeline.
    pub fn is_alert(self) -> bool {
        matches!(self, Severity::Warning | Severity::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// One line of the pipeline's log stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

impl LogRecord {
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// What an incident is about, inferred from the alert message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentKind {
    WeaponDetected,
    FightDetected,
    LuggageAbandoned,
    Unknown,
}

impl IncidentKind {
    /// Case-sensitive keyword match, first hit wins:
    /// "Weapon", then "Fight", then "Abandoned".
    pub fn infer(message: &str) -> Self {
        if message.contains("Weapon") {
            IncidentKind::WeaponDetected
        } else if message.contains("Fight") {
            IncidentKind::FightDetected
        } else if message.contains("Abandoned") {
            IncidentKind::LuggageAbandoned
        } else {
            IncidentKind::Unknown
        }
    }

    /// Notice title for classifiable kinds. `Unknown` raises no notice.
    pub fn notice_title(self) -> Option<&'static str> {
        match self {
            IncidentKind::WeaponDetected => Some("Weapon Detected"),
            IncidentKind::FightDetected => Some("Fight Active"),
            IncidentKind::LuggageAbandoned => Some("Abandoned Object"),
            IncidentKind::Unknown => None,
        }
    }

    pub fn is_classified(self) -> bool {
        self != IncidentKind::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentKind::WeaponDetected => "WEAPON_DETECTED",
            IncidentKind::FightDetected => "FIGHT_DETECTED",
            IncidentKind::LuggageAbandoned => "LUGGAGE_ABANDONED",
            IncidentKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review status of an incident.
///
/// Incidents are always created `Pending`. Nothing in the console moves them
/// to another status yet; the other variants exist for the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Pending,
    Resolved,
    FalseAlarm,
}

impl IncidentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Pending => "PENDING",
            IncidentStatus::Resolved => "RESOLVED",
            IncidentStatus::FalseAlarm => "FALSE_ALARM",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(IncidentStatus::Pending),
            "RESOLVED" => Ok(IncidentStatus::Resolved),
            "FALSE_ALARM" => Ok(IncidentStatus::FalseAlarm),
            _ => Err(DetectError::UnknownStatus(s.to_string())),
        }
    }
}

/// A derived incident, as kept in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Random id in `0..10000`. Collisions are possible and tolerated.
    pub id: u32,
    pub kind: IncidentKind,
    pub time: String,
    pub location: String,
    pub status: IncidentStatus,
}
