//! Message classification for inbound telemetry frames.
//!
//! Precedence, first match wins:
//!
//! 1. `type == "LIVE_FEED"` with an `objects` array -> live feed snapshot.
//! 2. A non-zero numeric `fps` -> FPS sample.
//! 3. A nested `log` object -> log record.
//! 4. Otherwise `type == "CRITICAL"` with a top-level `message` -> legacy
//!    alert, normalized to a CRITICAL log record.
//!
//! Steps 2 and 3/4 are not exclusive: a heartbeat frame may carry both a
//! sample and a log line, which yields the combined [`ClassifiedEvent::FpsWithLog`].
//! Every frame yields at most one event.

pub mod wire;

pub use self::wire::{LiveTarget, ThreatLevel, LEGACY_CRITICAL_TAG, LIVE_FEED_TAG};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use self::wire::RawFrame;
use crate::detect::{LogRecord, Severity};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("malformed frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("legacy alert frame is missing '{0}'")]
    MissingField(&'static str),

    #[error("frame matches no known shape")]
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedEvent {
    /// Replaces the whole live feed.
    LiveFeedSnapshot(Vec<LiveTarget>),
    FpsSample(f64),
    LogRecord(LogRecord),
    /// Top-level critical alert, already normalized to a CRITICAL record.
    LegacyCriticalAlert(LogRecord),
    /// Heartbeat carrying both an FPS sample and a log record.
    FpsWithLog { fps: f64, log: LogRecord },
}

impl ClassifiedEvent {
    pub fn fps(&self) -> Option<f64> {
        match self {
            ClassifiedEvent::FpsSample(fps) | ClassifiedEvent::FpsWithLog { fps, .. } => Some(*fps),
            _ => None,
        }
    }

    pub fn log(&self) -> Option<&LogRecord> {
        match self {
            ClassifiedEvent::LogRecord(log)
            | ClassifiedEvent::LegacyCriticalAlert(log)
            | ClassifiedEvent::FpsWithLog { log, .. } => Some(log),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClassifiedEvent::LiveFeedSnapshot(_) => "live_feed",
            ClassifiedEvent::FpsSample(_) => "fps",
            ClassifiedEvent::LogRecord(_) => "log",
            ClassifiedEvent::LegacyCriticalAlert(_) => "legacy_critical",
            ClassifiedEvent::FpsWithLog { .. } => "fps_with_log",
        }
    }
}

/// Classify one raw text frame.
///
/// A malformed `objects` list or `log` object rejects the frame, except
/// that a valid FPS sample survives a malformed nested log and is returned
/// on its own.
pub fn classify(raw: &str) -> Result<ClassifiedEvent, ClassifyError> {
    let frame: RawFrame = serde_json::from_str(raw)?;

    if frame.kind.as_deref() == Some(LIVE_FEED_TAG) {
        if let Some(objects) = frame.objects {
            let targets: Vec<LiveTarget> = serde_json::from_value(objects)?;
            return Ok(ClassifiedEvent::LiveFeedSnapshot(targets));
        }
    }

    let fps = frame
        .fps
        .as_ref()
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v != 0.0);

    let log = match frame.log {
        Some(value) => match serde_json::from_value::<LogRecord>(value) {
            Ok(record) => Some((record, false)),
            // The FPS sample stands on its own.
            Err(e) if fps.is_some() => {
                debug!(error = %e, "nested log dropped, keeping fps sample");
                None
            }
            Err(e) => return Err(e.into()),
        },
        None if frame.kind.as_deref() == Some(LEGACY_CRITICAL_TAG) => {
            let message = frame.message.ok_or(ClassifyError::MissingField("message"))?;
            let record = LogRecord::new(
                Severity::Critical,
                message,
                frame.timestamp.unwrap_or_default(),
            );
            Some((record, true))
        }
        None => None,
    };

    match (fps, log) {
        (Some(fps), Some((log, _))) => Ok(ClassifiedEvent::FpsWithLog { fps, log }),
        (Some(fps), None) => Ok(ClassifiedEvent::FpsSample(fps)),
        (None, Some((log, false))) => Ok(ClassifiedEvent::LogRecord(log)),
        (None, Some((log, true))) => Ok(ClassifiedEvent::LegacyCriticalAlert(log)),
        (None, None) => Err(ClassifyError::Unrecognized),
    }
}
