use crate::detect::{IncidentKind, LogRecord, Severity};

/// Incident location stamped on derived incidents when none is configured.
pub const DEFAULT_LOCATION: &str = "Cam 01";

/// A user-facing notice the pipeline wants raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeDraft {
    pub title: &'static str,
    pub message: String,
}

/// Everything one alert-severity record changes, decided up front so the
/// caller can apply it as a single unit.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedAlert {
    pub kind: IncidentKind,
    /// Incident time: the record's own timestamp, or the derivation time.
    pub time: String,
    pub location: String,
    /// CRITICAL records also go to the notification feed.
    pub notify: bool,
    /// Only classifiable kinds raise a notice.
    pub notice: Option<NoticeDraft>,
}

impl DerivedAlert {
    /// Whether the metric series should count this alert.
    pub fn counts_toward_metrics(&self) -> bool {
        self.kind.is_classified()
    }
}

/// Turns WARNING / CRITICAL log records into incident plans.
#[derive(Debug, Clone)]
pub struct AlertPipeline {
    location: String,
}

impl Default for AlertPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATION)
    }
}

impl AlertPipeline {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Plan the effects of `record`. Returns `None` for INFO records.
    ///
    /// `now` is the local time-of-day used when the record has no timestamp.
    pub fn derive(&self, record: &LogRecord, now: &str) -> Option<DerivedAlert> {
        if !record.severity.is_alert() {
            return None;
        }

        let kind = IncidentKind::infer(&record.message);
        let time = if record.timestamp.is_empty() {
            now.to_string()
        } else {
            record.timestamp.clone()
        };
        let notice = kind.notice_title().map(|title| NoticeDraft {
            title,
            message: record.message.clone(),
        });

        Some(DerivedAlert {
            kind,
            time,
            location: self.location.clone(),
            notify: record.severity == Severity::Critical,
            notice,
        })
    }
}
