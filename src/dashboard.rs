//! The console's render state and its only writer.
//!
//! [`Dashboard`] exclusively owns every bounded view. Each public mutation
//! runs to completion without yielding, so observers only ever see states
//! between whole operations; [`DashboardSnapshot`] is the read-only copy
//! handed to them.

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::{
    BoundedFeed, MetricBucket, MetricSeries, LOG_FEED_CAPACITY, NOTIFICATION_CAPACITY,
};
use crate::classify::{ClassifiedEvent, LiveTarget};
use crate::detect::{AlertPipeline, Incident, IncidentLedger, LogRecord, Severity};
use crate::link::ConnectionState;
use crate::notice::{Notice, NoticeBoard, NoticeKind};

pub const CONNECTED_LOG_MESSAGE: &str = "System Connected to Backend";
pub const CONNECTED_NOTICE_TITLE: &str = "System Connected";
pub const CONNECTED_NOTICE_MESSAGE: &str =
    "Successfully established connection to SecureVision Backend.";

/// Local wall-clock time of day, as stamped on synthetic records.
pub fn time_of_day() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Point-in-time copy of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub connection: ConnectionState,
    pub fps: f64,
    pub live_feed: Vec<LiveTarget>,
    pub logs: Vec<LogRecord>,
    pub notifications: Vec<LogRecord>,
    pub has_notifications: bool,
    pub incidents: Vec<Incident>,
    pub metrics: Vec<MetricBucket>,
    pub notices: Vec<Notice>,
}

pub struct Dashboard {
    connection: ConnectionState,
    fps: f64,
    live_feed: Vec<LiveTarget>,
    logs: BoundedFeed<LogRecord>,
    notifications: BoundedFeed<LogRecord>,
    incidents: IncidentLedger,
    metrics: MetricSeries,
    notices: NoticeBoard,
    pipeline: AlertPipeline,
}

impl Dashboard {
    pub fn new(pipeline: AlertPipeline) -> Self {
        Self::with_series(pipeline, MetricSeries::starting_at(Local::now()))
    }

    pub fn with_series(pipeline: AlertPipeline, metrics: MetricSeries) -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            fps: 0.0,
            live_feed: Vec::new(),
            logs: BoundedFeed::new(LOG_FEED_CAPACITY),
            notifications: BoundedFeed::new(NOTIFICATION_CAPACITY),
            incidents: IncidentLedger::new(),
            metrics,
            notices: NoticeBoard::new(),
            pipeline,
        }
    }

    /// Fold one classified frame into the views.
    pub fn apply(&mut self, event: ClassifiedEvent) {
        match event {
            ClassifiedEvent::LiveFeedSnapshot(targets) => {
                debug!(targets = targets.len(), "live feed replaced");
                self.live_feed = targets;
            }
            ClassifiedEvent::FpsSample(fps) => self.fps = fps,
            ClassifiedEvent::LogRecord(record) | ClassifiedEvent::LegacyCriticalAlert(record) => {
                self.ingest_log(record)
            }
            ClassifiedEvent::FpsWithLog { fps, log } => {
                self.fps = fps;
                self.ingest_log(log);
            }
        }
    }

    fn ingest_log(&mut self, record: LogRecord) {
        self.logs.push(record.clone());
        if record.severity.is_alert() {
            self.raise_alert(record);
        }
    }

    /// Apply every effect of one alert-severity record in a single step:
    /// notice, incident, metric bucket, notification.
    fn raise_alert(&mut self, record: LogRecord) {
        let Some(alert) = self.pipeline.derive(&record, &time_of_day()) else {
            return;
        };

        if let Some(notice) = &alert.notice {
            self.notices
                .raise(NoticeKind::Error, notice.title, notice.message.clone());
        }
        let incident_id = self
            .incidents
            .record_incident(alert.kind, alert.time.clone(), alert.location.clone());
        if alert.counts_toward_metrics() {
            self.metrics.record(alert.kind);
        }
        if alert.notify {
            self.notifications.push(record);
        }

        match alert.kind.notice_title() {
            Some(_) => {
                warn!(incident_id, kind = %alert.kind, time = %alert.time, "incident derived")
            }
            None => info!(incident_id, "unclassified alert recorded"),
        }
    }

    /// The link opened.
    pub fn on_connected(&mut self) {
        self.connection = ConnectionState::Connected;
        self.logs.push(LogRecord::new(
            Severity::Info,
            CONNECTED_LOG_MESSAGE,
            time_of_day(),
        ));
        self.notices.raise(
            NoticeKind::Success,
            CONNECTED_NOTICE_TITLE,
            CONNECTED_NOTICE_MESSAGE,
        );
    }

    /// The link closed or failed to open.
    pub fn on_disconnected(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.fps = 0.0;
    }

    pub fn set_connection(&mut self, state: ConnectionState) {
        self.connection = state;
    }

    /// Slide the metric window by one bucket.
    pub fn rotate_window(&mut self, label: impl Into<String>) {
        self.metrics.rotate(label);
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn live_feed(&self) -> &[LiveTarget] {
        &self.live_feed
    }

    pub fn logs(&self) -> &BoundedFeed<LogRecord> {
        &self.logs
    }

    pub fn notifications(&self) -> &BoundedFeed<LogRecord> {
        &self.notifications
    }

    pub fn incidents(&self) -> &IncidentLedger {
        &self.incidents
    }

    pub fn metrics(&self) -> &MetricSeries {
        &self.metrics
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            connection: self.connection,
            fps: self.fps,
            live_feed: self.live_feed.clone(),
            logs: self.logs.to_vec(),
            notifications: self.notifications.to_vec(),
            has_notifications: !self.notifications.is_empty(),
            incidents: self.incidents.to_vec(),
            metrics: self.metrics.to_vec(),
            notices: self.notices.to_vec(),
        }
    }
}
