//! The console's single event loop.
//!
//! One spawned task owns the [`ConnectionManager`] and the [`Dashboard`] and
//! serializes everything that can change them: link events, the metric
//! window rotation timer, notice expiry, and shutdown. Ready sources are
//! served in arrival order with no source prioritized over another, and no
//! handler awaits, so every mutation is applied whole before the next one
//! starts.
//!
//! Observers never touch the dashboard. After each handled event the task
//! publishes a fresh [`DashboardSnapshot`] on a `watch` channel, but only if
//! something visible changed.

use std::time::Duration;

use chrono::Local;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::aggregate::MetricSeries;
use crate::classify::classify;
use crate::dashboard::{Dashboard, DashboardSnapshot};
use crate::link::{ConnectionManager, ConnectionState, LinkEvent};

/// Period of the metric window rotation.
pub const DEFAULT_ROTATION_PERIOD: Duration = Duration::from_secs(60);

/// Counters reported when the engine stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSummary {
    /// Text frames received over the link.
    pub frames: u64,
    /// Frames dropped as undecodable or unrecognized.
    pub dropped: u64,
    /// Connections opened.
    pub connections: u64,
    /// Metric window rotations performed.
    pub rotations: u64,
}

/// Handle to a running engine.
///
/// Dropping the handle without calling [`stop`](Self::stop) also shuts the
/// engine down: the task observes the closed shutdown channel and exits.
pub struct EngineHandle {
    shutdown_tx: oneshot::Sender<()>,
    snapshots: watch::Receiver<DashboardSnapshot>,
    task: JoinHandle<EngineSummary>,
}

impl EngineHandle {
    /// A receiver that is notified whenever the dashboard changes.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Close the link, cancel every timer, and wait for the task to exit.
    pub async fn stop(self) -> EngineSummary {
        let _ = self.shutdown_tx.send(());
        match self.task.await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "engine task failed");
                EngineSummary::default()
            }
        }
    }
}

enum Step {
    Shutdown,
    Link(LinkEvent),
    NoticeExpired,
    Rotate,
}

pub struct Engine {
    link: ConnectionManager,
    dashboard: Dashboard,
    rotation_period: Duration,
    summary: EngineSummary,
}

impl Engine {
    pub fn new(link: ConnectionManager, dashboard: Dashboard, rotation_period: Duration) -> Self {
        Self {
            link,
            dashboard,
            rotation_period,
            summary: EngineSummary::default(),
        }
    }

    /// Spawn the event loop and begin connecting.
    pub fn start(mut self) -> EngineHandle {
        self.link.connect();
        self.dashboard.set_connection(self.link.state());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (snapshot_tx, snapshots) = watch::channel(self.dashboard.snapshot());

        info!(
            endpoint = self.link.endpoint(),
            retry_delay_ms = self.link.retry_delay().as_millis() as u64,
            rotation_sec = self.rotation_period.as_secs(),
            "starting telemetry engine"
        );

        let task = tokio::spawn(self.run(shutdown_rx, snapshot_tx));

        EngineHandle {
            shutdown_tx,
            snapshots,
            task,
        }
    }

    async fn run(
        mut self,
        shutdown_rx: oneshot::Receiver<()>,
        snapshot_tx: watch::Sender<DashboardSnapshot>,
    ) -> EngineSummary {
        tokio::pin!(shutdown_rx);
        let mut rotation =
            tokio::time::interval_at(Instant::now() + self.rotation_period, self.rotation_period);
        rotation.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let step = tokio::select! {
                _ = &mut shutdown_rx => Step::Shutdown,
                event = self.link.next_event() => Step::Link(event),
                Some(_) = self.dashboard.notices_mut().next_expired() => Step::NoticeExpired,
                _ = rotation.tick() => Step::Rotate,
            };

            match step {
                Step::Shutdown => {
                    debug!("shutdown signal received");
                    break;
                }
                Step::Link(event) => self.on_link_event(event),
                Step::NoticeExpired => {}
                Step::Rotate => {
                    let label = MetricSeries::label_for(&Local::now());
                    debug!(%label, "metric window rotated");
                    self.dashboard.rotate_window(label);
                    self.summary.rotations += 1;
                }
            }

            self.publish(&snapshot_tx);
        }

        self.link.stop();
        self.dashboard.on_disconnected();
        self.publish(&snapshot_tx);

        info!(
            frames = self.summary.frames,
            dropped = self.summary.dropped,
            connections = self.summary.connections,
            "telemetry engine stopped"
        );
        self.summary
    }

    fn on_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Opened => {
                self.summary.connections += 1;
                self.dashboard.on_connected();
            }
            LinkEvent::Frame(raw) => {
                self.summary.frames += 1;
                match classify(&raw) {
                    Ok(event) => self.dashboard.apply(event),
                    Err(e) => {
                        self.summary.dropped += 1;
                        debug!(error = %e, len = raw.len(), "frame dropped");
                    }
                }
            }
            LinkEvent::Closed => self.dashboard.on_disconnected(),
            LinkEvent::Reconnecting => self.dashboard.set_connection(ConnectionState::Connecting),
        }
    }

    fn publish(&self, snapshot_tx: &watch::Sender<DashboardSnapshot>) {
        snapshot_tx.send_if_modified(|current| {
            let next = self.dashboard.snapshot();
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
