use tokio::sync::watch;

use crate::dashboard::DashboardSnapshot;

/// Shared state of the HTTP handlers: a read-only view of the engine.
#[derive(Clone)]
pub struct AppState {
    pub snapshots: watch::Receiver<DashboardSnapshot>,
}

impl AppState {
    pub fn new(snapshots: watch::Receiver<DashboardSnapshot>) -> Self {
        Self { snapshots }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }
}
