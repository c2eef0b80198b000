use rand::Rng;

use crate::aggregate::{BoundedFeed, INCIDENT_CAPACITY};
use crate::detect::{Incident, IncidentKind, IncidentStatus};

/// Exclusive upper bound for randomly assigned incident ids.
const INCIDENT_ID_SPACE: u32 = 10_000;

/// Newest-first, capacity-bounded record of derived incidents.
///
/// Append-only: there is no path that changes an incident's status once it
/// has been recorded.
#[derive(Debug, Clone)]
pub struct IncidentLedger {
    entries: BoundedFeed<Incident>,
}

impl Default for IncidentLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl IncidentLedger {
    pub fn new() -> Self {
        Self {
            entries: BoundedFeed::new(INCIDENT_CAPACITY),
        }
    }

    /// Record a new `Pending` incident and return its id.
    pub fn record_incident(
        &mut self,
        kind: IncidentKind,
        time: impl Into<String>,
        location: impl Into<String>,
    ) -> u32 {
        let id = rand::thread_rng().gen_range(0..INCIDENT_ID_SPACE);
        self.entries.push(Incident {
            id,
            kind,
            time: time.into(),
            location: location.into(),
            status: IncidentStatus::Pending,
        });
        id
    }

    pub fn list_recent(&self, limit: usize) -> Vec<Incident> {
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn head(&self) -> Option<&Incident> {
        self.entries.head()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Incident> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Incident> {
        self.entries.to_vec()
    }
}
