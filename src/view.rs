//! Text projection of a [`DashboardSnapshot`].
//!
//! Every function here is a pure function of a snapshot: nothing reads the
//! live dashboard and nothing mutates anything.

use std::fmt::Write;

use crate::dashboard::DashboardSnapshot;
use crate::detect::{Incident, IncidentStatus, LogRecord};
use crate::link::ConnectionState;
use crate::session::Session;

/// Search and status filter of the incident table.
///
/// The search term matches case-insensitively against kind and location,
/// and as a plain substring of the id. An empty term matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    pub search: String,
    /// `None` shows every status.
    pub status: Option<IncidentStatus>,
}

impl IncidentFilter {
    pub fn new(search: impl Into<String>, status: Option<IncidentStatus>) -> Self {
        Self {
            search: search.into(),
            status,
        }
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = incident.kind.as_str().to_lowercase().contains(&needle)
            || incident.location.to_lowercase().contains(&needle)
            || incident.id.to_string().contains(&self.search);
        let matches_status = self.status.map_or(true, |s| s == incident.status);
        matches_search && matches_status
    }

    pub fn apply<'a>(&self, incidents: &'a [Incident]) -> Vec<&'a Incident> {
        incidents.iter().filter(|i| self.matches(i)).collect()
    }
}

fn connection_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Connected => "SYSTEM ONLINE",
        ConnectionState::Connecting => "CONNECTING",
        ConnectionState::Disconnected => "DISCONNECTED",
    }
}

/// Status line: connection, FPS, bell indicator and operator.
pub fn render_header(snapshot: &DashboardSnapshot, session: &Session) -> String {
    let (username, role) = session.display_identity();
    let bell = if snapshot.has_notifications { "*" } else { "-" };
    format!(
        "SecureVision | {} | FPS: {:.1} | Alerts [{}] | {} ({})",
        connection_label(snapshot.connection),
        snapshot.fps,
        bell,
        username,
        role
    )
}

pub fn render_live_targets(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::from("=== Live Targets ===\n");
    if snapshot.live_feed.is_empty() {
        out.push_str("Scanning area...\n");
        return out;
    }
    let _ = writeln!(out, "{:<6} | {:<14} | {:<10} | Details", "ID", "Category", "Status");
    let _ = writeln!(out, "{:-<6}-|-{:-<14}-|-{:-<10}-|-{:-<24}", "", "", "", "");
    for target in &snapshot.live_feed {
        let _ = writeln!(
            out,
            "{:<6} | {:<14} | {:<10} | {}",
            format!("#{}", target.id),
            target.category,
            target.threat_level.as_str(),
            target.details
        );
    }
    out
}

fn render_records(title: &str, records: &[LogRecord], empty: &str) -> String {
    let mut out = format!("=== {title} ===\n");
    if records.is_empty() {
        let _ = writeln!(out, "{empty}");
        return out;
    }
    for record in records {
        let _ = writeln!(
            out,
            "{:<10} | {:<8} | {}",
            record.timestamp,
            record.severity.as_str(),
            record.message
        );
    }
    out
}

/// Log feed, newest first.
pub fn render_logs(snapshot: &DashboardSnapshot) -> String {
    render_records("System Logs", &snapshot.logs, "No events yet.")
}

pub fn render_notifications(snapshot: &DashboardSnapshot) -> String {
    render_records("Notifications", &snapshot.notifications, "No new notifications.")
}

pub fn render_incidents(snapshot: &DashboardSnapshot, filter: &IncidentFilter) -> String {
    let mut out = String::from("=== Event Logs ===\n");
    let rows = filter.apply(&snapshot.incidents);
    if rows.is_empty() {
        out.push_str("No matching incidents.\n");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<6} | {:<18} | {:<10} | {:<10} | State",
        "ID", "Type", "Time", "Location"
    );
    let _ = writeln!(out, "{:-<6}-|-{:-<18}-|-{:-<10}-|-{:-<10}-|-{:-<11}", "", "", "", "", "");
    for incident in rows {
        let _ = writeln!(
            out,
            "{:<6} | {:<18} | {:<10} | {:<10} | {}",
            format!("#{}", incident.id),
            incident.kind.as_str(),
            incident.time,
            incident.location,
            incident.status
        );
    }
    out
}

/// Metric window, oldest bucket first.
pub fn render_metrics(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::from("=== Threat Activity ===\n");
    let _ = writeln!(out, "{:<6} | {:>7} | {:>6} | {:>7}", "Time", "Weapons", "Fights", "Luggage");
    let _ = writeln!(out, "{:-<6}-|-{:->7}-|-{:->6}-|-{:->7}", "", "", "", "");
    for bucket in &snapshot.metrics {
        let _ = writeln!(
            out,
            "{:<6} | {:>7} | {:>6} | {:>7}",
            bucket.label, bucket.weapons, bucket.fights, bucket.luggage
        );
    }
    out
}

pub fn render_notices(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();
    for notice in &snapshot.notices {
        let _ = writeln!(
            out,
            "[{}] {}: {}",
            notice.kind.as_str().to_uppercase(),
            notice.title,
            notice.message
        );
    }
    out
}

/// Every panel, top to bottom.
pub fn render_dashboard(snapshot: &DashboardSnapshot, session: &Session) -> String {
    let mut out = render_header(snapshot, session);
    out.push('\n');
    let notices = render_notices(snapshot);
    if !notices.is_empty() {
        out.push_str(&notices);
    }
    for panel in [
        render_live_targets(snapshot),
        render_logs(snapshot),
        render_notifications(snapshot),
        render_incidents(snapshot, &IncidentFilter::default()),
        render_metrics(snapshot),
    ] {
        out.push('\n');
        out.push_str(&panel);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::MetricBucket;
    use crate::classify::{LiveTarget, ThreatLevel};
    use crate::detect::{IncidentKind, Severity};
    use crate::notice::{Notice, NoticeKind};

    fn incident(id: u32, kind: IncidentKind, location: &str, status: IncidentStatus) -> Incident {
        Incident {
            id,
            kind,
            time: "10:01:00".into(),
            location: location.into(),
            status,
        }
    }

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            connection: ConnectionState::Connected,
            fps: 12.5,
            live_feed: vec![LiveTarget {
                id: 7,
                category: "knife".into(),
                details: "held".into(),
                threat_level: ThreatLevel::Critical,
            }],
            logs: vec![LogRecord::new(Severity::Critical, "Weapon detected", "10:01:00")],
            notifications: vec![LogRecord::new(Severity::Critical, "Weapon detected", "10:01:00")],
            has_notifications: true,
            incidents: vec![
                incident(4821, IncidentKind::WeaponDetected, "Cam 01", IncidentStatus::Pending),
                incident(77, IncidentKind::FightDetected, "Lobby", IncidentStatus::Resolved),
            ],
            metrics: vec![MetricBucket {
                label: "10:30".into(),
                weapons: 1,
                fights: 0,
                luggage: 2,
            }],
            notices: vec![Notice {
                id: 1,
                kind: NoticeKind::Error,
                title: "Weapon Detected".into(),
                message: "Weapon detected".into(),
            }],
        }
    }

    #[test]
    fn filter_searches_kind_location_and_id() {
        let weapon = incident(
            4821,
            IncidentKind::WeaponDetected,
            "Cam 01",
            IncidentStatus::Pending,
        );

        assert!(IncidentFilter::default().matches(&weapon));
        assert!(IncidentFilter::new("weapon", None).matches(&weapon));
        assert!(IncidentFilter::new("cam", None).matches(&weapon));
        assert!(IncidentFilter::new("82", None).matches(&weapon));
        assert!(!IncidentFilter::new("fight", None).matches(&weapon));
    }

    #[test]
    fn filter_by_status() {
        let snap = snapshot();
        let resolved = IncidentFilter::new("", Some(IncidentStatus::Resolved));
        let rows = resolved.apply(&snap.incidents);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 77);

        let none = IncidentFilter::new("", Some(IncidentStatus::FalseAlarm));
        assert!(none.apply(&snap.incidents).is_empty());
    }

    #[test]
    fn header_falls_back_to_default_identity() {
        let header = render_header(&snapshot(), &Session::new());
        assert!(header.contains("SYSTEM ONLINE"));
        assert!(header.contains("FPS: 12.5"));
        assert!(header.contains("Admin (Operator)"));
    }

    #[test]
    fn header_shows_disconnected() {
        let mut snap = snapshot();
        snap.connection = ConnectionState::Disconnected;
        snap.has_notifications = false;
        let header = render_header(&snap, &Session::new());
        assert!(header.contains("DISCONNECTED"));
        assert!(header.contains("Alerts [-]"));
    }

    #[test]
    fn incident_table_lists_filtered_rows() {
        let table = render_incidents(&snapshot(), &IncidentFilter::new("lobby", None));
        assert!(table.contains("#77"));
        assert!(table.contains("FIGHT_DETECTED"));
        assert!(table.contains("RESOLVED"));
        assert!(!table.contains("#4821"));

        let empty = render_incidents(&snapshot(), &IncidentFilter::new("gate", None));
        assert!(empty.contains("No matching incidents."));
    }

    #[test]
    fn empty_live_feed_shows_scanning() {
        let mut snap = snapshot();
        snap.live_feed.clear();
        assert!(render_live_targets(&snap).contains("Scanning area..."));
    }

    #[test]
    fn dashboard_contains_every_panel() {
        let text = render_dashboard(&snapshot(), &Session::new());
        for heading in [
            "Live Targets",
            "System Logs",
            "Notifications",
            "Event Logs",
            "Threat Activity",
        ] {
            assert!(text.contains(heading), "missing panel {heading}");
        }
        assert!(text.contains("[ERROR] Weapon Detected: Weapon detected"));
        assert!(text.contains("10:30"));
    }
}
