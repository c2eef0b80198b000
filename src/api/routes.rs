//! API route definitions.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::state::AppState;
use crate::aggregate::{INCIDENT_CAPACITY, LOG_FEED_CAPACITY, NOTIFICATION_CAPACITY};
use crate::detect::IncidentStatus;
use crate::view::IncidentFilter;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/snapshot", get(snapshot))
        .route("/live-feed", get(live_feed))
        .route("/logs", get(logs))
        .route("/notifications", get(notifications))
        .route("/incidents", get(list_incidents))
        .route("/metrics", get(metrics))
        .route("/notices", get(notices))
}

/// Error body in the same envelope shape as successful responses.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "data": null,
            "meta": { "error": self.message }
        }));
        (self.status, body).into_response()
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let connection = state.snapshots.borrow().connection;
    Json(json!({
        "data": {
            "status": "ok",
            "connection": connection,
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn snapshot(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "data": state.snapshot(), "meta": {} }))
}

async fn live_feed(State(state): State<AppState>) -> Json<Value> {
    let feed = state.snapshot().live_feed;
    Json(json!({ "data": feed, "meta": { "total": feed.len() } }))
}

async fn logs(State(state): State<AppState>) -> Json<Value> {
    let logs = state.snapshot().logs;
    Json(json!({
        "data": logs,
        "meta": { "total": logs.len(), "capacity": LOG_FEED_CAPACITY }
    }))
}

async fn notifications(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.snapshot();
    Json(json!({
        "data": snapshot.notifications,
        "meta": {
            "total": snapshot.notifications.len(),
            "capacity": NOTIFICATION_CAPACITY,
            "unread": snapshot.has_notifications
        }
    }))
}

#[derive(Debug, Default, Deserialize)]
struct IncidentQuery {
    #[serde(default)]
    search: String,
    /// `ALL` (or absent) for every status.
    status: Option<String>,
}

impl IncidentQuery {
    fn filter(self) -> Result<IncidentFilter, ApiError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(
                s.parse::<IncidentStatus>()
                    .map_err(|e| ApiError::bad_request(e.to_string()))?,
            ),
        };
        Ok(IncidentFilter::new(self.search, status))
    }
}

async fn list_incidents(
    State(state): State<AppState>,
    Query(query): Query<IncidentQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = query.filter()?;
    let snapshot = state.snapshot();
    let rows = filter.apply(&snapshot.incidents);
    Ok(Json(json!({
        "data": rows,
        "meta": {
            "total": rows.len(),
            "recorded": snapshot.incidents.len(),
            "capacity": INCIDENT_CAPACITY
        }
    })))
}

async fn metrics(State(state): State<AppState>) -> Json<Value> {
    let buckets = state.snapshot().metrics;
    Json(json!({ "data": buckets, "meta": { "buckets": buckets.len() } }))
}

async fn notices(State(state): State<AppState>) -> Json<Value> {
    let live = state.snapshot().notices;
    Json(json!({ "data": live, "meta": { "total": live.len() } }))
}

#[cfg(test)]
mod tests {
    use crate::api::{router, state::AppState};
    use crate::classify::classify;
    use crate::dashboard::Dashboard;
    use crate::detect::AlertPipeline;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tokio::sync::watch;
    use tower::ServiceExt; // for `oneshot`

    fn app() -> axum::Router {
        let mut dashboard = Dashboard::new(AlertPipeline::default());
        for frame in [
            json!({"fps": 15.0}),
            json!({"log": {"type": "CRITICAL", "message": "Weapon detected at gate 3", "timestamp": "10:01:00"}}),
            json!({"log": {"type": "WARNING", "message": "Fight near exit", "timestamp": "10:02:00"}}),
        ] {
            dashboard.apply(classify(&frame.to_string()).unwrap());
        }
        let (_tx, rx) = watch::channel(dashboard.snapshot());
        router(AppState::new(rx))
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1_000_000)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, json) = get("/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["connection"], "DISCONNECTED");
        assert!(json["meta"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_snapshot_endpoint() {
        let (status, json) = get("/api/v1/snapshot").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["fps"], 15.0);
        assert_eq!(json["data"]["has_notifications"], true);
        assert_eq!(json["data"]["metrics"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_incidents_filtering() {
        let (_, all) = get("/api/v1/incidents").await;
        assert_eq!(all["meta"]["total"], 2);

        let (_, weapons) = get("/api/v1/incidents?search=weapon").await;
        assert_eq!(weapons["meta"]["total"], 1);
        assert_eq!(weapons["data"][0]["kind"], "WEAPON_DETECTED");

        let (_, pending) = get("/api/v1/incidents?status=pending").await;
        assert_eq!(pending["meta"]["total"], 2);

        let (_, resolved) = get("/api/v1/incidents?status=RESOLVED").await;
        assert_eq!(resolved["meta"]["total"], 0);
        assert_eq!(resolved["meta"]["recorded"], 2);
    }

    #[tokio::test]
    async fn test_invalid_status_is_rejected() {
        let (status, json) = get("/api/v1/incidents?status=closed").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["meta"]["error"].as_str().unwrap().contains("closed"));
    }

    #[tokio::test]
    async fn test_notifications_hold_only_critical() {
        let (_, json) = get("/api/v1/notifications").await;
        assert_eq!(json["meta"]["total"], 1);
        assert_eq!(json["data"][0]["type"], "CRITICAL");
        assert_eq!(json["meta"]["capacity"], 10);
    }

    #[tokio::test]
    async fn test_notices_are_deduplicated_views() {
        let (_, json) = get("/api/v1/notices").await;
        let titles: Vec<_> = json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["Weapon Detected", "Fight Active"]);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = get("/api/v1/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_routes_are_read_only() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/incidents")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
