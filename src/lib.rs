//! SecureVision console -- live telemetry engine for the operator dashboard.
//!
//! This crate keeps a persistent link to the detection pipeline, classifies
//! its frames, and folds them into bounded in-memory views (log feed,
//! notifications, incident ledger, metric window) that the terminal view and
//! the read-only HTTP API project.

pub mod aggregate;
pub mod api;
pub mod classify;
pub mod config;
pub mod dashboard;
pub mod detect;
pub mod engine;
pub mod link;
pub mod notice;
pub mod replay;
pub mod session;
pub mod view;

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::ConsoleConfig;
use crate::dashboard::Dashboard;
use crate::detect::AlertPipeline;
use crate::engine::{Engine, EngineSummary};
use crate::link::{ConnectionManager, WebSocketTransport};
use crate::session::Session;

/// Wire an engine to the configured WebSocket endpoint. Not started yet.
pub fn build_engine(config: &ConsoleConfig) -> Engine {
    let link = ConnectionManager::new(
        Arc::new(WebSocketTransport),
        config.link.endpoint.clone(),
        config.link.reconnect_delay(),
    );
    let dashboard = Dashboard::new(AlertPipeline::new(config.incidents.location.clone()));
    Engine::new(link, dashboard, config.link.rotation_interval())
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

/// Run the engine and print the dashboard on every change until Ctrl-C.
pub async fn watch(config: &ConsoleConfig, session: &Session, json: bool) -> Result<EngineSummary> {
    let engine = build_engine(config).start();
    let mut snapshots = engine.subscribe();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        let rendered = if json {
            serde_json::to_string(&snapshot)?
        } else {
            view::render_dashboard(&snapshot, session)
        };
        {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{rendered}")?;
            out.flush()?;
        }

        tokio::select! {
            _ = &mut shutdown => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    Ok(engine.stop().await)
}

/// Run the engine plus the read-only HTTP API until Ctrl-C.
pub async fn serve(config: &ConsoleConfig) -> Result<EngineSummary> {
    let addr: SocketAddr = config
        .api
        .listen_address
        .parse()
        .with_context(|| format!("invalid listen address: {}", config.api.listen_address))?;

    let engine = build_engine(config).start();
    let app = api::router(api::state::AppState::new(engine.subscribe()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, endpoint = %config.link.endpoint, "SecureVision console listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(engine.stop().await)
}
