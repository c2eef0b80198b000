//! Live link to the pipeline's telemetry endpoint.
//!
//! The [`ConnectionManager`] owns the socket and its retry policy: every
//! close or error, whatever the cause, schedules exactly one reconnect after
//! a fixed delay, forever. The socket itself sits behind the [`Transport`]
//! trait so tests can script connections.

pub mod manager;
pub mod ws;

#[cfg(test)]
pub(crate) mod testing;

pub use self::manager::{ConnectionManager, LinkEvent, DEFAULT_RECONNECT_DELAY};
pub use self::ws::WebSocketTransport;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of the live connection as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to open {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Inbound text frames of one open connection. Ends when the peer closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, LinkError>> + Send>>;

/// Opens connections to a telemetry endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, endpoint: &str) -> Result<FrameStream, LinkError>;
}
