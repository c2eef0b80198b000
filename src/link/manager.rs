use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::StreamExt;
use tokio::time::Sleep;
use tracing::{debug, info, warn};

use super::{ConnectionState, FrameStream, LinkError, Transport};

/// Fixed delay between a close and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// What happened on the link since the last call to
/// [`ConnectionManager::next_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The connection is open.
    Opened,
    /// A raw text frame arrived.
    Frame(String),
    /// The connection closed or failed to open; a reconnect is scheduled.
    Closed,
    /// The reconnect delay elapsed and a new attempt has started.
    Reconnecting,
}

enum Phase {
    /// Not started, or stopped.
    Idle,
    Connecting(BoxFuture<'static, Result<FrameStream, LinkError>>),
    Open(FrameStream),
    /// Waiting out the reconnect delay.
    Backoff(std::pin::Pin<Box<Sleep>>),
}

/// Owns the live connection and its reconnect loop.
///
/// All progress happens inside [`next_event`](Self::next_event), which the
/// engine polls from its single event loop; the manager never spawns tasks
/// of its own, so [`stop`](Self::stop) leaves nothing running behind it.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    endpoint: String,
    retry_delay: Duration,
    phase: Phase,
    attempts: u64,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: impl Into<String>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            retry_delay,
            phase: Phase::Idle,
            attempts: 0,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Number of connection attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn state(&self) -> ConnectionState {
        match self.phase {
            Phase::Idle | Phase::Backoff(_) => ConnectionState::Disconnected,
            Phase::Connecting(_) => ConnectionState::Connecting,
            Phase::Open(_) => ConnectionState::Connected,
        }
    }

    pub fn is_reconnect_pending(&self) -> bool {
        matches!(self.phase, Phase::Backoff(_))
    }

    /// Start a connection attempt.
    ///
    /// No-op while a connection is open or an attempt is in flight. Called
    /// during the reconnect delay, it cancels the timer and connects now.
    /// Returns whether a new attempt was started.
    pub fn connect(&mut self) -> bool {
        match self.phase {
            Phase::Open(_) | Phase::Connecting(_) => {
                debug!(endpoint = %self.endpoint, state = ?self.state(), "connect ignored");
                false
            }
            Phase::Idle | Phase::Backoff(_) => {
                self.attempts += 1;
                info!(
                    endpoint = %self.endpoint,
                    attempt = self.attempts,
                    "connecting to telemetry endpoint"
                );
                let transport = Arc::clone(&self.transport);
                let endpoint = self.endpoint.clone();
                self.phase =
                    Phase::Connecting(Box::pin(async move { transport.open(&endpoint).await }));
                true
            }
        }
    }

    /// Close the connection and cancel any pending reconnect.
    pub fn stop(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            info!(endpoint = %self.endpoint, "telemetry link stopped");
        }
        self.phase = Phase::Idle;
    }

    /// Drive the link until something observable happens.
    ///
    /// Pending forever while idle. Cancel-safe: all in-flight state lives in
    /// `self`, so dropping the returned future loses nothing.
    pub async fn next_event(&mut self) -> LinkEvent {
        match &mut self.phase {
            Phase::Idle => std::future::pending().await,
            Phase::Connecting(handshake) => match handshake.await {
                Ok(stream) => {
                    info!(endpoint = %self.endpoint, "telemetry link open");
                    self.phase = Phase::Open(stream);
                    LinkEvent::Opened
                }
                Err(e) => {
                    warn!(error = %e, "telemetry link failed to open");
                    self.schedule_reconnect();
                    LinkEvent::Closed
                }
            },
            Phase::Open(frames) => match frames.next().await {
                Some(Ok(frame)) => LinkEvent::Frame(frame),
                Some(Err(e)) => {
                    warn!(error = %e, "telemetry link error");
                    self.schedule_reconnect();
                    LinkEvent::Closed
                }
                None => {
                    info!(endpoint = %self.endpoint, "telemetry link closed by peer");
                    self.schedule_reconnect();
                    LinkEvent::Closed
                }
            },
            Phase::Backoff(timer) => {
                timer.as_mut().await;
                self.connect();
                LinkEvent::Reconnecting
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        debug!(delay_ms = self.retry_delay.as_millis() as u64, "reconnect scheduled");
        self.phase = Phase::Backoff(Box::pin(tokio::time::sleep(self.retry_delay)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::testing::ScriptedTransport;
    use tokio::time::Instant;

    fn assert_delay(elapsed: Duration) {
        assert!(elapsed >= DEFAULT_RECONNECT_DELAY, "reconnected early: {elapsed:?}");
        assert!(
            elapsed < DEFAULT_RECONNECT_DELAY + Duration::from_millis(5),
            "reconnected late: {elapsed:?}"
        );
    }

    fn manager(transport: &Arc<ScriptedTransport>) -> ConnectionManager {
        ConnectionManager::new(transport.clone(), "ws://test/ws/stats", DEFAULT_RECONNECT_DELAY)
    }

    #[tokio::test(start_paused = true)]
    async fn opens_and_yields_frames() {
        let transport = ScriptedTransport::new();
        let session = transport.push_session();
        let mut link = manager(&transport);

        assert_eq!(link.state(), ConnectionState::Disconnected);
        assert!(link.connect());
        assert_eq!(link.state(), ConnectionState::Connecting);
        assert_eq!(link.next_event().await, LinkEvent::Opened);
        assert_eq!(link.state(), ConnectionState::Connected);

        session.unbounded_send(Ok("{\"fps\": 1}".to_string())).unwrap();
        assert_eq!(link.next_event().await, LinkEvent::Frame("{\"fps\": 1}".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn connect_is_idempotent_while_open_or_connecting() {
        let transport = ScriptedTransport::new();
        let _session = transport.push_session();
        let mut link = manager(&transport);

        assert!(link.connect());
        assert!(!link.connect());
        assert_eq!(link.next_event().await, LinkEvent::Opened);
        assert!(!link.connect());

        assert_eq!(link.attempts(), 1);
        assert_eq!(transport.opens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_schedules_one_reconnect_after_fixed_delay() {
        let transport = ScriptedTransport::new();
        let session = transport.push_session();
        let _second = transport.push_session();
        let mut link = manager(&transport);

        link.connect();
        assert_eq!(link.next_event().await, LinkEvent::Opened);

        drop(session);
        assert_eq!(link.next_event().await, LinkEvent::Closed);
        assert_eq!(link.state(), ConnectionState::Disconnected);
        assert!(link.is_reconnect_pending());

        let closed_at = Instant::now();
        assert_eq!(link.next_event().await, LinkEvent::Reconnecting);
        assert_delay(closed_at.elapsed());
        assert_eq!(link.next_event().await, LinkEvent::Opened);
        assert_eq!(transport.opens(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_and_refusals_take_the_same_retry_path() {
        let transport = ScriptedTransport::new();
        transport.push_refusal();
        let failing = transport.push_session();
        let _healthy = transport.push_session();
        let mut link = manager(&transport);

        link.connect();
        assert_eq!(link.next_event().await, LinkEvent::Closed);
        assert_eq!(link.next_event().await, LinkEvent::Reconnecting);
        assert_eq!(link.next_event().await, LinkEvent::Opened);

        failing
            .unbounded_send(Err(LinkError::Transport("reset by peer".into())))
            .unwrap();
        assert_eq!(link.next_event().await, LinkEvent::Closed);
        assert_eq!(link.next_event().await, LinkEvent::Reconnecting);
        assert_eq!(link.next_event().await, LinkEvent::Opened);
        assert_eq!(transport.opens(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_forever_without_backoff_growth() {
        let transport = ScriptedTransport::new();
        let mut link = manager(&transport);

        link.connect();
        for _ in 0..25 {
            assert_eq!(link.next_event().await, LinkEvent::Closed);
            let started = Instant::now();
            assert_eq!(link.next_event().await, LinkEvent::Reconnecting);
            assert_delay(started.elapsed());
        }
        // The 26th handshake only runs once the link is polled again.
        assert_eq!(transport.opens(), 25);
        assert_eq!(link.next_event().await, LinkEvent::Closed);
        assert_eq!(transport.opens(), 26);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_reconnect() {
        let transport = ScriptedTransport::new();
        let mut link = manager(&transport);

        link.connect();
        assert_eq!(link.next_event().await, LinkEvent::Closed);
        assert!(link.is_reconnect_pending());

        link.stop();
        assert!(!link.is_reconnect_pending());

        let idle = tokio::time::timeout(Duration::from_secs(30), link.next_event()).await;
        assert!(idle.is_err(), "stopped link must stay silent");
        assert_eq!(transport.opens(), 1);
    }
}
