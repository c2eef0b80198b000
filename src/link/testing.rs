//! Scripted in-memory transport for link and engine tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedSender};

use super::{FrameStream, LinkError, Transport};

pub(crate) type SessionSender = UnboundedSender<Result<String, LinkError>>;

/// Hands out pre-scripted connections in order. Once the script runs out,
/// every further `open` is refused.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    opens: AtomicUsize,
    script: Mutex<VecDeque<Option<FrameStream>>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful connection. Frames sent on the returned sender are
    /// delivered in order; dropping it closes the connection.
    pub(crate) fn push_session(&self) -> SessionSender {
        let (tx, rx) = mpsc::unbounded();
        self.script.lock().unwrap().push_back(Some(Box::pin(rx)));
        tx
    }

    /// Queue a refused connection attempt.
    pub(crate) fn push_refusal(&self) {
        self.script.lock().unwrap().push_back(None);
    }

    /// Number of `open` calls so far.
    pub(crate) fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self, endpoint: &str) -> Result<FrameStream, LinkError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front().flatten();
        next.ok_or_else(|| LinkError::Connect {
            endpoint: endpoint.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}
