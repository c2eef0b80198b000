//! Short-lived operator notices (toasts).
//!
//! Each notice lives for exactly [`NOTICE_TTL`] from the moment it is raised
//! unless dismissed earlier. Raising a notice only records its deadline, so
//! the board can be fed from synchronous code. Timers are armed in a
//! [`DelayQueue`] keyed by notice id the next time the board is polled; the
//! timer holds only the id, and removal is resolved against the board when
//! it fires, so re-rendering never restarts a timer.
//!
//! While a notice is live, raising another with the same title and message
//! is a no-op.

use std::time::Duration;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::time::delay_queue::{self, DelayQueue};
use tracing::debug;

/// Lifetime of every notice.
pub const NOTICE_TTL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
    Info,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
            NoticeKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

#[derive(Debug)]
struct LiveNotice {
    notice: Notice,
    deadline: Instant,
    /// `None` until the board is first polled after the notice was raised.
    timer: Option<delay_queue::Key>,
}

/// The set of currently visible notices, oldest first.
#[derive(Debug)]
pub struct NoticeBoard {
    live: Vec<LiveNotice>,
    timers: DelayQueue<u64>,
    next_id: u64,
    ttl: Duration,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::with_ttl(NOTICE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            live: Vec::new(),
            timers: DelayQueue::new(),
            next_id: 1,
            ttl,
        }
    }

    /// Raise a notice unless an identical (title, message) one is live.
    ///
    /// Returns the id of the new notice, or `None` if it was deduplicated.
    /// The lifetime starts now, even though the timer is armed later.
    pub fn raise(
        &mut self,
        kind: NoticeKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Option<u64> {
        let title = title.into();
        let message = message.into();

        if self
            .live
            .iter()
            .any(|n| n.notice.title == title && n.notice.message == message)
        {
            debug!(%title, "duplicate notice suppressed");
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.live.push(LiveNotice {
            notice: Notice {
                id,
                kind,
                title,
                message,
            },
            deadline: Instant::now() + self.ttl,
            timer: None,
        });
        Some(id)
    }

    /// Remove a notice before its lifetime ends. Returns false if it is gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        match self.live.iter().position(|n| n.notice.id == id) {
            Some(index) => {
                let entry = self.live.remove(index);
                if let Some(timer) = entry.timer {
                    self.timers.try_remove(&timer);
                }
                true
            }
            None => false,
        }
    }

    /// Wait for the next notice lifetime to end and remove it.
    ///
    /// Resolves to `None` immediately when no notice is live. Cancel-safe.
    pub async fn next_expired(&mut self) -> Option<u64> {
        self.arm_timers();
        let expired = self.timers.next().await?;
        let id = expired.into_inner();
        self.live.retain(|n| n.notice.id != id);
        debug!(notice_id = id, "notice expired");
        Some(id)
    }

    fn arm_timers(&mut self) {
        for entry in self.live.iter_mut().filter(|n| n.timer.is_none()) {
            entry.timer = Some(self.timers.insert_at(entry.notice.id, entry.deadline));
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.live.iter().map(|n| &n.notice)
    }

    pub fn to_vec(&self) -> Vec<Notice> {
        self.iter().cloned().collect()
    }
}
