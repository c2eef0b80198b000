//! Offline replay of recorded telemetry.
//!
//! A recording is newline-delimited JSON, one frame per line, exactly as the
//! pipeline sends them over the link. Frames go through the same classifier
//! and dashboard as live traffic and follow the same drop policy. A line
//! longer than 1 MiB ends the replay; everything before it is kept.

use std::path::Path;

use anyhow::{Context, Result};
use futures::StreamExt;
use serde::Serialize;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::dashboard::Dashboard;

/// Longest accepted line (1 MiB).
const MAX_FRAME_SIZE: usize = 1_048_576;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Non-blank lines read.
    pub frames: u64,
    pub accepted: u64,
    pub dropped: u64,
}

/// Feed every line of `reader` into `dashboard`.
pub async fn replay_reader<R>(reader: R, dashboard: &mut Dashboard) -> Result<ReplaySummary>
where
    R: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_FRAME_SIZE));
    let mut summary = ReplaySummary::default();

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                summary.frames += 1;
                summary.dropped += 1;
                // The codec stream ends after a decode error.
                warn!(limit = MAX_FRAME_SIZE, "oversized frame, recording truncated");
                break;
            }
            Err(LinesCodecError::Io(e)) => return Err(e).context("failed to read recording"),
        };
        if line.trim().is_empty() {
            continue;
        }

        summary.frames += 1;
        match classify(&line) {
            Ok(event) => {
                summary.accepted += 1;
                dashboard.apply(event);
            }
            Err(e) => {
                summary.dropped += 1;
                debug!(line = summary.frames, error = %e, "frame dropped");
            }
        }
    }

    Ok(summary)
}

/// Replay the recording at `path`.
pub async fn replay_file(path: &Path, dashboard: &mut Dashboard) -> Result<ReplaySummary> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open recording: {}", path.display()))?;
    let summary = replay_reader(file, dashboard).await?;
    info!(
        path = %path.display(),
        frames = summary.frames,
        accepted = summary.accepted,
        dropped = summary.dropped,
        "recording replayed"
    );
    Ok(summary)
}
