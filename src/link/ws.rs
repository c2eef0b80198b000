//! WebSocket transport over `tokio-tungstenite`.

use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use super::{FrameStream, LinkError, Transport};

/// Connects to `ws://` / `wss://` endpoints and yields text frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketTransport;

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, endpoint: &str) -> Result<FrameStream, LinkError> {
        let (socket, response) = connect_async(endpoint)
            .await
            .map_err(|e| LinkError::Connect {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        debug!(%endpoint, status = %response.status(), "websocket handshake complete");

        // Control frames are answered by tungstenite itself; only text
        // frames carry telemetry.
        let frames = socket.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "close frame received");
                    None
                }
                Ok(Message::Binary(bytes)) => {
                    debug!(len = bytes.len(), "ignoring binary frame");
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(LinkError::Transport(e.to_string()))),
            }
        });

        Ok(Box::pin(frames))
    }
}
