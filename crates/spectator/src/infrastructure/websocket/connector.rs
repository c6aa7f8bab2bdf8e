//! Handshake seam for the push channel.
//!
//! A [`Connector`] turns an address into a [`PushChannel`]: a queue of inbound
//! frames and a queue of outbound text. The reconnect logic in the client only
//! ever sees these queues.

use std::time::Duration;

use arena_shared::EnvelopeError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use super::backoff::{DEFAULT_HANDSHAKE_TIMEOUT_MS, OUTBOUND_BUFFER};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid push address: {0}")]
    InvalidUrl(String),

    #[error("handshake with {url} failed: {reason}")]
    Handshake { url: String, reason: String },

    #[error("handshake with {0} timed out")]
    Timeout(String),

    #[error("push channel closed")]
    Closed,

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Frame delivered by an open channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelFrame {
    Text(String),
    /// The server sent a close frame.
    ServerClosed { reason: String },
    /// Transport error or the stream ended without a close frame.
    Failed(String),
}

/// Both directions of an open channel.
///
/// Dropping `outbound` closes the connection.
pub struct PushChannel {
    pub inbound: mpsc::Receiver<ChannelFrame>,
    pub outbound: mpsc::Sender<String>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, url: &Url) -> Result<PushChannel, TransportError>;
}

/// Production connector over tokio-tungstenite.
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    handshake_timeout: Duration,
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_HANDSHAKE_TIMEOUT_MS))
    }
}

impl TungsteniteConnector {
    pub fn new(handshake_timeout: Duration) -> Self {
        Self { handshake_timeout }
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn open(&self, url: &Url) -> Result<PushChannel, TransportError> {
        let (ws_stream, _) = tokio::time::timeout(self.handshake_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| TransportError::Timeout(url.to_string()))?
            .map_err(|e| TransportError::Handshake {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let (mut write, mut read) = ws_stream.split();
        let (inbound_tx, inbound_rx) = mpsc::channel::<ChannelFrame>(OUTBOUND_BUFFER);
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

        tokio::spawn(async move {
            let end = loop {
                let frame = match read.next().await {
                    Some(Ok(Message::Text(text))) => ChannelFrame::Text(text.to_string()),
                    Some(Ok(Message::Close(frame))) => {
                        break ChannelFrame::ServerClosed {
                            reason: frame
                                .map(|f| f.reason.to_string())
                                .filter(|r| !r.is_empty())
                                .unwrap_or_else(|| "server closed the connection".to_string()),
                        };
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break ChannelFrame::Failed(e.to_string()),
                    None => break ChannelFrame::Failed("stream ended".to_string()),
                };
                if inbound_tx.send(frame).await.is_err() {
                    // Receiver dropped: the client released the channel.
                    return;
                }
            };
            let _ = inbound_tx.send(end).await;
        });

        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = write.send(Message::text(text)).await {
                    tracing::warn!(error = %e, "Failed to send push message");
                    break;
                }
            }
            let _ = write.close().await;
        });

        Ok(PushChannel {
            inbound: inbound_rx,
            outbound: outbound_tx,
        })
    }
}
