//! Reconnecting push channel client.
//!
//! `connect` spawns a driver task that owns the channel. The driver performs
//! the handshake, pumps inbound frames into the [`EventBus`], and on an
//! unexpected loss retries with exponential backoff. A close frame from the
//! server ends the driver without a retry; so does an explicit `disconnect`.

use std::sync::{Arc, Mutex, PoisonError};

use arena_domain::SessionId;
use arena_shared::{
    decode_frame, routes, InboundFrame, PushEnvelope, PushEvent, PushEventKind,
};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::backoff::{saturating_millis, BackoffPolicy, BackoffState};
use super::connector::{ChannelFrame, Connector, PushChannel, TransportError};
use crate::infrastructure::messaging::{
    ChannelPhase, ConnectionState, ConnectionTracker, EventBus, SubscriptionId,
};

/// Message carried by the terminal `error` event.
pub const MAX_ATTEMPTS_MESSAGE: &str = "Max reconnection attempts reached";

const CLIENT_DISCONNECT_REASON: &str = "client disconnect";

/// Push address for a session: the id becomes the last path segment.
pub fn push_url(base: &Url, session: &SessionId) -> Result<Url, TransportError> {
    routes::join(base, &[session.as_str()])
        .map_err(|e| TransportError::InvalidUrl(e.to_string()))
}

// =============================================================================
// Shared driver state
// =============================================================================

#[derive(Clone)]
struct Shared {
    connector: Arc<dyn Connector>,
    policy: BackoffPolicy,
    bus: EventBus,
    tracker: Arc<ConnectionTracker>,
    outbound: Arc<Mutex<Option<mpsc::Sender<String>>>>,
}

enum ChannelEnd {
    Cancelled,
    ServerClosed(String),
    Lost(String),
}

impl Shared {
    fn set_outbound(&self, sender: Option<mpsc::Sender<String>>) {
        *self.outbound.lock().unwrap_or_else(PoisonError::into_inner) = sender;
    }

    fn outbound(&self) -> Option<mpsc::Sender<String>> {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn handle_text(&self, text: &str) {
        match decode_frame(text) {
            Ok(InboundFrame::Event(event)) => {
                tracing::debug!(kind = %event.kind(), "Push event received");
                self.bus.dispatch(&event);
            }
            Ok(InboundFrame::Unknown(kind)) => {
                tracing::debug!(kind = %kind, "Ignoring push message of unknown type");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed push message");
                self.bus
                    .dispatch(&PushEvent::error(format!("Malformed push message: {e}")));
            }
        }
    }

    async fn pump(
        &self,
        inbound: &mut mpsc::Receiver<ChannelFrame>,
        cancel: &CancellationToken,
    ) -> ChannelEnd {
        loop {
            let frame = tokio::select! {
                biased;
                _ = cancel.cancelled() => return ChannelEnd::Cancelled,
                frame = inbound.recv() => frame,
            };
            match frame {
                Some(ChannelFrame::Text(text)) => self.handle_text(&text),
                Some(ChannelFrame::ServerClosed { reason }) => return ChannelEnd::ServerClosed(reason),
                Some(ChannelFrame::Failed(reason)) => return ChannelEnd::Lost(reason),
                None => return ChannelEnd::Lost("channel closed".to_string()),
            }
        }
    }
}

async fn drive(
    shared: Shared,
    url: Url,
    cancel: CancellationToken,
    ready: oneshot::Sender<Result<(), TransportError>>,
) {
    let mut ready = Some(ready);
    let mut backoff = BackoffState::default();

    loop {
        shared.tracker.set_phase(ChannelPhase::Handshaking);
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                shared.tracker.set_phase(ChannelPhase::Idle);
                return;
            }
            opened = shared.connector.open(&url) => opened,
        };

        match opened {
            Ok(PushChannel {
                mut inbound,
                outbound,
            }) => {
                backoff.reset();
                shared.tracker.set_attempts(0);
                shared.set_outbound(Some(outbound));
                shared.tracker.set_phase(ChannelPhase::Open);
                tracing::info!(url = %url, "Push channel connected");
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Ok(()));
                }
                shared.bus.dispatch(&PushEvent::Connect);

                let end = shared.pump(&mut inbound, &cancel).await;
                shared.set_outbound(None);
                shared.tracker.set_phase(ChannelPhase::Idle);

                match end {
                    ChannelEnd::Cancelled => {
                        shared.bus.dispatch(&PushEvent::Disconnect {
                            reason: CLIENT_DISCONNECT_REASON.to_string(),
                        });
                        return;
                    }
                    ChannelEnd::ServerClosed(reason) => {
                        tracing::info!(reason = %reason, "Server closed push channel, not reconnecting");
                        shared.bus.dispatch(&PushEvent::Disconnect { reason });
                        return;
                    }
                    ChannelEnd::Lost(reason) => {
                        tracing::warn!(reason = %reason, "Push channel lost");
                        shared.bus.dispatch(&PushEvent::Disconnect { reason });
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    url = %url,
                    attempt = backoff.attempts(),
                    error = %e,
                    "Push channel handshake failed"
                );
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Err(e));
                }
            }
        }

        let Some((attempt, delay)) = backoff.next_attempt(&shared.policy) else {
            shared.tracker.set_phase(ChannelPhase::Idle);
            tracing::error!(
                attempts = backoff.attempts(),
                "Max reconnection attempts reached, giving up"
            );
            shared.bus.dispatch(&PushEvent::error(MAX_ATTEMPTS_MESSAGE));
            return;
        };

        shared.tracker.set_attempts(attempt);
        shared.tracker.set_phase(ChannelPhase::Waiting);
        tracing::info!(
            attempt,
            max_attempts = shared.policy.max_attempts(),
            delay_ms = saturating_millis(delay),
            "Scheduling push channel reconnect"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Reconnection cancelled - intentional disconnect");
                shared.tracker.set_phase(ChannelPhase::Idle);
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

struct Driver {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Driver {
    async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Push channel driver ended abnormally");
        }
    }
}

// =============================================================================
// Push Client
// =============================================================================

/// Push channel client with typed multi-subscriber events.
pub struct PushClient {
    base: Url,
    shared: Shared,
    driver: tokio::sync::Mutex<Option<Driver>>,
}

impl PushClient {
    pub fn new(base: Url, connector: Arc<dyn Connector>, policy: BackoffPolicy) -> Self {
        Self {
            base,
            shared: Shared {
                connector,
                policy,
                bus: EventBus::new(),
                tracker: Arc::new(ConnectionTracker::new()),
                outbound: Arc::new(Mutex::new(None)),
            },
            driver: tokio::sync::Mutex::new(None),
        }
    }

    /// Connect to the session's push channel.
    ///
    /// Resolves once the first handshake succeeds. A failed first handshake
    /// is returned as an error while the retries continue in the background.
    pub async fn connect(&self, session: &SessionId) -> Result<(), TransportError> {
        let url = push_url(&self.base, session)?;

        let mut driver = self.driver.lock().await;
        if let Some(previous) = driver.take() {
            previous.stop().await;
        }

        tracing::info!(url = %url, session = %session, "Connecting push channel");
        let cancel = CancellationToken::new();
        let (ready_tx, ready_rx) = oneshot::channel();
        let task = tokio::spawn(drive(self.shared.clone(), url, cancel.clone(), ready_tx));
        *driver = Some(Driver { cancel, task });
        drop(driver);

        ready_rx.await.unwrap_or(Err(TransportError::Closed))
    }

    /// Close the channel and cancel any pending reconnect. Safe to call at
    /// any time, any number of times.
    pub async fn disconnect(&self) {
        let driver = self.driver.lock().await.take();
        if let Some(driver) = driver {
            tracing::info!("Disconnecting push channel");
            driver.stop().await;
        }
        self.shared.set_outbound(None);
        self.shared.tracker.set_attempts(0);
        self.shared.tracker.set_phase(ChannelPhase::Idle);
    }

    /// Send `{type, data}` to the server. Without an open channel this only
    /// logs a warning.
    pub async fn send(&self, event: &str, payload: Value) -> Result<(), TransportError> {
        let Some(sender) = self.shared.outbound() else {
            tracing::warn!(event, "Cannot send message, push channel not connected");
            return Ok(());
        };
        let text = PushEnvelope::new(event, payload).to_text()?;
        sender.send(text).await.map_err(|_| TransportError::Closed)
    }

    pub fn on(
        &self,
        kind: PushEventKind,
        handler: impl Fn(&PushEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.shared.bus.on(kind, handler)
    }

    pub fn off(&self, kind: PushEventKind) -> usize {
        self.shared.bus.off(kind)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.bus.unsubscribe(id)
    }

    pub fn status(&self) -> ConnectionState {
        self.shared.tracker.state()
    }

    /// Reconnect attempts since the last successful handshake.
    pub fn attempts(&self) -> u32 {
        self.shared.tracker.attempts()
    }
}
