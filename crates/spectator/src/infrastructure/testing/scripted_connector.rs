//! In-memory [`Connector`] driven by a script of handshake outcomes.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use crate::infrastructure::websocket::{ChannelFrame, Connector, PushChannel, TransportError};

/// Outcome of one handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Fail,
    Accept,
}

/// Test side of an accepted channel.
pub struct ChannelLink {
    /// Frames the client will receive.
    pub frames: mpsc::Sender<ChannelFrame>,
    /// Text the client sent.
    pub sent: mpsc::Receiver<String>,
}

/// Once the script runs out every handshake fails.
#[derive(Default)]
pub struct ScriptedConnector {
    script: Mutex<VecDeque<Step>>,
    open_times: Mutex<Vec<Instant>>,
    links: Mutex<Vec<Option<ChannelLink>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedConnector {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn open_count(&self) -> usize {
        lock(&self.open_times).len()
    }

    pub fn open_times(&self) -> Vec<Instant> {
        lock(&self.open_times).clone()
    }

    /// Take the `index`-th accepted channel.
    pub fn take_link(&self, index: usize) -> Option<ChannelLink> {
        lock(&self.links).get_mut(index).and_then(Option::take)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(&self, url: &Url) -> Result<PushChannel, TransportError> {
        lock(&self.open_times).push(Instant::now());
        let step = lock(&self.script).pop_front().unwrap_or(Step::Fail);

        match step {
            Step::Fail => Err(TransportError::Handshake {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
            Step::Accept => {
                let (frames, inbound) = mpsc::channel(16);
                let (outbound, sent) = mpsc::channel(16);
                lock(&self.links).push(Some(ChannelLink { frames, sent }));
                Ok(PushChannel { inbound, outbound })
            }
        }
    }
}
