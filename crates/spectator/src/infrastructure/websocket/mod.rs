//! Push channel client.
//!
//! - `backoff`: reconnection backoff math (no runtime dependencies)
//! - `connector`: handshake seam plus the tokio-tungstenite implementation
//! - `client`: the reconnecting [`PushClient`]

pub mod backoff;
pub mod client;
pub mod connector;

pub use backoff::{BackoffPolicy, BackoffState};
pub use client::{push_url, PushClient, MAX_ATTEMPTS_MESSAGE};
pub use connector::{ChannelFrame, Connector, PushChannel, TransportError, TungsteniteConnector};
