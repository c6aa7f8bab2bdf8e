//! Event dispatch and connection state for the push channel.

pub mod connection;
pub mod event_bus;

pub use connection::{ChannelPhase, ConnectionState, ConnectionTracker};
pub use event_bus::{EventBus, EventHandler, SubscriptionId};
