//! Infrastructure adapters: HTTP, push channel, terminal display.

pub mod http_client;
pub mod messaging;
pub mod terminal;
pub mod websocket;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
