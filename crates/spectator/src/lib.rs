//! Werewolf Arena Spectator
//!
//! Live view of one AI werewolf game. The game server is read through two
//! channels: a push channel that announces new data, and HTTP endpoints that
//! serve the round logs, the state snapshot and the lifecycle status.
//!
//! ## Layers
//!
//! - `ports`: traits for the game API and the display surfaces
//! - `infrastructure`: reqwest, tokio-tungstenite and terminal adapters
//! - `application`: the snapshot fetcher and the status poller
//! - `presentation`: render reconciliation and the [`SpectatorView`] loops

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod ports;
pub mod presentation;

pub use config::{ConfigError, SpectatorConfig};
pub use presentation::{SpectatorView, ViewSettings};
