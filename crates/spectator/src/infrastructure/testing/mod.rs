//! Test doubles shared across unit tests.

mod fixtures;
mod scripted_connector;

pub use fixtures::{api_request_failed, bob_round_logs, bob_snapshot, RecordingDisplay};
pub use scripted_connector::{ChannelLink, ScriptedConnector, Step};
