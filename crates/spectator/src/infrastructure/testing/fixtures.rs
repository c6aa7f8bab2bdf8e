//! Simple test fixtures used across unit tests.

use std::sync::{Mutex, PoisonError};

use arena_domain::{
    ControlsView, GameStateSnapshot, GameStats, Message, RoundLog, Roster, VoteTally,
};
use chrono::NaiveTime;

use crate::infrastructure::messaging::ConnectionState;
use crate::ports::outbound::{
    ApiError, IndicatorSurface, InspectorSurface, MessageListSurface, PlayersSurface,
    VoteTallySurface,
};

pub fn api_request_failed(msg: &str) -> ApiError {
    ApiError::RequestFailed(msg.to_string())
}

/// One night in which the werewolves eliminate Bob.
pub fn bob_round_logs() -> Vec<RoundLog> {
    serde_json::from_value(serde_json::json!([
        {"eliminate": {"result": {"remove": "Bob", "reasoning": "Bob asks too much"}}}
    ]))
    .unwrap_or_default()
}

pub fn bob_snapshot() -> GameStateSnapshot {
    serde_json::from_value(serde_json::json!({
        "players": {
            "Alice": {"name": "Alice", "role": "Seer", "model": "gpt-4o"},
            "Bob": {"name": "Bob", "role": "Villager", "model": "glm-4"},
            "Derek": {"name": "Derek", "role": "Werewolf", "model": "qwen"}
        },
        "rounds": [{"eliminated": "Bob"}],
        "seer": {"name": "Alice"},
        "werewolves": [{"name": "Derek"}]
    }))
    .unwrap_or_default()
}

/// Display that records every call as a short line.
#[derive(Default)]
pub struct RecordingDisplay {
    calls: Mutex<Vec<String>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded calls starting with `prefix`.
    pub fn calls_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
}

impl MessageListSurface for RecordingDisplay {
    fn clear(&self) {
        self.record("clear".to_string());
    }

    fn append(&self, message: &Message) {
        self.record(format!("append {}", message.id));
    }
}

impl PlayersSurface for RecordingDisplay {
    fn render(&self, roster: &Roster, stats: &GameStats) {
        self.record(format!(
            "players {} alive={}",
            roster.players.len(),
            stats.alive_count
        ));
    }
}

impl IndicatorSurface for RecordingDisplay {
    fn connection(&self, state: ConnectionState) {
        self.record(format!("connection {state}"));
    }

    fn lifecycle(&self, controls: &ControlsView) {
        self.record(format!(
            "lifecycle {} stop={} [{}]",
            controls.status_label, controls.stop_enabled, controls.stop_label
        ));
    }

    fn notice(&self, text: &str) {
        self.record(format!("notice {text}"));
    }

    fn clock(&self, _now: NaiveTime) {
        self.record("clock".to_string());
    }
}

impl VoteTallySurface for RecordingDisplay {
    fn render(&self, tally: &VoteTally) {
        self.record(format!("tally {}", tally.total));
    }

    fn clear(&self) {
        self.record("tally cleared".to_string());
    }
}

impl InspectorSurface for RecordingDisplay {
    fn show(&self, message: &Message, raw: &str) {
        self.record(format!("inspect {} {}", message.id, raw.lines().count()));
    }
}
