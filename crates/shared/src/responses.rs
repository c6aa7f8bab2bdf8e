//! JSON bodies returned by the game server's control endpoints.

use arena_domain::LifecycleState;
use serde::{Deserialize, Serialize};

/// Body of `GET /game-status/{session}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleStatusResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LifecycleStatusResponse {
    /// `None` when the server reported failure.
    pub fn lifecycle_state(&self) -> Option<LifecycleState> {
        if !self.success {
            return None;
        }
        Some(
            self.status
                .as_deref()
                .map_or(LifecycleState::Unknown, LifecycleState::from_status),
        )
    }
}

/// Body of `POST /stop-game/{session}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopGameResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
