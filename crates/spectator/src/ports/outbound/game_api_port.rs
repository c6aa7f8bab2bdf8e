//! Game API Port - request/response calls against the game server

use arena_domain::{GameStateSnapshot, RoundLog, SessionId};
use arena_shared::{LifecycleStatusResponse, SnapshotKind, StopGameResponse};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from the game server's HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The resource does not exist (yet)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("HTTP {status} from {path}")]
    Status { status: u16, path: String },

    /// Network failure or timeout
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

/// Port for the game server's JSON endpoints.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait GameApiPort: Send + Sync {
    /// All round logs recorded so far, oldest first.
    async fn round_logs(&self, session: &SessionId) -> Result<Vec<RoundLog>, ApiError>;

    /// The complete or partial state snapshot.
    async fn state_snapshot(
        &self,
        session: &SessionId,
        kind: SnapshotKind,
    ) -> Result<GameStateSnapshot, ApiError>;

    async fn lifecycle_status(
        &self,
        session: &SessionId,
    ) -> Result<LifecycleStatusResponse, ApiError>;

    async fn stop_game(&self, session: &SessionId) -> Result<StopGameResponse, ApiError>;
}
