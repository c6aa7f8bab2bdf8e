//! Snapshot fetcher: one cycle pulls the round logs and the state snapshot.
//!
//! The complete snapshot is tried first; a not-found falls back to the
//! partial one. A cycle either yields both documents or an error, never half
//! of them.

use std::sync::Arc;

use arena_domain::{GameStateSnapshot, RoundLog, SessionId};
use arena_shared::SnapshotKind;
use thiserror::Error;

use crate::ports::outbound::{ApiError, GameApiPort};

/// Notice shown when a cycle fails.
pub const FETCH_FAILED_NOTICE: &str = "Unable to load game data";

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedCycle {
    pub logs: Vec<RoundLog>,
    pub state: GameStateSnapshot,
    /// Which snapshot document was served.
    pub kind: SnapshotKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("failed to fetch round logs: {0}")]
    Logs(ApiError),

    #[error("failed to fetch {kind} snapshot: {source}")]
    Snapshot {
        kind: SnapshotKind,
        #[source]
        source: ApiError,
    },
}

pub struct SnapshotFetcher {
    api: Arc<dyn GameApiPort>,
    session: SessionId,
}

impl SnapshotFetcher {
    pub fn new(api: Arc<dyn GameApiPort>, session: SessionId) -> Self {
        Self { api, session }
    }

    pub async fn fetch(&self) -> Result<FetchedCycle, FetchError> {
        let logs = self
            .api
            .round_logs(&self.session)
            .await
            .map_err(FetchError::Logs)?;

        let (state, kind) = match self
            .api
            .state_snapshot(&self.session, SnapshotKind::Complete)
            .await
        {
            Ok(state) => (state, SnapshotKind::Complete),
            Err(e) if e.is_not_found() => {
                tracing::debug!(session = %self.session, "Complete snapshot not found, using partial");
                let state = self
                    .api
                    .state_snapshot(&self.session, SnapshotKind::Partial)
                    .await
                    .map_err(|source| FetchError::Snapshot {
                        kind: SnapshotKind::Partial,
                        source,
                    })?;
                (state, SnapshotKind::Partial)
            }
            Err(source) => {
                return Err(FetchError::Snapshot {
                    kind: SnapshotKind::Complete,
                    source,
                })
            }
        };

        Ok(FetchedCycle { logs, state, kind })
    }
}
