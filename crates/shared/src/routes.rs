//! HTTP routes served by the game server, resolved against its base URL.

use std::fmt;

use arena_domain::SessionId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Which state snapshot file to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Written once the game has finished.
    Complete,
    /// Rewritten while the game is in progress.
    Partial,
}

impl SnapshotKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotKind::Complete => "game_complete.json",
            SnapshotKind::Partial => "game_partial.json",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKind::Complete => f.write_str("complete"),
            SnapshotKind::Partial => f.write_str("partial"),
        }
    }
}

/// The base URL has no hierarchical path to extend (e.g. `mailto:`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} cannot be used as a base URL")]
pub struct NotABaseUrl(pub String);

/// Extend `base`'s path with `segments`. Each segment is percent-encoded, so
/// a session id containing `/`, `?` or `#` stays one segment.
pub fn join(base: &Url, segments: &[&str]) -> Result<Url, NotABaseUrl> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| NotABaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub fn round_logs(base: &Url, session: &SessionId) -> Result<Url, NotABaseUrl> {
    join(base, &["logs", session.as_str(), "game_logs.json"])
}

pub fn state_snapshot(
    base: &Url,
    session: &SessionId,
    kind: SnapshotKind,
) -> Result<Url, NotABaseUrl> {
    join(base, &["logs", session.as_str(), kind.file_name()])
}

pub fn game_status(base: &Url, session: &SessionId) -> Result<Url, NotABaseUrl> {
    join(base, &["game-status", session.as_str()])
}

pub fn stop_game(base: &Url, session: &SessionId) -> Result<Url, NotABaseUrl> {
    join(base, &["stop-game", session.as_str()])
}
