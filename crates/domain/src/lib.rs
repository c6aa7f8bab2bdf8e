//! Werewolf Arena domain: the server's round logs and state snapshots, and
//! the pure algorithms that turn them into what a spectator sees.
//!
//! Nothing in this crate performs I/O.

pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod message;
pub mod round_log;
mod serde_helpers;
pub mod snapshot;
pub mod timeline;
pub mod vote_tally;

pub use error::DomainError;
pub use ids::SessionId;
pub use lifecycle::{
    ControlsView, IndicatorTone, LifecycleMachine, LifecycleState, STOPPED_BY_OPERATOR,
    STOP_FAILED_LABEL,
};
pub use message::{Message, MessageCategory, MessageId, Speaker};
pub use round_log::{
    Ballot, BidAmount, BidResult, DebateResult, EliminateResult, InvestigateResult, LogEntry,
    ProtectResult, RoundLog, SummaryResult, VoteResult,
};
pub use snapshot::{
    GameStateSnapshot, PlayerRecord, PlayerStatus, PlayerView, Role, RoleHolder, Roster,
    RoundOutcome,
};
pub use timeline::{reconstruct, GameStats, Phase, Timeline};
pub use vote_tally::{TallyEntry, VoteTally, UNKNOWN_TARGET};
