//! Application services
//!
//! - `snapshot_fetcher`: round logs plus the complete/partial state snapshot
//! - `status_poller`: lifecycle polling and the operator stop action

pub mod snapshot_fetcher;
pub mod status_poller;

pub use snapshot_fetcher::{FetchError, FetchedCycle, SnapshotFetcher, FETCH_FAILED_NOTICE};
pub use status_poller::{StatusPoll, StatusPoller, StopOutcome};
