//! Werewolf Arena Protocol - wire contract between the game server and the
//! spectator
//!
//! - Push channel envelopes and event kinds
//! - JSON bodies of the lifecycle status and stop endpoints
//! - HTTP route builders
//!
//! Pure data types and serialization, no I/O.

pub mod messages;
pub mod responses;
pub mod routes;

pub use messages::{decode_frame, EnvelopeError, InboundFrame, PushEnvelope, PushEvent, PushEventKind};
pub use responses::{LifecycleStatusResponse, StopGameResponse};
pub use routes::{NotABaseUrl, SnapshotKind};
