//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing application services to talk to the game server and the display
//! without depending on concrete implementations.

pub mod display_port;
pub mod game_api_port;

pub use display_port::{
    DisplaySurfaces, IndicatorSurface, InspectorSurface, MessageListSurface, PlayersSurface,
    VoteTallySurface,
};
pub use game_api_port::{ApiError, GameApiPort};

#[cfg(any(test, feature = "testing"))]
pub use display_port::{
    MockIndicatorSurface, MockInspectorSurface, MockMessageListSurface, MockPlayersSurface,
    MockVoteTallySurface,
};
#[cfg(any(test, feature = "testing"))]
pub use game_api_port::MockGameApiPort;
