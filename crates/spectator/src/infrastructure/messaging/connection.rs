//! Connection lifecycle tracking.
//!
//! The push client records only what its driver is doing (the channel phase)
//! and how many reconnect attempts have been made. The user-facing
//! [`ConnectionState`] is projected from those two values on every read, so
//! it can never drift from the channel itself.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Connection state shown to the spectator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to the server
    Disconnected,
    /// Attempting to establish the first connection
    Connecting,
    /// Successfully connected
    Connected,
    /// Connection lost, attempting to reconnect
    Reconnecting,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the driver task is doing with the channel right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    /// No driver, or the driver has stopped
    Idle,
    /// Handshake in progress
    Handshaking,
    /// Channel open
    Open,
    /// Sleeping before the next reconnect attempt
    Waiting,
}

impl ChannelPhase {
    /// Convert to u8 for atomic storage.
    pub fn to_u8(self) -> u8 {
        match self {
            ChannelPhase::Idle => 0,
            ChannelPhase::Handshaking => 1,
            ChannelPhase::Open => 2,
            ChannelPhase::Waiting => 3,
        }
    }

    /// Convert from u8 (atomic storage).
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => ChannelPhase::Handshaking,
            2 => ChannelPhase::Open,
            3 => ChannelPhase::Waiting,
            _ => ChannelPhase::Idle,
        }
    }
}

/// Shared phase + attempt counter written by the push client's driver.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    phase: AtomicU8,
    attempts: AtomicU32,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ChannelPhase {
        ChannelPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn set_phase(&self, phase: ChannelPhase) {
        self.phase.store(phase.to_u8(), Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn set_attempts(&self, attempts: u32) {
        self.attempts.store(attempts, Ordering::SeqCst);
    }

    pub fn state(&self) -> ConnectionState {
        project(self.phase(), self.attempts())
    }
}

fn project(phase: ChannelPhase, attempts: u32) -> ConnectionState {
    match phase {
        ChannelPhase::Idle => ConnectionState::Disconnected,
        ChannelPhase::Open => ConnectionState::Connected,
        ChannelPhase::Handshaking | ChannelPhase::Waiting if attempts > 0 => {
            ConnectionState::Reconnecting
        }
        ChannelPhase::Handshaking | ChannelPhase::Waiting => ConnectionState::Connecting,
    }
}
