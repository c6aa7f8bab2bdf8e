//! Push channel message types
//!
//! Every text frame on the push channel is an envelope `{type, data}`. The
//! server sends `game_update`, `round_complete`, `game_complete` and `error`;
//! `connect` and `disconnect` are raised locally by the client.
//!
//! ## Versioning Policy
//!
//! - Unknown `type` values decode to [`InboundFrame::Unknown`] and are ignored
//! - A known `type` with a malformed `data` body is an [`EnvelopeError`]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// =============================================================================
// Envelope
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl PushEnvelope {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    pub fn to_text(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }
}

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushEventKind {
    GameUpdate,
    RoundComplete,
    GameComplete,
    Error,
    Connect,
    Disconnect,
}

impl PushEventKind {
    pub const ALL: [PushEventKind; 6] = [
        PushEventKind::GameUpdate,
        PushEventKind::RoundComplete,
        PushEventKind::GameComplete,
        PushEventKind::Error,
        PushEventKind::Connect,
        PushEventKind::Disconnect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PushEventKind::GameUpdate => "game_update",
            PushEventKind::RoundComplete => "round_complete",
            PushEventKind::GameComplete => "game_complete",
            PushEventKind::Error => "error",
            PushEventKind::Connect => "connect",
            PushEventKind::Disconnect => "disconnect",
        }
    }

    /// Events that mean the server has new log data.
    pub fn signals_new_data(&self) -> bool {
        matches!(
            self,
            PushEventKind::GameUpdate | PushEventKind::RoundComplete | PushEventKind::GameComplete
        )
    }
}

impl fmt::Display for PushEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PushEventKind {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PushEventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EnvelopeError::UnknownKind(s.to_string()))
    }
}

/// Event delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    GameUpdate(Value),
    RoundComplete(Value),
    GameComplete(Value),
    Error { message: String },
    Connect,
    Disconnect { reason: String },
}

impl PushEvent {
    pub fn kind(&self) -> PushEventKind {
        match self {
            PushEvent::GameUpdate(_) => PushEventKind::GameUpdate,
            PushEvent::RoundComplete(_) => PushEventKind::RoundComplete,
            PushEvent::GameComplete(_) => PushEventKind::GameComplete,
            PushEvent::Error { .. } => PushEventKind::Error,
            PushEvent::Connect => PushEventKind::Connect,
            PushEvent::Disconnect { .. } => PushEventKind::Disconnect,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        PushEvent::Error {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorData {
    message: String,
}

/// Decoded inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Event(PushEvent),
    /// Envelope with a `type` this client does not handle.
    Unknown(String),
}

pub fn decode_frame(text: &str) -> Result<InboundFrame, EnvelopeError> {
    let envelope: PushEnvelope = serde_json::from_str(text)?;
    let event = match envelope.kind.as_str() {
        "game_update" => PushEvent::GameUpdate(envelope.data),
        "round_complete" => PushEvent::RoundComplete(envelope.data),
        "game_complete" => PushEvent::GameComplete(envelope.data),
        "error" => {
            let data: ErrorData =
                serde_json::from_value(envelope.data).map_err(|e| EnvelopeError::InvalidData {
                    kind: PushEventKind::Error,
                    reason: e.to_string(),
                })?;
            PushEvent::Error {
                message: data.message,
            }
        }
        _ => return Ok(InboundFrame::Unknown(envelope.kind)),
    };
    Ok(InboundFrame::Event(event))
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {kind} payload: {reason}")]
    InvalidData { kind: PushEventKind, reason: String },

    #[error("unknown event kind '{0}'")]
    UnknownKind(String),
}
