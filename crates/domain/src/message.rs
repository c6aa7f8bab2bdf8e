//! Timeline messages and their structured identifiers.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;
use crate::snapshot::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Night,
    Bid,
    Debate,
    Vote,
    Summary,
    System,
}

impl MessageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageCategory::Night => "night",
            MessageCategory::Bid => "bid",
            MessageCategory::Debate => "debate",
            MessageCategory::Vote => "vote",
            MessageCategory::Summary => "summary",
            MessageCategory::System => "system",
        }
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "night" => Ok(MessageCategory::Night),
            "bid" => Ok(MessageCategory::Bid),
            "debate" => Ok(MessageCategory::Debate),
            "vote" => Ok(MessageCategory::Vote),
            "summary" => Ok(MessageCategory::Summary),
            "system" => Ok(MessageCategory::System),
            other => Err(DomainError::parse(format!(
                "unknown message category '{other}'"
            ))),
        }
    }
}

// =============================================================================
// Message Id
// =============================================================================

const FINAL_ID: &str = "system-final";

/// Identity of a message, derived only from its position in the rebuild.
///
/// Rendered as `{category}-r{round}-{seq}`; `seq` restarts at zero every
/// round, so ids of earlier rounds never move when later rounds grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MessageId {
    Round {
        category: MessageCategory,
        round: usize,
        seq: usize,
    },
    /// The game-over announcement.
    Final,
}

impl MessageId {
    pub fn round(category: MessageCategory, round: usize, seq: usize) -> Self {
        MessageId::Round {
            category,
            round,
            seq,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Round {
                category,
                round,
                seq,
            } => write!(f, "{category}-r{round}-{seq}"),
            MessageId::Final => f.write_str(FINAL_ID),
        }
    }
}

impl FromStr for MessageId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == FINAL_ID {
            return Ok(MessageId::Final);
        }

        let invalid = || DomainError::parse(format!("invalid message id '{s}'"));
        let mut parts = s.splitn(3, '-');
        let category = parts.next().ok_or_else(invalid)?.parse()?;
        let round = parts
            .next()
            .and_then(|r| r.strip_prefix('r'))
            .and_then(|r| r.parse().ok())
            .ok_or_else(invalid)?;
        let seq = parts
            .next()
            .and_then(|n| n.parse().ok())
            .ok_or_else(invalid)?;

        Ok(MessageId::Round {
            category,
            round,
            seq,
        })
    }
}

impl TryFrom<String> for MessageId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MessageId> for String {
    fn from(value: MessageId) -> Self {
        value.to_string()
    }
}

// =============================================================================
// Message
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Speaker {
    Player(String),
    Role(Role),
    System,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Player(name) => f.write_str(name),
            Speaker::Role(role) => write!(f, "{role}"),
            Speaker::System => f.write_str("System"),
        }
    }
}

/// One rendered timeline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Synthetic display time, never wall-clock.
    pub timestamp: NaiveTime,
    pub speaker: Speaker,
    pub category: MessageCategory,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Originating raw record, for the inspector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

impl Message {
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}
