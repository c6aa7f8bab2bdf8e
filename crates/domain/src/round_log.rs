//! Append-only per-round records written by the game server.
//!
//! Every agent decision is logged as a [`LogEntry`]: the parsed decision sits
//! under `result`, and whatever else the server recorded (prompts, raw model
//! output, timings) is kept verbatim so the inspector can show the full
//! originating record.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::serde_helpers::null_as_default;

/// One logged agent decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry<T> {
    #[serde(default)]
    pub result: Option<T>,
    /// Acting player, when the server records it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T> LogEntry<T> {
    pub fn new(result: T) -> Self {
        Self {
            result: Some(result),
            player: None,
            extra: Map::new(),
        }
    }

    pub fn by(mut self, player: impl Into<String>) -> Self {
        self.player = Some(player.into());
        self
    }
}

// =============================================================================
// Decision payloads
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EliminateResult {
    #[serde(default)]
    pub remove: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtectResult {
    #[serde(default)]
    pub protect: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestigateResult {
    #[serde(default)]
    pub investigate: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Bid amount as logged; models sometimes answer with a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BidAmount {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl Default for BidAmount {
    fn default() -> Self {
        BidAmount::Integer(0)
    }
}

impl fmt::Display for BidAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidAmount::Integer(n) => write!(f, "{n}"),
            BidAmount::Decimal(n) => write!(f, "{n}"),
            BidAmount::Text(s) => f.write_str(s.trim()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidResult {
    #[serde(default)]
    pub bid: Option<BidAmount>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebateResult {
    #[serde(default)]
    pub say: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteResult {
    #[serde(default)]
    pub vote: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// `[player, entry]` pair as it appears in bid turns, debate and summaries.
pub type Spoken<T> = (String, LogEntry<T>);

/// A single player's vote within a voting round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ballot {
    pub player: String,
    #[serde(default)]
    pub log: Option<LogEntry<VoteResult>>,
}

impl Ballot {
    pub fn new(player: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            log: Some(LogEntry::new(VoteResult {
                vote: Some(target.into()),
                reasoning: None,
            })),
        }
    }

    /// Voted-for player, if the ballot resolves to one.
    pub fn target(&self) -> Option<&str> {
        self.log
            .as_ref()
            .and_then(|log| log.result.as_ref())
            .and_then(|result| result.vote.as_deref())
            .map(str::trim)
            .filter(|target| !target.is_empty())
    }

    pub fn reasoning(&self) -> Option<&str> {
        self.log
            .as_ref()
            .and_then(|log| log.result.as_ref())
            .and_then(|result| result.reasoning.as_deref())
    }
}

// =============================================================================
// Round Log
// =============================================================================

/// Raw record of one night/day cycle. Every field is optional; rounds still in
/// progress simply lack the later phases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eliminate: Option<LogEntry<EliminateResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protect: Option<LogEntry<ProtectResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigate: Option<LogEntry<InvestigateResult>>,
    /// Bidding turns, each an ordered list of bids.
    #[serde(default, deserialize_with = "null_as_default")]
    pub bid: Vec<Vec<Spoken<BidResult>>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub debate: Vec<Spoken<DebateResult>>,
    /// Voting rounds; only the last one is authoritative.
    #[serde(default, deserialize_with = "null_as_default")]
    pub votes: Vec<Vec<Ballot>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summaries: Vec<Spoken<SummaryResult>>,
}

impl RoundLog {
    /// The authoritative (last) voting round, if any was logged.
    pub fn final_ballots(&self) -> Option<&[Ballot]> {
        self.votes.last().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_server_round() {
        let raw = serde_json::json!({
            "eliminate": {
                "player": "Derek",
                "prompt": "You are a werewolf...",
                "result": {"remove": "Bob", "reasoning": "Bob is the seer"}
            },
            "protect": {"result": {"protect": "Alice", "reasoning": "hunch"}},
            "investigate": null,
            "bid": [[
                ["Alice", {"result": {"bid": 3, "reasoning": "I must speak"}}],
                ["Carol", {"result": {"bid": "1", "reasoning": "meh"}}]
            ]],
            "debate": [["Alice", {"result": {"say": "Derek is lying", "reasoning": "tells"}}]],
            "votes": [
                [{"player": "Alice", "log": {"result": {"vote": "Carol"}}}],
                [{"player": "Alice", "log": {"result": {"vote": "Derek"}}}]
            ],
            "summaries": null
        });

        let log: RoundLog = serde_json::from_value(raw).expect("round log parses");

        let eliminate = log.eliminate.as_ref().expect("eliminate present");
        assert_eq!(eliminate.player.as_deref(), Some("Derek"));
        assert_eq!(
            eliminate.result.as_ref().and_then(|r| r.remove.as_deref()),
            Some("Bob")
        );
        assert_eq!(
            eliminate.extra.get("prompt"),
            Some(&Value::String("You are a werewolf...".into()))
        );
        assert!(log.investigate.is_none());
        assert_eq!(log.bid[0].len(), 2);
        assert_eq!(
            log.bid[0][1].1.result.as_ref().and_then(|r| r.bid.clone()),
            Some(BidAmount::Text("1".into()))
        );
        assert!(log.summaries.is_empty());

        let finals = log.final_ballots().expect("votes present");
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].target(), Some("Derek"));
    }

    #[test]
    fn empty_object_is_an_empty_round() {
        let log: RoundLog = serde_json::from_str("{}").expect("parses");
        assert_eq!(log, RoundLog::default());
        assert!(log.final_ballots().is_none());
    }

    #[test]
    fn ballot_without_vote_has_no_target() {
        let ballot: Ballot =
            serde_json::from_str(r#"{"player": "Eve", "log": {"result": {"vote": "  "}}}"#)
                .expect("parses");
        assert_eq!(ballot.target(), None);

        let missing: Ballot = serde_json::from_str(r#"{"player": "Eve"}"#).expect("parses");
        assert_eq!(missing.target(), None);
    }

    #[test]
    fn bid_amount_display() {
        assert_eq!(BidAmount::Integer(4).to_string(), "4");
        assert_eq!(BidAmount::Decimal(2.5).to_string(), "2.5");
        assert_eq!(BidAmount::Text(" 3 ".into()).to_string(), "3");
    }
}
