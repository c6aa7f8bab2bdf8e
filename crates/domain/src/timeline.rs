//! Timeline reconstruction.
//!
//! The whole message list is rebuilt from `(logs, state)` on every fetch
//! cycle. Output depends only on the inputs: a synthetic clock replaces wall
//! time and ids are positional, so an unchanged log prefix always yields the
//! same leading messages.

use chrono::{Duration, NaiveTime};
use serde::Serialize;
use serde_json::Value;

use crate::message::{Message, MessageCategory, MessageId, Speaker};
use crate::round_log::{Ballot, BidAmount, LogEntry, RoundLog};
use crate::snapshot::{GameStateSnapshot, Role, Roster};
use crate::vote_tally::VoteTally;

// =============================================================================
// Synthetic clock
// =============================================================================

const START_HOUR: u32 = 14;
const START_MINUTE: u32 = 30;

const NIGHT_ACTION_MINUTES: i64 = 1;
const DAWN_MINUTES: i64 = 2;
const BID_MINUTES: i64 = 2;
const BID_TURN_MINUTES: i64 = 1;
const DEBATE_MINUTES: i64 = 3;
const VOTING_BEGINS_MINUTES: i64 = 2;
const BALLOT_MINUTES: i64 = 1;
const TALLY_MINUTES: i64 = 2;
const SUMMARY_MINUTES: i64 = 3;
const FINAL_MINUTES: i64 = 1;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Night,
    Day,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Night => "night",
            Phase::Day => "day",
        }
    }
}

/// Result of one reconstruction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub messages: Vec<Message>,
    /// Tally of the most recent voting block, if any round voted.
    pub latest_tally: Option<VoteTally>,
    pub current_round: usize,
    pub phase: Phase,
}

impl Timeline {
    pub fn find(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.id).collect()
    }
}

/// Header statistics shown next to the message list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameStats {
    pub alive_count: usize,
    pub eliminated_count: usize,
    pub current_round: usize,
    pub phase: Phase,
}

impl GameStats {
    pub fn new(roster: &Roster, timeline: &Timeline) -> Self {
        Self {
            alive_count: roster.alive_count,
            eliminated_count: roster.eliminated_count,
            current_round: timeline.current_round,
            phase: timeline.phase,
        }
    }
}

/// Rebuilds the full message list from the round logs and the latest snapshot.
pub fn reconstruct(logs: &[RoundLog], state: &GameStateSnapshot) -> Timeline {
    let mut builder = TimelineBuilder::new(state);

    for (round, log) in logs.iter().enumerate() {
        builder.start_round(round);
        builder.night(log);
        builder.dawn();
        builder.bidding(log);
        builder.debate(log);
        builder.voting(log);
        builder.summaries(log);
    }

    if let Some(winner) = state.winner() {
        builder.game_over(winner);
    }

    builder.finish()
}

struct TimelineBuilder<'a> {
    state: &'a GameStateSnapshot,
    clock: NaiveTime,
    round: usize,
    seq: usize,
    phase: Phase,
    messages: Vec<Message>,
    latest_tally: Option<VoteTally>,
}

impl<'a> TimelineBuilder<'a> {
    fn new(state: &'a GameStateSnapshot) -> Self {
        Self {
            state,
            clock: NaiveTime::from_hms_opt(START_HOUR, START_MINUTE, 0).unwrap_or_default(),
            round: 0,
            seq: 0,
            phase: Phase::Night,
            messages: Vec::new(),
            latest_tally: None,
        }
    }

    fn start_round(&mut self, round: usize) {
        self.round = round;
        self.seq = 0;
        self.phase = Phase::Night;
    }

    fn advance(&mut self, minutes: i64) {
        self.clock += Duration::minutes(minutes);
    }

    fn push(
        &mut self,
        category: MessageCategory,
        speaker: Speaker,
        text: String,
        reasoning: Option<String>,
        source: Option<Value>,
    ) {
        let id = MessageId::round(category, self.round, self.seq);
        self.seq += 1;
        self.messages.push(Message {
            id,
            timestamp: self.clock,
            speaker,
            category,
            text,
            reasoning: reasoning.filter(|r| !r.trim().is_empty()),
            source,
        });
    }

    fn system(&mut self, text: String, source: Option<Value>) {
        self.push(MessageCategory::System, Speaker::System, text, None, source);
    }

    // -------------------------------------------------------------------------
    // Phases
    // -------------------------------------------------------------------------

    fn night(&mut self, log: &RoundLog) {
        if let Some(entry) = &log.eliminate {
            let target = entry.result.as_ref().and_then(|r| r.remove.as_deref());
            let reasoning = entry.result.as_ref().and_then(|r| r.reasoning.clone());
            self.night_action(entry, Role::Werewolf, "eliminate", target, reasoning);
        }
        if let Some(entry) = &log.protect {
            let target = entry.result.as_ref().and_then(|r| r.protect.as_deref());
            let reasoning = entry.result.as_ref().and_then(|r| r.reasoning.clone());
            self.night_action(entry, Role::Doctor, "protect", target, reasoning);
        }
        if let Some(entry) = &log.investigate {
            let target = entry.result.as_ref().and_then(|r| r.investigate.as_deref());
            let reasoning = entry.result.as_ref().and_then(|r| r.reasoning.clone());
            self.night_action(entry, Role::Seer, "investigate", target, reasoning);
        }
    }

    fn night_action<T: Serialize>(
        &mut self,
        entry: &LogEntry<T>,
        implied: Role,
        verb: &str,
        target: Option<&str>,
        reasoning: Option<String>,
    ) {
        self.advance(NIGHT_ACTION_MINUTES);
        let speaker = match entry.player.as_deref() {
            Some(actor) => match self.state.role_of(actor) {
                Some(role) => Speaker::Role(role),
                None => Speaker::Player(actor.to_string()),
            },
            None => Speaker::Role(implied),
        };
        let target = non_blank(target).unwrap_or(UNKNOWN);
        self.push(
            MessageCategory::Night,
            speaker,
            format!("Night action: {verb} {target}"),
            reasoning,
            raw(entry),
        );
    }

    fn dawn(&mut self) {
        self.advance(DAWN_MINUTES);
        self.phase = Phase::Day;
        let outcome = self.state.outcome(self.round);
        let text = match outcome.and_then(|o| non_blank(o.eliminated.as_deref())) {
            Some(name) => format!("Dawn breaks. {name} was eliminated during the night."),
            None => "Dawn breaks. It was a peaceful night.".to_string(),
        };
        let source = outcome.and_then(|o| serde_json::to_value(o).ok());
        self.system(text, source);
    }

    fn bidding(&mut self, log: &RoundLog) {
        for turn in &log.bid {
            for (player, entry) in turn {
                self.advance(BID_MINUTES);
                let result = entry.result.as_ref();
                let amount = result.and_then(|r| r.bid.clone()).unwrap_or_default();
                self.push(
                    MessageCategory::Bid,
                    Speaker::Player(player.clone()),
                    bid_text(&amount),
                    result.and_then(|r| r.reasoning.clone()),
                    raw(entry),
                );
            }
            self.advance(BID_TURN_MINUTES);
        }
    }

    fn debate(&mut self, log: &RoundLog) {
        for (player, entry) in &log.debate {
            self.advance(DEBATE_MINUTES);
            let result = entry.result.as_ref();
            self.push(
                MessageCategory::Debate,
                Speaker::Player(player.clone()),
                result.and_then(|r| r.say.clone()).unwrap_or_default(),
                result.and_then(|r| r.reasoning.clone()),
                raw(entry),
            );
        }
    }

    fn voting(&mut self, log: &RoundLog) {
        let Some(ballots) = log.final_ballots().filter(|b| !b.is_empty()) else {
            return;
        };

        self.advance(VOTING_BEGINS_MINUTES);
        self.system("Voting begins".to_string(), None);

        for ballot in ballots {
            self.advance(BALLOT_MINUTES);
            self.ballot(ballot);
        }

        self.advance(TALLY_MINUTES);
        if let Some(tally) = VoteTally::from_ballots(ballots) {
            self.system(tally.summary_line(), serde_json::to_value(ballots).ok());
            self.latest_tally = Some(tally);
        }

        let exiled = self
            .state
            .outcome(self.round)
            .and_then(|o| non_blank(o.exiled.as_deref()));
        if let Some(name) = exiled {
            self.system(format!("{name} was exiled by vote"), None);
        }
    }

    fn ballot(&mut self, ballot: &Ballot) {
        let target = ballot.target().unwrap_or(UNKNOWN);
        self.push(
            MessageCategory::Vote,
            Speaker::Player(ballot.player.clone()),
            format!("Votes for {target}"),
            ballot.reasoning().map(str::to_string),
            serde_json::to_value(ballot).ok(),
        );
    }

    fn summaries(&mut self, log: &RoundLog) {
        for (player, entry) in &log.summaries {
            self.advance(SUMMARY_MINUTES);
            let result = entry.result.as_ref();
            self.push(
                MessageCategory::Summary,
                Speaker::Player(player.clone()),
                result.and_then(|r| r.summary.clone()).unwrap_or_default(),
                result.and_then(|r| r.reasoning.clone()),
                raw(entry),
            );
        }
    }

    fn game_over(&mut self, winner: &str) {
        if self.messages.iter().any(|m| m.id == MessageId::Final) {
            return;
        }
        self.advance(FINAL_MINUTES);
        self.messages.push(Message {
            id: MessageId::Final,
            timestamp: self.clock,
            speaker: Speaker::System,
            category: MessageCategory::System,
            text: format!("Game over! Winner: {winner}"),
            reasoning: None,
            source: None,
        });
    }

    fn finish(self) -> Timeline {
        Timeline {
            messages: self.messages,
            latest_tally: self.latest_tally,
            current_round: self.round,
            phase: self.phase,
        }
    }
}

fn bid_text(amount: &BidAmount) -> String {
    format!("Bids {amount} for the floor")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn raw<T: Serialize>(entry: &LogEntry<T>) -> Option<Value> {
    serde_json::to_value(entry).ok()
}
