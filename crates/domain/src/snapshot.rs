//! Game state snapshot and the player roster derived from it.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::serde_helpers::null_as_default;

/// Secret role of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[serde(alias = "werewolf")]
    Werewolf,
    #[serde(alias = "seer")]
    Seer,
    #[serde(alias = "doctor")]
    Doctor,
    #[serde(alias = "villager")]
    Villager,
    /// Unrecognized or missing role
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Werewolf => "Werewolf",
            Role::Seer => "Seer",
            Role::Doctor => "Doctor",
            Role::Villager => "Villager",
            Role::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub model: Option<String>,
    /// Present only when the server tracks liveness directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alive: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Who left the game in a round: `eliminated` at night, `exiled` by vote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    #[serde(default)]
    pub eliminated: Option<String>,
    #[serde(default)]
    pub exiled: Option<String>,
}

/// Player holding a special role, as listed in the snapshot's role blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleHolder {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoleHolder {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// Authoritative view of the game as of the latest fetch (complete or partial).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: BTreeMap<String, PlayerRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rounds: Vec<RoundOutcome>,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub seer: Option<RoleHolder>,
    #[serde(default)]
    pub doctor: Option<RoleHolder>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub werewolves: Vec<RoleHolder>,
}

impl GameStateSnapshot {
    pub fn outcome(&self, round: usize) -> Option<&RoundOutcome> {
        self.rounds.get(round)
    }

    /// Role of `player` according to the role assignment blocks.
    pub fn role_of(&self, player: &str) -> Option<Role> {
        if self.doctor.as_ref().is_some_and(|d| d.name == player) {
            return Some(Role::Doctor);
        }
        if self.seer.as_ref().is_some_and(|s| s.name == player) {
            return Some(Role::Seer);
        }
        if self.werewolves.iter().any(|w| w.name == player) {
            return Some(Role::Werewolf);
        }
        None
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }

    fn removed_players(&self) -> HashSet<&str> {
        self.rounds
            .iter()
            .flat_map(|r| [r.eliminated.as_deref(), r.exiled.as_deref()])
            .flatten()
            .collect()
    }
}

// =============================================================================
// Roster
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Alive,
    Eliminated,
}

/// Display projection of one player, rebuilt every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub role: Role,
    pub model: String,
    pub status: PlayerStatus,
    pub avatar: String,
}

impl PlayerView {
    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub players: Vec<PlayerView>,
    pub alive_count: usize,
    pub eliminated_count: usize,
}

impl Roster {
    pub fn from_snapshot(snapshot: &GameStateSnapshot) -> Self {
        let removed = snapshot.removed_players();
        let mut roster = Roster::default();

        for (key, record) in &snapshot.players {
            let eliminated = removed.contains(key.as_str()) || record.alive == Some(false);
            let status = if eliminated {
                roster.eliminated_count += 1;
                PlayerStatus::Eliminated
            } else {
                roster.alive_count += 1;
                PlayerStatus::Alive
            };

            roster.players.push(PlayerView {
                name: record.name.clone().unwrap_or_else(|| key.clone()),
                role: record.role,
                model: record
                    .model
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
                status,
                avatar: format!("static/{key}.png"),
            });
        }

        roster
    }
}
