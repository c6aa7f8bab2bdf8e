//! Aggregation of a voting round into per-target counts.

use serde::{Deserialize, Serialize};

use crate::round_log::Ballot;

/// Bucket for ballots that name no target.
pub const UNKNOWN_TARGET: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub target: String,
    pub count: usize,
    /// Share of all ballots, 0-100.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteTally {
    pub total: usize,
    /// Ordered by first appearance of each target.
    pub entries: Vec<TallyEntry>,
}

impl VoteTally {
    /// Returns `None` for an empty ballot list, there is nothing to chart.
    pub fn from_ballots(ballots: &[Ballot]) -> Option<Self> {
        Self::from_targets(ballots.iter().map(Ballot::target))
    }

    pub fn from_targets<'a, I>(targets: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut total = 0;

        for target in targets {
            let target = target.unwrap_or(UNKNOWN_TARGET);
            total += 1;
            match counts.iter_mut().find(|(t, _)| t == target) {
                Some((_, n)) => *n += 1,
                None => counts.push((target.to_string(), 1)),
            }
        }

        if total == 0 {
            return None;
        }

        let entries = counts
            .into_iter()
            .map(|(target, count)| TallyEntry {
                target,
                count,
                percentage: count as f64 * 100.0 / total as f64,
            })
            .collect();

        Some(Self { total, entries })
    }

    pub fn count_for(&self, target: &str) -> usize {
        self.entries
            .iter()
            .find(|e| e.target == target)
            .map_or(0, |e| e.count)
    }

    /// e.g. `Vote results: Alice (3), Bob (1)`
    pub fn summary_line(&self) -> String {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{} ({})", e.target, e.count))
            .collect();
        format!("Vote results: {}", parts.join(", "))
    }
}
