//! Line-oriented terminal rendering of the display surfaces.
//!
//! Everything goes to one writer (stdout in the binary). Logs go to stderr so
//! the two never interleave.
//!
//! The output is append-only, so panels the view refreshes every cycle (roster,
//! vote tally, lifecycle, connection) are printed only when their text differs
//! from what was printed last.

use std::io::{self, Stdout, Write};
use std::sync::{Mutex, PoisonError};

use arena_domain::{ControlsView, GameStats, Message, Roster, VoteTally};
use chrono::NaiveTime;

use crate::infrastructure::messaging::ConnectionState;
use crate::ports::outbound::{
    IndicatorSurface, InspectorSurface, MessageListSurface, PlayersSurface, VoteTallySurface,
};

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy)]
enum Panel {
    Roster,
    Tally,
    Lifecycle,
    Connection,
}

/// Last text printed for each refreshed panel.
#[derive(Default)]
struct Printed {
    roster: Option<String>,
    tally: Option<String>,
    lifecycle: Option<String>,
    connection: Option<String>,
}

impl Printed {
    fn slot(&mut self, panel: Panel) -> &mut Option<String> {
        match panel {
            Panel::Roster => &mut self.roster,
            Panel::Tally => &mut self.tally,
            Panel::Lifecycle => &mut self.lifecycle,
            Panel::Connection => &mut self.connection,
        }
    }
}

pub struct TerminalDisplay<W: Write + Send = Stdout> {
    out: Mutex<W>,
    printed: Mutex<Printed>,
}

impl TerminalDisplay<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            printed: Mutex::new(Printed::default()),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{text}").and_then(|_| out.flush()) {
            tracing::debug!(error = %e, "Terminal write failed");
        }
    }

    /// Print `text` unless `panel` already shows it.
    fn emit_changed(&self, panel: Panel, text: String) {
        {
            let mut printed = self.printed.lock().unwrap_or_else(PoisonError::into_inner);
            let last = printed.slot(panel);
            if last.as_deref() == Some(text.as_str()) {
                return;
            }
            *last = Some(text.clone());
        }
        self.emit(&text);
    }
}

pub fn format_message(message: &Message) -> String {
    let mut line = format!(
        "[{}] {} <{}> {}",
        message.display_time(),
        message.speaker,
        message.category,
        message.text
    );
    if let Some(reasoning) = message.reasoning.as_deref().filter(|r| !r.trim().is_empty()) {
        line.push_str("\n  thinking: ");
        line.push_str(reasoning.trim());
    }
    line
}

pub fn format_roster(roster: &Roster, stats: &GameStats) -> String {
    let mut out = format!(
        "== Round {} ({}) | alive {} | eliminated {} ==",
        stats.current_round + 1,
        stats.phase.label(),
        stats.alive_count,
        stats.eliminated_count
    );
    for player in &roster.players {
        let marker = if player.is_alive() { "alive" } else { "out" };
        out.push_str(&format!(
            "\n  {:<12} {:<9} {:<6} {}",
            player.name,
            player.role.label(),
            marker,
            player.model
        ));
    }
    out
}

/// Bar length proportional to the entry's share of the ballots.
pub fn tally_bar(percentage: f64) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

pub fn format_tally(tally: &VoteTally) -> String {
    let mut out = format!("-- Votes ({} cast) --", tally.total);
    for entry in &tally.entries {
        out.push_str(&format!(
            "\n  {:<12} {} {} ({:.0}%)",
            entry.target,
            tally_bar(entry.percentage),
            entry.count,
            entry.percentage
        ));
    }
    out
}

impl<W: Write + Send> MessageListSurface for TerminalDisplay<W> {
    fn clear(&self) {
        self.emit("---- timeline reset ----");
    }

    fn append(&self, message: &Message) {
        self.emit(&format_message(message));
    }
}

impl<W: Write + Send> PlayersSurface for TerminalDisplay<W> {
    fn render(&self, roster: &Roster, stats: &GameStats) {
        self.emit_changed(Panel::Roster, format_roster(roster, stats));
    }
}

impl<W: Write + Send> IndicatorSurface for TerminalDisplay<W> {
    fn connection(&self, state: ConnectionState) {
        self.emit_changed(Panel::Connection, format!("~~ push channel: {state}"));
    }

    fn lifecycle(&self, controls: &ControlsView) {
        let stop = if controls.stop_enabled {
            "enabled"
        } else {
            "disabled"
        };
        self.emit_changed(
            Panel::Lifecycle,
            format!(
                "** status: {} | stop: {} ({stop})",
                controls.status_label, controls.stop_label
            ),
        );
    }

    fn notice(&self, text: &str) {
        self.emit(&format!("!! {text}"));
    }

    // The terminal has no persistent header to refresh.
    fn clock(&self, _now: NaiveTime) {}
}

impl<W: Write + Send> VoteTallySurface for TerminalDisplay<W> {
    fn render(&self, tally: &VoteTally) {
        self.emit_changed(Panel::Tally, format_tally(tally));
    }

    // Nothing to erase; the next tally prints in full.
    fn clear(&self) {
        *self
            .printed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slot(Panel::Tally) = None;
    }
}

impl<W: Write + Send> InspectorSurface for TerminalDisplay<W> {
    fn show(&self, message: &Message, raw: &str) {
        self.emit(&format!(
            ">> {} | {} | {} | {}\n{raw}",
            message.id,
            message.display_time(),
            message.speaker,
            message.category
        ));
    }
}
