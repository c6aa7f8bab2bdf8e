//! Game lifecycle as reported by the status endpoint, and the operator
//! controls it gates.
//!
//! The server is authoritative: every poll result replaces the current state
//! and no transition is inferred locally.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Initializing,
    Running,
    Stopping,
    Stopped,
    Completed,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl LifecycleState {
    /// Lenient parse; anything unrecognized is `Unknown`.
    pub fn from_status(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "initializing" => LifecycleState::Initializing,
            "running" => LifecycleState::Running,
            "stopping" => LifecycleState::Stopping,
            "stopped" => LifecycleState::Stopped,
            "completed" => LifecycleState::Completed,
            "error" => LifecycleState::Error,
            _ => LifecycleState::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LifecycleState::Unknown => "Unknown",
            LifecycleState::Initializing => "Initializing",
            LifecycleState::Running => "Running",
            LifecycleState::Stopping => "Stopping",
            LifecycleState::Stopped => "Stopped",
            LifecycleState::Completed => "Completed",
            LifecycleState::Error => "Error",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Colour class of the status indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndicatorTone {
    #[default]
    Idle,
    Stopping,
    Stopped,
}

/// What the operator controls currently show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlsView {
    pub status_label: String,
    pub indicator: IndicatorTone,
    pub stop_enabled: bool,
    pub stop_label: String,
    /// Whether the periodic snapshot fetch should run.
    pub live: bool,
}

impl Default for ControlsView {
    fn default() -> Self {
        Self {
            status_label: LifecycleState::Unknown.label().to_string(),
            indicator: IndicatorTone::Idle,
            stop_enabled: true,
            stop_label: "Stop".to_string(),
            live: true,
        }
    }
}

pub const STOP_FAILED_LABEL: &str = "Stop failed";
pub const STOPPED_BY_OPERATOR: &str = "Game stopped by operator";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleMachine {
    state: LifecycleState,
    controls: ControlsView,
}

impl LifecycleMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn controls(&self) -> &ControlsView {
        &self.controls
    }

    pub fn is_live(&self) -> bool {
        self.controls.live
    }

    /// Applies a polled status. Returns `true` if the state changed.
    pub fn apply(&mut self, next: LifecycleState) -> bool {
        let changed = self.state != next;
        self.state = next;

        let c = &mut self.controls;
        c.status_label = next.label().to_string();
        match next {
            LifecycleState::Unknown => {
                c.indicator = IndicatorTone::Idle;
            }
            LifecycleState::Initializing => {
                c.indicator = IndicatorTone::Idle;
                c.stop_enabled = true;
                c.stop_label = "Stop".to_string();
            }
            LifecycleState::Running => {
                c.indicator = IndicatorTone::Idle;
                c.stop_enabled = true;
                c.stop_label = "Stop".to_string();
                c.live = true;
            }
            LifecycleState::Stopping => {
                c.indicator = IndicatorTone::Stopping;
                c.stop_enabled = false;
                c.stop_label = "Stopping...".to_string();
            }
            LifecycleState::Stopped => {
                c.indicator = IndicatorTone::Stopped;
                c.stop_enabled = false;
                c.stop_label = "Stopped".to_string();
                c.live = false;
            }
            LifecycleState::Completed => {
                c.indicator = IndicatorTone::Idle;
                c.stop_enabled = false;
                c.stop_label = "Completed".to_string();
                c.live = false;
            }
            LifecycleState::Error => {
                c.indicator = IndicatorTone::Stopped;
                c.stop_enabled = false;
                c.stop_label = "Error".to_string();
                c.live = false;
            }
        }
        changed
    }

    /// Operator pressed stop; the request is about to be sent.
    pub fn begin_stop(&mut self) {
        let c = &mut self.controls;
        c.stop_enabled = false;
        c.stop_label = "Stopping...".to_string();
        c.indicator = IndicatorTone::Stopping;
    }

    pub fn stop_succeeded(&mut self) {
        self.apply(LifecycleState::Stopped);
    }

    pub fn stop_failed(&mut self) {
        let c = &mut self.controls;
        c.stop_enabled = true;
        c.stop_label = "Stop".to_string();
        c.status_label = STOP_FAILED_LABEL.to_string();
        c.indicator = IndicatorTone::Idle;
    }
}
