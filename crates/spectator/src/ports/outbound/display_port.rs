//! Display surfaces the spectator writes to.
//!
//! Every surface is optional. [`DisplaySurfaces`] turns operations against a
//! missing surface into no-ops, so a partial display (or none at all) never
//! breaks the pipelines feeding it.

use std::sync::Arc;

use arena_domain::{ControlsView, GameStats, Message, Roster, VoteTally};
use chrono::NaiveTime;

use crate::infrastructure::messaging::ConnectionState;

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait MessageListSurface: Send + Sync {
    fn clear(&self);
    fn append(&self, message: &Message);
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PlayersSurface: Send + Sync {
    fn render(&self, roster: &Roster, stats: &GameStats);
}

/// Connectivity and lifecycle indicator, plus transient notices and the clock.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait IndicatorSurface: Send + Sync {
    fn connection(&self, state: ConnectionState);
    fn lifecycle(&self, controls: &ControlsView);
    fn notice(&self, text: &str);
    fn clock(&self, now: NaiveTime);
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait VoteTallySurface: Send + Sync {
    fn render(&self, tally: &VoteTally);
    fn clear(&self);
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait InspectorSurface: Send + Sync {
    /// `raw` is the originating record as pretty-printed JSON.
    fn show(&self, message: &Message, raw: &str);
}

/// Named mount points; `None` means the surface is not present.
#[derive(Clone, Default)]
pub struct DisplaySurfaces {
    pub messages: Option<Arc<dyn MessageListSurface>>,
    pub players: Option<Arc<dyn PlayersSurface>>,
    pub indicator: Option<Arc<dyn IndicatorSurface>>,
    pub tally: Option<Arc<dyn VoteTallySurface>>,
    pub inspector: Option<Arc<dyn InspectorSurface>>,
}

impl DisplaySurfaces {
    /// Mounts one display on every surface.
    pub fn all<T>(display: Arc<T>) -> Self
    where
        T: MessageListSurface
            + PlayersSurface
            + IndicatorSurface
            + VoteTallySurface
            + InspectorSurface
            + 'static,
    {
        Self {
            messages: Some(display.clone()),
            players: Some(display.clone()),
            indicator: Some(display.clone()),
            tally: Some(display.clone()),
            inspector: Some(display),
        }
    }

    pub fn clear_messages(&self) {
        if let Some(surface) = &self.messages {
            surface.clear();
        }
    }

    pub fn append_message(&self, message: &Message) {
        if let Some(surface) = &self.messages {
            surface.append(message);
        }
    }

    pub fn render_players(&self, roster: &Roster, stats: &GameStats) {
        if let Some(surface) = &self.players {
            surface.render(roster, stats);
        }
    }

    pub fn show_connection(&self, state: ConnectionState) {
        if let Some(surface) = &self.indicator {
            surface.connection(state);
        }
    }

    pub fn show_lifecycle(&self, controls: &ControlsView) {
        if let Some(surface) = &self.indicator {
            surface.lifecycle(controls);
        }
    }

    pub fn notice(&self, text: &str) {
        if let Some(surface) = &self.indicator {
            surface.notice(text);
        }
    }

    pub fn tick_clock(&self, now: NaiveTime) {
        if let Some(surface) = &self.indicator {
            surface.clock(now);
        }
    }

    pub fn render_tally(&self, tally: Option<&VoteTally>) {
        if let Some(surface) = &self.tally {
            match tally {
                Some(tally) => surface.render(tally),
                None => surface.clear(),
            }
        }
    }

    pub fn inspect(&self, message: &Message, raw: &str) {
        if let Some(surface) = &self.inspector {
            surface.show(message, raw);
        }
    }
}
