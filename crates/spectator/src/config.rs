//! Spectator configuration loaded from the environment.
//!
//! # Environment Variables
//!
//! - `ARENA_SESSION_ID` - Session to spectate (required unless given on the command line)
//! - `ARENA_BASE_URL` - Game server HTTP base (default: http://localhost:8081)
//! - `ARENA_WS_URL` - Push channel base (default: ws://localhost:8000/ws/)
//! - `ARENA_FETCH_INTERVAL_MS` - Snapshot fetch period (default: 3000)
//! - `ARENA_STATUS_INTERVAL_MS` - Lifecycle poll period (default: 5000)
//! - `ARENA_RECONNECT_BASE_DELAY_MS` - First reconnect delay (default: 1000)
//! - `ARENA_RECONNECT_MAX_ATTEMPTS` - Reconnect attempts before giving up (default: 5)
//! - `ARENA_HTTP_TIMEOUT_MS` - Per-request timeout (default: 10000)

use std::str::FromStr;
use std::time::Duration;

use arena_domain::{DomainError, SessionId};
use thiserror::Error;
use url::Url;

use crate::infrastructure::http_client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};
use crate::infrastructure::websocket::backoff::{
    saturating_millis, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
};
use crate::infrastructure::websocket::BackoffPolicy;
use crate::presentation::ViewSettings;

pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws/";
pub const DEFAULT_FETCH_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 5_000;
pub const CLOCK_INTERVAL_MS: u64 = 1_000;
pub const RENDER_STAGGER_MS: u64 = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no session id: pass one as the first argument or set ARENA_SESSION_ID")]
    MissingSession,

    #[error("invalid session id: {0}")]
    InvalidSession(#[from] DomainError),

    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    ZeroPeriod { var: &'static str },
}

#[derive(Debug, Clone)]
pub struct SpectatorConfig {
    pub session: SessionId,
    pub base_url: Url,
    pub ws_url: Url,
    pub fetch_interval: Duration,
    pub status_interval: Duration,
    pub clock_interval: Duration,
    pub reconnect: BackoffPolicy,
    pub http_timeout: Duration,
}

impl SpectatorConfig {
    /// Defaults for everything except the session.
    pub fn for_session(session: SessionId) -> Result<Self, ConfigError> {
        Ok(Self {
            session,
            base_url: parse_url("ARENA_BASE_URL", DEFAULT_BASE_URL)?,
            ws_url: parse_url("ARENA_WS_URL", DEFAULT_WS_URL)?,
            fetch_interval: Duration::from_millis(DEFAULT_FETCH_INTERVAL_MS),
            status_interval: Duration::from_millis(DEFAULT_STATUS_INTERVAL_MS),
            clock_interval: Duration::from_millis(CLOCK_INTERVAL_MS),
            reconnect: BackoffPolicy::default(),
            http_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        })
    }

    /// Read `ARENA_*` variables. A session given on the command line wins
    /// over `ARENA_SESSION_ID`.
    pub fn from_env(cli_session: Option<String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_session)
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cli_session: Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw_session = cli_session
            .filter(|s| !s.trim().is_empty())
            .or_else(|| lookup("ARENA_SESSION_ID"))
            .ok_or(ConfigError::MissingSession)?;
        let mut config = Self::for_session(SessionId::new(raw_session)?)?;

        if let Some(raw) = lookup("ARENA_BASE_URL") {
            config.base_url = parse_url("ARENA_BASE_URL", &raw)?;
        }
        if let Some(raw) = lookup("ARENA_WS_URL") {
            config.ws_url = parse_url("ARENA_WS_URL", &raw)?;
        }

        config.fetch_interval =
            period(&lookup, "ARENA_FETCH_INTERVAL_MS", config.fetch_interval)?;
        config.status_interval =
            period(&lookup, "ARENA_STATUS_INTERVAL_MS", config.status_interval)?;
        config.http_timeout = period(&lookup, "ARENA_HTTP_TIMEOUT_MS", config.http_timeout)?;

        let base_delay = millis(
            &lookup,
            "ARENA_RECONNECT_BASE_DELAY_MS",
            Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        )?;
        let max_attempts = number(&lookup, "ARENA_RECONNECT_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        config.reconnect = BackoffPolicy::new(base_delay, max_attempts);

        Ok(config)
    }

    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            fetch_interval: self.fetch_interval,
            status_interval: self.status_interval,
            clock_interval: self.clock_interval,
            stagger: Duration::from_millis(RENDER_STAGGER_MS),
        }
    }
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            var,
            reason: "routes cannot be appended to it".to_string(),
        });
    }
    Ok(url)
}

fn number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    number(lookup, var, saturating_millis(default)).map(Duration::from_millis)
}

/// Like [`millis`], but zero is rejected. Timer periods must be positive.
fn period(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let value = millis(lookup, var, default)?;
    if value.is_zero() {
        return Err(ConfigError::ZeroPeriod { var });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = SpectatorConfig::from_lookup(lookup_from(&[("ARENA_SESSION_ID", "s1")]), None)
            .expect("valid config");

        assert_eq!(config.session.as_str(), "s1");
        assert_eq!(config.base_url.as_str(), "http://localhost:8081/");
        assert_eq!(config.ws_url.as_str(), "ws://localhost:8000/ws/");
        assert_eq!(config.fetch_interval, Duration::from_secs(3));
        assert_eq!(config.status_interval, Duration::from_secs(5));
        assert_eq!(config.clock_interval, Duration::from_secs(1));
        assert_eq!(config.reconnect, BackoffPolicy::default());
        assert_eq!(config.view_settings().stagger, Duration::from_millis(50));
    }

    #[test]
    fn cli_session_wins() {
        let config = SpectatorConfig::from_lookup(
            lookup_from(&[("ARENA_SESSION_ID", "from-env")]),
            Some("from-cli".into()),
        )
        .expect("valid config");
        assert_eq!(config.session.as_str(), "from-cli");
    }

    #[test]
    fn missing_session_is_fatal() {
        let result = SpectatorConfig::from_lookup(lookup_from(&[]), Some("  ".into()));
        assert!(matches!(result, Err(ConfigError::MissingSession)));

        let result = SpectatorConfig::from_lookup(lookup_from(&[("ARENA_SESSION_ID", " ")]), None);
        assert!(matches!(result, Err(ConfigError::InvalidSession(_))));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = SpectatorConfig::from_lookup(
            lookup_from(&[
                ("ARENA_SESSION_ID", "s1"),
                ("ARENA_WS_URL", "wss://arena.example/push"),
                ("ARENA_FETCH_INTERVAL_MS", "750"),
                ("ARENA_RECONNECT_BASE_DELAY_MS", "200"),
                ("ARENA_RECONNECT_MAX_ATTEMPTS", "3"),
            ]),
            None,
        )
        .expect("valid config");

        assert_eq!(config.ws_url.as_str(), "wss://arena.example/push");
        assert_eq!(config.fetch_interval, Duration::from_millis(750));
        assert_eq!(
            config.reconnect,
            BackoffPolicy::new(Duration::from_millis(200), 3)
        );
    }

    #[test]
    fn bad_values_are_rejected() {
        let result = SpectatorConfig::from_lookup(
            lookup_from(&[("ARENA_SESSION_ID", "s1"), ("ARENA_BASE_URL", "not a url")]),
            None,
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidUrl { var: "ARENA_BASE_URL", .. })
        ));

        let result = SpectatorConfig::from_lookup(
            lookup_from(&[("ARENA_SESSION_ID", "s1"), ("ARENA_WS_URL", "mailto:ops@arena.local")]),
            None,
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidUrl { var: "ARENA_WS_URL", .. })
        ));

        let result = SpectatorConfig::from_lookup(
            lookup_from(&[("ARENA_SESSION_ID", "s1"), ("ARENA_STATUS_INTERVAL_MS", "-5")]),
            None,
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber { var: "ARENA_STATUS_INTERVAL_MS", .. })
        ));
    }

    #[test]
    fn zero_periods_are_rejected() {
        for var in [
            "ARENA_FETCH_INTERVAL_MS",
            "ARENA_STATUS_INTERVAL_MS",
            "ARENA_HTTP_TIMEOUT_MS",
        ] {
            let result = SpectatorConfig::from_lookup(
                lookup_from(&[("ARENA_SESSION_ID", "s1"), (var, "0")]),
                None,
            );
            assert!(
                matches!(result, Err(ConfigError::ZeroPeriod { var: v }) if v == var),
                "{var} accepted zero"
            );
        }

        // A zero reconnect delay only means retrying immediately.
        let config = SpectatorConfig::from_lookup(
            lookup_from(&[("ARENA_SESSION_ID", "s1"), ("ARENA_RECONNECT_BASE_DELAY_MS", "0")]),
            None,
        )
        .expect("valid config");
        assert_eq!(
            config.reconnect,
            BackoffPolicy::new(Duration::ZERO, DEFAULT_MAX_ATTEMPTS)
        );
    }
}
