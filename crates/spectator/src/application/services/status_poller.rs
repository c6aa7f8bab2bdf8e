//! Lifecycle status poller and the operator stop action.
//!
//! The poller owns the [`LifecycleMachine`], which is the single answer to
//! "should the snapshot fetch run". Poll failures are logged and swallowed;
//! the machine keeps its last known state until the next good poll.

use std::sync::Arc;

use arena_domain::{ControlsView, LifecycleMachine, SessionId};
use tokio::sync::RwLock;

use crate::ports::outbound::GameApiPort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    /// Server error text, or the transport error.
    Failed(String),
}

/// Result of one successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPoll {
    pub controls: ControlsView,
    /// The game was live before this poll and is not any more.
    pub went_idle: bool,
}

pub struct StatusPoller {
    api: Arc<dyn GameApiPort>,
    session: SessionId,
    lifecycle: RwLock<LifecycleMachine>,
}

impl StatusPoller {
    pub fn new(api: Arc<dyn GameApiPort>, session: SessionId) -> Self {
        Self {
            api,
            session,
            lifecycle: RwLock::new(LifecycleMachine::new()),
        }
    }

    pub async fn is_live(&self) -> bool {
        self.lifecycle.read().await.is_live()
    }

    /// One poll. Returns the new controls, or `None` if the poll failed.
    pub async fn poll_once(&self) -> Option<StatusPoll> {
        let response = match self.api.lifecycle_status(&self.session).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(session = %self.session, error = %e, "Status poll failed");
                return None;
            }
        };

        let Some(next) = response.lifecycle_state() else {
            tracing::warn!(
                session = %self.session,
                error = response.error.as_deref().unwrap_or("unspecified"),
                "Status poll rejected by server"
            );
            return None;
        };

        let mut machine = self.lifecycle.write().await;
        let previous = machine.state();
        let was_live = machine.is_live();
        if machine.apply(next) {
            tracing::info!(session = %self.session, from = %previous, to = %next, "Game lifecycle changed");
        }
        Some(StatusPoll {
            controls: machine.controls().clone(),
            went_idle: was_live && !machine.is_live(),
        })
    }

    /// Ask the server to stop the game. `on_pending` sees the disabled
    /// controls before the request goes out.
    pub async fn request_stop(
        &self,
        on_pending: impl FnOnce(&ControlsView),
    ) -> (StopOutcome, ControlsView) {
        {
            let mut machine = self.lifecycle.write().await;
            machine.begin_stop();
            on_pending(machine.controls());
        }

        let outcome = match self.api.stop_game(&self.session).await {
            Ok(body) if body.success => StopOutcome::Stopped,
            Ok(body) => StopOutcome::Failed(
                body.error
                    .or(body.message)
                    .unwrap_or_else(|| "unknown error".to_string()),
            ),
            Err(e) => StopOutcome::Failed(e.to_string()),
        };

        let mut machine = self.lifecycle.write().await;
        match &outcome {
            StopOutcome::Stopped => {
                tracing::info!(session = %self.session, "Game stopped by operator");
                machine.stop_succeeded();
            }
            StopOutcome::Failed(reason) => {
                tracing::warn!(session = %self.session, reason = %reason, "Stop request failed");
                machine.stop_failed();
            }
        }
        (outcome, machine.controls().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_domain::{IndicatorTone, STOP_FAILED_LABEL};
    use arena_shared::{LifecycleStatusResponse, StopGameResponse};
    use mockall::Sequence;

    use crate::infrastructure::testing::api_request_failed;
    use crate::ports::outbound::MockGameApiPort;

    fn session() -> SessionId {
        SessionId::new("s1").expect("valid session")
    }

    fn status(raw: &str) -> LifecycleStatusResponse {
        LifecycleStatusResponse {
            success: true,
            status: Some(raw.to_string()),
            error: None,
        }
    }

    #[tokio::test]
    async fn stopped_then_running() {
        let mut api = MockGameApiPort::new();
        let mut seq = Sequence::new();
        api.expect_lifecycle_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(status("stopped")));
        api.expect_lifecycle_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(status("running")));

        let poller = StatusPoller::new(Arc::new(api), session());

        let poll = poller.poll_once().await.expect("poll succeeds");
        assert!(!poll.controls.stop_enabled);
        assert!(poll.went_idle);
        assert!(!poller.is_live().await);

        let poll = poller.poll_once().await.expect("poll succeeds");
        assert!(!poll.went_idle);
        let controls = poll.controls;
        assert!(controls.stop_enabled);
        assert_eq!(controls.status_label, "Running");
        assert!(poller.is_live().await);
    }

    #[tokio::test]
    async fn failures_keep_the_last_state() {
        let mut api = MockGameApiPort::new();
        let mut seq = Sequence::new();
        api.expect_lifecycle_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(status("completed")));
        api.expect_lifecycle_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(api_request_failed("timeout")));
        api.expect_lifecycle_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(LifecycleStatusResponse {
                    success: false,
                    status: None,
                    error: Some("no such session".into()),
                })
            });

        let poller = StatusPoller::new(Arc::new(api), session());
        let first = poller.poll_once().await.expect("poll succeeds");
        assert_eq!(first.controls.status_label, "Completed");
        assert!(first.went_idle);
        assert!(poller.poll_once().await.is_none());
        assert!(poller.poll_once().await.is_none());
        assert!(!poller.is_live().await);
    }

    #[tokio::test]
    async fn successful_stop_ends_liveness() {
        let mut api = MockGameApiPort::new();
        api.expect_stop_game().times(1).returning(|_| {
            Ok(StopGameResponse {
                success: true,
                error: None,
                message: Some("stopping".into()),
            })
        });

        let poller = StatusPoller::new(Arc::new(api), session());
        let mut pending_label = String::new();
        let (outcome, controls) = poller
            .request_stop(|c| pending_label = c.stop_label.clone())
            .await;

        assert_eq!(pending_label, "Stopping...");
        assert_eq!(outcome, StopOutcome::Stopped);
        assert_eq!(controls.indicator, IndicatorTone::Stopped);
        assert!(!poller.is_live().await);
    }

    #[tokio::test]
    async fn rejected_stop_re_enables_the_control() {
        let mut api = MockGameApiPort::new();
        api.expect_stop_game().times(1).returning(|_| {
            Ok(StopGameResponse {
                success: false,
                error: Some("game already finished".into()),
                message: None,
            })
        });

        let poller = StatusPoller::new(Arc::new(api), session());
        let (outcome, controls) = poller.request_stop(|_| {}).await;

        assert_eq!(
            outcome,
            StopOutcome::Failed("game already finished".into())
        );
        assert!(controls.stop_enabled);
        assert_eq!(controls.status_label, STOP_FAILED_LABEL);
        assert!(poller.is_live().await);
    }
}
