//! Spectator view: owns the push client, the pollers and the display
//! surfaces, and runs the periodic loops that keep the display current.
//!
//! # Loops
//!
//! - fetch: every `fetch_interval`, and whenever the push channel reports new
//!   data, run one snapshot cycle (skipped while the game is not live or a
//!   previous cycle is still in flight)
//! - status: every `status_interval`, poll the lifecycle
//! - clock: every `clock_interval`, tick the clock and refresh the connection
//!   indicator
//!
//! When the game stops being live, or the server pushes `game_complete`, one
//! final cycle runs past the liveness gate so the closing rounds and the
//! winner are shown. All loops stop on [`SpectatorView::teardown`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use arena_domain::{
    reconstruct, ControlsView, GameStats, Message, MessageId, Roster, SessionId, Timeline,
    STOPPED_BY_OPERATOR,
};
use arena_shared::{PushEvent, PushEventKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::reconciler::{RenderOp, RenderPlan, RenderReconciler, RenderStrategy};
use crate::application::services::{
    SnapshotFetcher, StatusPoller, StopOutcome, FETCH_FAILED_NOTICE,
};
use crate::infrastructure::messaging::SubscriptionId;
use crate::infrastructure::websocket::PushClient;
use crate::ports::outbound::{DisplaySurfaces, GameApiPort};

const REFRESH_BUFFER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSettings {
    pub fetch_interval: Duration,
    pub status_interval: Duration,
    pub clock_interval: Duration,
    /// Delay between consecutive appended messages.
    pub stagger: Duration,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            fetch_interval: Duration::from_secs(3),
            status_interval: Duration::from_secs(5),
            clock_interval: Duration::from_secs(1),
            stagger: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotLive,
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    /// Fetch failed; the display was left as it was.
    Failed,
    Applied(RenderStrategy),
}

/// Clears the in-flight flag when the cycle ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SpectatorView {
    session: SessionId,
    fetcher: SnapshotFetcher,
    poller: StatusPoller,
    transport: Arc<PushClient>,
    surfaces: DisplaySurfaces,
    settings: ViewSettings,
    reconciler: tokio::sync::Mutex<RenderReconciler>,
    timeline: RwLock<Arc<Timeline>>,
    fetch_in_flight: AtomicBool,
    /// One cycle may run even though the game is no longer live.
    final_fetch_due: Arc<AtomicBool>,
    generation: AtomicU64,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
    torn_down: AtomicBool,
}

impl SpectatorView {
    pub fn new(
        api: Arc<dyn GameApiPort>,
        session: SessionId,
        transport: Arc<PushClient>,
        surfaces: DisplaySurfaces,
        settings: ViewSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            fetcher: SnapshotFetcher::new(Arc::clone(&api), session.clone()),
            poller: StatusPoller::new(api, session.clone()),
            session,
            transport,
            surfaces,
            settings,
            reconciler: tokio::sync::Mutex::new(RenderReconciler::new(settings.stagger)),
            timeline: RwLock::new(Arc::new(Timeline::default())),
            fetch_in_flight: AtomicBool::new(false),
            final_fetch_due: Arc::new(AtomicBool::new(false)),
            generation: AtomicU64::new(0),
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            torn_down: AtomicBool::new(false),
        })
    }

    pub fn transport(&self) -> &Arc<PushClient> {
        &self.transport
    }

    /// Latest reconstructed timeline.
    pub fn timeline(&self) -> Arc<Timeline> {
        Arc::clone(&self.timeline.read().unwrap_or_else(PoisonError::into_inner))
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Subscribe to the push channel, connect it and start the loops.
    pub fn start(self: &Arc<Self>) {
        let (refresh_tx, refresh_rx) = mpsc::channel::<()>(REFRESH_BUFFER);
        self.subscribe(refresh_tx);

        let connect = {
            let view = Arc::clone(self);
            tokio::spawn(async move {
                if let Err(e) = view.transport.connect(&view.session).await {
                    tracing::warn!(session = %view.session, error = %e, "Push channel unavailable, retrying in background");
                }
            })
        };

        let handles = vec![
            connect,
            tokio::spawn(Arc::clone(self).fetch_loop(refresh_rx)),
            tokio::spawn(Arc::clone(self).status_loop()),
            tokio::spawn(Arc::clone(self).clock_loop()),
        ];
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(handles);

        tracing::info!(session = %self.session, "Spectator view started");
    }

    fn subscribe(&self, refresh_tx: mpsc::Sender<()>) {
        let mut ids = Vec::new();

        for kind in PushEventKind::ALL.into_iter().filter(|k| k.signals_new_data()) {
            let tx = refresh_tx.clone();
            let final_fetch_due = Arc::clone(&self.final_fetch_due);
            ids.push(self.transport.on(kind, move |event| {
                tracing::debug!(event = %event.kind(), "Push event, refreshing");
                if kind == PushEventKind::GameComplete {
                    final_fetch_due.store(true, Ordering::Release);
                }
                // A full buffer already guarantees a pending refresh.
                let _ = tx.try_send(());
            }));
        }

        let surfaces = self.surfaces.clone();
        ids.push(self.transport.on(PushEventKind::Error, move |event| {
            if let PushEvent::Error { message } = event {
                surfaces.notice(message);
            }
        }));

        ids.push(self.transport.on(PushEventKind::Disconnect, |event| {
            if let PushEvent::Disconnect { reason } = event {
                tracing::info!(reason = %reason, "Push channel disconnected");
            }
        }));

        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(ids);
    }

    async fn fetch_loop(self: Arc<Self>, mut refresh_rx: mpsc::Receiver<()>) {
        let mut ticker = interval(self.settings.fetch_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
                Some(()) = refresh_rx.recv() => {}
            }
            // Detached so a slow cycle cannot delay the next tick; the
            // in-flight guard decides whether it runs.
            let view = Arc::clone(&self);
            tokio::spawn(async move {
                view.run_fetch_cycle().await;
            });
        }
    }

    async fn status_loop(self: Arc<Self>) {
        let mut ticker = interval(self.settings.status_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.poll_status().await;
                }
            }
        }
    }

    async fn clock_loop(self: Arc<Self>) {
        let mut ticker = interval(self.settings.clock_interval);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.surfaces.tick_clock(chrono::Local::now().time());
                    self.surfaces.show_connection(self.transport.status());
                }
            }
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// One snapshot cycle: fetch, rebuild, reconcile, render.
    pub async fn run_fetch_cycle(&self) -> CycleOutcome {
        if !self.final_fetch_due.load(Ordering::Acquire) && !self.poller.is_live().await {
            tracing::debug!(session = %self.session, "Game not live, skipping fetch");
            return CycleOutcome::Skipped(SkipReason::NotLive);
        }
        // A pending final cycle survives this skip and runs on the next tick.
        let Some(_in_flight) = InFlight::acquire(&self.fetch_in_flight) else {
            tracing::debug!(session = %self.session, "Previous fetch still running, skipping tick");
            return CycleOutcome::Skipped(SkipReason::InFlight);
        };
        let final_cycle = self.final_fetch_due.swap(false, Ordering::AcqRel);
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let cycle = match self.fetcher.fetch().await {
            Ok(cycle) => cycle,
            Err(e) => {
                if final_cycle {
                    self.final_fetch_due.store(true, Ordering::Release);
                }
                tracing::warn!(session = %self.session, generation, error = %e, "Fetch cycle failed");
                self.surfaces.notice(FETCH_FAILED_NOTICE);
                return CycleOutcome::Failed;
            }
        };

        let timeline = Arc::new(reconstruct(&cycle.logs, &cycle.state));
        let roster = Roster::from_snapshot(&cycle.state);
        let stats = GameStats::new(&roster, &timeline);

        *self.timeline.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&timeline);
        self.surfaces.render_players(&roster, &stats);
        self.surfaces.render_tally(timeline.latest_tally.as_ref());

        let plan = self.reconciler.lock().await.reconcile(&timeline.messages);
        self.apply(&plan, &timeline.messages).await;

        tracing::debug!(
            session = %self.session,
            generation,
            final_cycle,
            snapshot = %cycle.kind,
            messages = timeline.messages.len(),
            strategy = ?plan.strategy,
            "Fetch cycle applied"
        );
        CycleOutcome::Applied(plan.strategy)
    }

    async fn apply(&self, plan: &RenderPlan, messages: &[Message]) {
        let started = Instant::now();
        for op in &plan.ops {
            match *op {
                RenderOp::Clear => self.surfaces.clear_messages(),
                RenderOp::Append { index, delay } => {
                    if !delay.is_zero() {
                        tokio::select! {
                            _ = self.cancel.cancelled() => return,
                            _ = tokio::time::sleep_until(started + delay) => {}
                        }
                    }
                    if let Some(message) = messages.get(index) {
                        self.surfaces.append_message(message);
                    }
                }
            }
        }
    }

    /// Poll the lifecycle once and show the resulting controls. If the game
    /// just stopped being live, run the final fetch cycle.
    pub async fn poll_status(&self) -> Option<ControlsView> {
        let poll = self.poller.poll_once().await?;
        self.surfaces.show_lifecycle(&poll.controls);
        if poll.went_idle {
            self.finish().await;
        }
        Some(poll.controls)
    }

    async fn finish(&self) {
        tracing::info!(session = %self.session, "Game no longer live, fetching final state");
        self.final_fetch_due.store(true, Ordering::Release);
        self.run_fetch_cycle().await;
    }

    /// Operator stop.
    pub async fn stop_game(&self) -> StopOutcome {
        let was_live = self.poller.is_live().await;
        let surfaces = &self.surfaces;
        let (outcome, controls) = self
            .poller
            .request_stop(|pending| surfaces.show_lifecycle(pending))
            .await;

        surfaces.show_lifecycle(&controls);
        match &outcome {
            StopOutcome::Stopped => surfaces.notice(STOPPED_BY_OPERATOR),
            StopOutcome::Failed(reason) => {
                surfaces.notice(&format!("Failed to stop game: {reason}"));
            }
        }
        if outcome == StopOutcome::Stopped && was_live {
            self.finish().await;
        }
        outcome
    }

    /// Show a message and its originating record on the inspector. Returns
    /// `false` for an unknown id.
    pub fn inspect(&self, raw_id: &str) -> bool {
        let Ok(id) = raw_id.trim().parse::<MessageId>() else {
            return false;
        };
        let timeline = self.timeline();
        let Some(message) = timeline.find(&id) else {
            return false;
        };

        let raw = message
            .source
            .as_ref()
            .and_then(|source| serde_json::to_string_pretty(source).ok())
            .unwrap_or_else(|| "null".to_string());
        self.surfaces.inspect(message, &raw);
        true
    }

    /// Stop every loop, close the push channel and drop the subscriptions.
    /// Safe to call more than once.
    pub async fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cancel.cancel();
        self.transport.disconnect().await;

        let ids: Vec<SubscriptionId> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for id in ids {
            self.transport.unsubscribe(id);
        }

        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::debug!(error = %e, "View task ended abnormally");
            }
        }

        self.reconciler.lock().await.reset();
        tracing::info!(session = %self.session, "Spectator view torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use arena_domain::{GameStateSnapshot, RoundLog};
    use arena_shared::{LifecycleStatusResponse, SnapshotKind, StopGameResponse};
    use async_trait::async_trait;
    use mockall::Sequence;
    use tokio::sync::Notify;
    use url::Url;

    use crate::infrastructure::messaging::ConnectionState;
    use crate::infrastructure::testing::{
        api_request_failed, bob_round_logs, bob_snapshot, RecordingDisplay, ScriptedConnector,
        Step,
    };
    use crate::infrastructure::websocket::{BackoffPolicy, ChannelFrame, Connector};
    use crate::ports::outbound::{ApiError, MockGameApiPort};

    fn session() -> SessionId {
        SessionId::new("s1").expect("valid session")
    }

    fn settings() -> ViewSettings {
        ViewSettings {
            stagger: Duration::ZERO,
            ..Default::default()
        }
    }

    fn transport(connector: Arc<dyn Connector>) -> Arc<PushClient> {
        let base = Url::parse("ws://localhost:8000/ws/").expect("valid url");
        Arc::new(PushClient::new(base, connector, BackoffPolicy::default()))
    }

    fn view_with(
        api: impl GameApiPort + 'static,
        display: &Arc<RecordingDisplay>,
        settings: ViewSettings,
    ) -> Arc<SpectatorView> {
        SpectatorView::new(
            Arc::new(api),
            session(),
            transport(Arc::new(ScriptedConnector::failing())),
            DisplaySurfaces::all(Arc::clone(display)),
            settings,
        )
    }

    fn bob_api() -> MockGameApiPort {
        let mut api = MockGameApiPort::new();
        api.expect_round_logs().returning(|_| Ok(bob_round_logs()));
        api.expect_state_snapshot()
            .returning(|_, _| Ok(bob_snapshot()));
        api
    }

    #[tokio::test]
    async fn bob_scenario_renders_then_settles() {
        let display = Arc::new(RecordingDisplay::new());
        let view = view_with(bob_api(), &display, settings());

        assert_eq!(
            view.run_fetch_cycle().await,
            CycleOutcome::Applied(RenderStrategy::Rerender)
        );
        assert_eq!(
            display.calls_with("append"),
            vec!["append night-r0-0", "append system-r0-1"]
        );
        assert_eq!(display.calls_with("players"), vec!["players 3 alive=2"]);
        assert_eq!(display.calls_with("tally"), vec!["tally cleared"]);

        assert_eq!(
            view.run_fetch_cycle().await,
            CycleOutcome::Applied(RenderStrategy::Unchanged)
        );
        assert_eq!(display.calls_with("append").len(), 2);
    }

    #[tokio::test]
    async fn not_live_skips_regular_fetches() {
        let mut api = MockGameApiPort::new();
        api.expect_lifecycle_status().returning(|_| {
            Ok(LifecycleStatusResponse {
                success: true,
                status: Some("completed".into()),
                error: None,
            })
        });
        api.expect_round_logs()
            .times(1)
            .returning(|_| Ok(bob_round_logs()));
        api.expect_state_snapshot()
            .times(1)
            .returning(|_, _| Ok(bob_snapshot()));

        let display = Arc::new(RecordingDisplay::new());
        let view = view_with(api, &display, settings());

        let controls = view.poll_status().await.expect("poll succeeds");
        assert!(!controls.live);
        assert_eq!(
            view.run_fetch_cycle().await,
            CycleOutcome::Skipped(SkipReason::NotLive)
        );
        view.poll_status().await.expect("poll succeeds");
        assert_eq!(
            view.run_fetch_cycle().await,
            CycleOutcome::Skipped(SkipReason::NotLive)
        );
        assert_eq!(
            display.calls_with("lifecycle"),
            vec![
                "lifecycle Completed stop=false [Completed]",
                "lifecycle Completed stop=false [Completed]"
            ]
        );
    }

    #[tokio::test]
    async fn failed_cycle_leaves_the_display_untouched() {
        let mut api = MockGameApiPort::new();
        let mut seq = Sequence::new();
        api.expect_round_logs()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(bob_round_logs()));
        api.expect_round_logs()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(api_request_failed("connection reset")));
        api.expect_state_snapshot()
            .times(1)
            .returning(|_, _| Ok(bob_snapshot()));

        let display = Arc::new(RecordingDisplay::new());
        let view = view_with(api, &display, settings());

        view.run_fetch_cycle().await;
        let before = display.calls();

        assert_eq!(view.run_fetch_cycle().await, CycleOutcome::Failed);
        let after = display.calls();
        assert_eq!(&after[..before.len()], before.as_slice());
        assert_eq!(after[before.len()..], ["notice Unable to load game data".to_string()]);
        assert_eq!(view.timeline().messages.len(), 2);
    }

    /// Holds `round_logs` open until released.
    struct GatedApi {
        gate: Notify,
        entered: AtomicUsize,
    }

    #[async_trait]
    impl GameApiPort for GatedApi {
        async fn round_logs(&self, _session: &SessionId) -> Result<Vec<RoundLog>, ApiError> {
            self.entered.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(bob_round_logs())
        }

        async fn state_snapshot(
            &self,
            _session: &SessionId,
            _kind: SnapshotKind,
        ) -> Result<GameStateSnapshot, ApiError> {
            Ok(bob_snapshot())
        }

        async fn lifecycle_status(
            &self,
            _session: &SessionId,
        ) -> Result<LifecycleStatusResponse, ApiError> {
            Err(api_request_failed("unused"))
        }

        async fn stop_game(&self, _session: &SessionId) -> Result<StopGameResponse, ApiError> {
            Err(api_request_failed("unused"))
        }
    }

    #[tokio::test]
    async fn overlapping_cycles_are_skipped() {
        let api = Arc::new(GatedApi {
            gate: Notify::new(),
            entered: AtomicUsize::new(0),
        });
        let display = Arc::new(RecordingDisplay::new());
        let view = SpectatorView::new(
            Arc::clone(&api) as Arc<dyn GameApiPort>,
            session(),
            transport(Arc::new(ScriptedConnector::failing())),
            DisplaySurfaces::all(Arc::clone(&display)),
            settings(),
        );

        let first = {
            let view = Arc::clone(&view);
            tokio::spawn(async move { view.run_fetch_cycle().await })
        };
        while api.entered.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            view.run_fetch_cycle().await,
            CycleOutcome::Skipped(SkipReason::InFlight)
        );

        api.gate.notify_one();
        assert_eq!(
            first.await.expect("cycle task"),
            CycleOutcome::Applied(RenderStrategy::Rerender)
        );
        assert_eq!(api.entered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_shows_pending_then_stopped() {
        let mut api = bob_api();
        api.expect_stop_game().times(1).returning(|_| {
            Ok(StopGameResponse {
                success: true,
                error: None,
                message: None,
            })
        });

        let display = Arc::new(RecordingDisplay::new());
        let view = view_with(api, &display, settings());

        assert_eq!(view.stop_game().await, StopOutcome::Stopped);
        let calls = display.calls();
        assert_eq!(
            calls[..3],
            [
                "lifecycle Unknown stop=false [Stopping...]".to_string(),
                "lifecycle Stopped stop=false [Stopped]".to_string(),
                "notice Game stopped by operator".to_string(),
            ]
        );
        // One last cycle shows what was written before the stop.
        assert_eq!(
            display.calls_with("append"),
            vec!["append night-r0-0", "append system-r0-1"]
        );
        assert_eq!(
            view.run_fetch_cycle().await,
            CycleOutcome::Skipped(SkipReason::NotLive)
        );
    }

    #[tokio::test]
    async fn failed_stop_reports_the_server_error() {
        let mut api = MockGameApiPort::new();
        api.expect_stop_game()
            .returning(|_| Err(api_request_failed("connection refused")));

        let display = Arc::new(RecordingDisplay::new());
        let view = view_with(api, &display, settings());

        assert!(matches!(view.stop_game().await, StopOutcome::Failed(_)));
        assert_eq!(
            display.calls_with("notice"),
            vec!["notice Failed to stop game: Request failed: connection refused"]
        );
        assert_eq!(
            display.calls_with("lifecycle").last().map(String::as_str),
            Some("lifecycle Stop failed stop=true [Stop]")
        );
    }

    fn completed() -> LifecycleStatusResponse {
        LifecycleStatusResponse {
            success: true,
            status: Some("completed".into()),
            error: None,
        }
    }

    #[tokio::test]
    async fn closing_state_is_fetched_once_the_game_ends() {
        let mut api = MockGameApiPort::new();
        let mut seq = Sequence::new();
        api.expect_round_logs().returning(|_| Ok(bob_round_logs()));
        api.expect_state_snapshot()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(bob_snapshot()));
        api.expect_state_snapshot()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                let mut state = bob_snapshot();
                state.winner = Some("Villagers".into());
                Ok(state)
            });
        api.expect_lifecycle_status()
            .times(2)
            .returning(|_| Ok(completed()));

        let display = Arc::new(RecordingDisplay::new());
        let view = view_with(api, &display, settings());

        assert_eq!(
            view.run_fetch_cycle().await,
            CycleOutcome::Applied(RenderStrategy::Rerender)
        );

        // The winner was written after the last regular fetch.
        let controls = view.poll_status().await.expect("poll succeeds");
        assert!(!controls.live);
        let appends = display.calls_with("append");
        assert_eq!(appends[..2], ["append night-r0-0", "append system-r0-1"]);
        assert_eq!(appends.last().map(String::as_str), Some("append system-final"));
        assert!(view
            .timeline()
            .messages
            .iter()
            .any(|m| m.text == "Game over! Winner: Villagers"));

        // Afterwards the gate holds, and a repeated status does not refetch.
        assert_eq!(
            view.run_fetch_cycle().await,
            CycleOutcome::Skipped(SkipReason::NotLive)
        );
        view.poll_status().await.expect("poll succeeds");
        assert_eq!(display.calls_with("append").len(), appends.len());
    }

    #[tokio::test]
    async fn failed_closing_cycle_is_retried() {
        let mut api = MockGameApiPort::new();
        let mut seq = Sequence::new();
        api.expect_round_logs()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(api_request_failed("connection reset")));
        api.expect_round_logs()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(bob_round_logs()));
        api.expect_state_snapshot()
            .times(1)
            .returning(|_, _| Ok(bob_snapshot()));
        api.expect_lifecycle_status()
            .times(1)
            .returning(|_| Ok(completed()));

        let display = Arc::new(RecordingDisplay::new());
        let view = view_with(api, &display, settings());

        view.poll_status().await.expect("poll succeeds");
        assert_eq!(display.calls_with("notice"), vec!["notice Unable to load game data"]);

        assert_eq!(
            view.run_fetch_cycle().await,
            CycleOutcome::Applied(RenderStrategy::Rerender)
        );
        assert_eq!(
            view.run_fetch_cycle().await,
            CycleOutcome::Skipped(SkipReason::NotLive)
        );
    }

    #[tokio::test]
    async fn inspect_shows_the_originating_record() {
        let display = Arc::new(RecordingDisplay::new());
        let view = view_with(bob_api(), &display, settings());

        assert!(!view.inspect("night-r0-0"));
        view.run_fetch_cycle().await;

        assert!(view.inspect("night-r0-0"));
        assert_eq!(display.calls_with("inspect").len(), 1);
        assert!(!view.inspect("night-r9-0"));
        assert!(!view.inspect("not an id"));
    }

    #[tokio::test(start_paused = true)]
    async fn push_events_trigger_a_refresh() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut api = MockGameApiPort::new();
        {
            let fetches = Arc::clone(&fetches);
            api.expect_round_logs().returning(move |_| {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(bob_round_logs())
            });
        }
        api.expect_state_snapshot()
            .returning(|_, _| Ok(bob_snapshot()));
        api.expect_lifecycle_status()
            .returning(|_| Err(api_request_failed("status offline")));

        let connector = Arc::new(ScriptedConnector::new([Step::Accept]));
        let display = Arc::new(RecordingDisplay::new());
        let hour = Duration::from_secs(3600);
        let view = SpectatorView::new(
            Arc::new(api),
            session(),
            transport(Arc::clone(&connector) as Arc<dyn Connector>),
            DisplaySurfaces::all(Arc::clone(&display)),
            ViewSettings {
                fetch_interval: hour,
                status_interval: hour,
                clock_interval: hour,
                stagger: Duration::ZERO,
            },
        );

        view.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(view.transport().status(), ConnectionState::Connected);

        let link = connector.take_link(0).expect("accepted channel");
        link.frames
            .send(ChannelFrame::Text(
                r#"{"type": "round_complete", "data": {"round": 0}}"#.into(),
            ))
            .await
            .expect("client listening");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 2);

        link.frames
            .send(ChannelFrame::Text(
                r#"{"type": "error", "data": {"message": "agent crashed"}}"#.into(),
            ))
            .await
            .expect("client listening");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(display.calls_with("notice"), vec!["notice agent crashed"]);

        view.teardown().await;
        view.teardown().await;
        assert_eq!(view.transport().status(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn game_complete_push_fetches_past_the_live_gate() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut api = MockGameApiPort::new();
        {
            let fetches = Arc::clone(&fetches);
            api.expect_round_logs().returning(move |_| {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(bob_round_logs())
            });
        }
        api.expect_state_snapshot()
            .returning(|_, _| Ok(bob_snapshot()));
        api.expect_lifecycle_status()
            .returning(|_| Ok(completed()));

        let connector = Arc::new(ScriptedConnector::new([Step::Accept]));
        let display = Arc::new(RecordingDisplay::new());
        let hour = Duration::from_secs(3600);
        let view = SpectatorView::new(
            Arc::new(api),
            session(),
            transport(Arc::clone(&connector) as Arc<dyn Connector>),
            DisplaySurfaces::all(Arc::clone(&display)),
            ViewSettings {
                fetch_interval: hour,
                status_interval: hour,
                clock_interval: hour,
                stagger: Duration::ZERO,
            },
        );

        // Liveness ends before the loops start; that runs the one final cycle.
        view.poll_status().await.expect("poll succeeds");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        view.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 1, "initial tick is gated");

        let link = connector.take_link(0).expect("accepted channel");
        link.frames
            .send(ChannelFrame::Text(
                r#"{"type": "game_complete", "data": {"winner": "Villagers"}}"#.into(),
            ))
            .await
            .expect("client listening");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 2);

        link.frames
            .send(ChannelFrame::Text(
                r#"{"type": "game_update", "data": {"round": 3}}"#.into(),
            ))
            .await
            .expect("client listening");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 2);

        view.teardown().await;
    }
}
