// ── Controller ──
//
// Lifecycle and polling for one router session. A single background
// task owns the `Session` and processes commands, timer ticks and refresh
// completions one at a time; consumers talk to it through the command
// channel and observe it through the view store.
//
// Refresh overlap policy: at most one refresh is in flight. A timer tick
// while one is outstanding is dropped. An explicit refresh (or the reload
// after a save) is queued and coalesced into a single follow-up, with the
// force flags OR'ed together; its callers are answered when it commits.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, join_all};
use parental_api::{ActionAck, UbusClient};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{ActionOutcome, Command, CommandEnvelope, CommandResult, FormEdit};
use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::model::{
    ActivityEntry, DiscoveredDevice, FormModel, HealthStatus, HealthView, MacAddress,
};
use crate::session::{ConnectionState, EditState, RefreshData, Session};
use crate::store::ViewStore;
use crate::stream::ViewStream;
use crate::usage::UsageReport;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: Arc<ViewStore>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller. Nothing runs until [`start()`](Self::start).
    pub fn new(config: ControllerConfig) -> Self {
        let store = Arc::new(ViewStore::new(&Session::init()));
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handle: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Build the ubus client and spawn the session task.
    ///
    /// With a non-zero poll interval the first refresh starts right away
    /// and repeats on the timer. With a zero interval nothing is fetched
    /// until a `Refresh` command arrives.
    pub async fn start(&self) -> Result<(), CoreError> {
        let mut handle = self.inner.task_handle.lock().await;
        if handle.is_some() {
            return Ok(());
        }
        let commands = self
            .inner
            .command_rx
            .lock()
            .await
            .take()
            .ok_or(CoreError::ControllerDisconnected)?;

        let config = &self.inner.config;
        let client = UbusClient::new(&config.endpoint, config.session.clone(), &config.transport())?;

        let task = SessionTask {
            client: Arc::new(client),
            session: Session::init(),
            store: Arc::clone(&self.inner.store),
            commands,
            cancel: self.inner.cancel.clone(),
            ticker: ticker(config.poll_interval),
            log_limit: config.activity_log_limit,
            in_flight: None,
            queued: None,
        };
        *handle = Some(tokio::spawn(task.run()));

        info!(
            endpoint = %config.endpoint,
            poll_secs = config.poll_interval.as_secs(),
            "session started"
        );
        Ok(())
    }

    /// Stop the session task. Outstanding commands fail with
    /// [`CoreError::ControllerDisconnected`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.task_handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "session task ended abnormally");
            }
        }
        debug!("session stopped");
    }

    /// Wait until the first refresh has committed, successfully or not.
    pub async fn ready(&self) -> Result<ConnectionState, CoreError> {
        if self.inner.task_handle.lock().await.is_none() {
            return Err(CoreError::ControllerDisconnected);
        }
        let mut rx = self.inner.store.connection_receiver();
        let state = rx
            .wait_for(|state| *state != ConnectionState::Idle)
            .await
            .map_err(|_| CoreError::ControllerDisconnected)?;
        Ok(state.clone())
    }

    // ── Command execution ────────────────────────────────────────

    /// Send a command to the session task and await its result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if self.inner.cancel.is_cancelled() || self.inner.task_handle.lock().await.is_none() {
            return Err(CoreError::ControllerDisconnected);
        }

        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::ControllerDisconnected)?;

        rx.await.map_err(|_| CoreError::ControllerDisconnected)?
    }

    pub async fn edit(&self, edit: FormEdit) -> Result<CommandResult, CoreError> {
        self.execute(Command::Edit(edit)).await
    }

    pub async fn refresh(&self, force: bool) -> Result<CommandResult, CoreError> {
        self.execute(Command::Refresh { force }).await
    }

    pub async fn save(&self) -> Result<CommandResult, CoreError> {
        self.execute(Command::Save).await
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: start, load once, run closure, shut down.
    ///
    /// Disables the poll timer; the initial load's error (if any) is
    /// returned as is.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.poll_interval = Duration::ZERO;

        let controller = Controller::new(cfg);
        controller.start().await?;
        let result = match controller.refresh(false).await {
            Ok(_) => f(controller.clone()).await,
            Err(e) => Err(e),
        };
        controller.shutdown().await;
        result
    }

    // ── Snapshot accessors ───────────────────────────────────────

    pub fn form_snapshot(&self) -> Arc<FormModel> {
        self.inner.store.form_snapshot()
    }

    pub fn edit_state_snapshot(&self) -> EditState {
        self.inner.store.edit_state_snapshot()
    }

    pub fn discovered_snapshot(&self) -> Arc<Vec<DiscoveredDevice>> {
        self.inner.store.discovered_snapshot()
    }

    pub fn health_snapshot(&self) -> HealthView {
        self.inner.store.health_snapshot()
    }

    pub fn activity_snapshot(&self) -> Arc<Vec<ActivityEntry>> {
        self.inner.store.activity_snapshot()
    }

    pub fn usage_snapshot(&self) -> Arc<UsageReport> {
        self.inner.store.usage_snapshot()
    }

    pub fn connection_snapshot(&self) -> ConnectionState {
        self.inner.store.connection_snapshot()
    }

    pub fn last_overview_at(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_overview_at()
    }

    // ── Stream accessors ─────────────────────────────────────────

    pub fn form(&self) -> ViewStream<Arc<FormModel>> {
        self.inner.store.subscribe_form()
    }

    pub fn edit_state(&self) -> ViewStream<EditState> {
        self.inner.store.subscribe_edit_state()
    }

    pub fn discovered(&self) -> ViewStream<Arc<Vec<DiscoveredDevice>>> {
        self.inner.store.subscribe_discovered()
    }

    pub fn health(&self) -> ViewStream<HealthView> {
        self.inner.store.subscribe_health()
    }

    pub fn activity(&self) -> ViewStream<Arc<Vec<ActivityEntry>>> {
        self.inner.store.subscribe_activity()
    }

    pub fn usage(&self) -> ViewStream<Arc<UsageReport>> {
        self.inner.store.subscribe_usage()
    }

    pub fn connection_state(&self) -> ViewStream<ConnectionState> {
        self.inner.store.subscribe_connection()
    }
}

// ── Session task ─────────────────────────────────────────────────

type Responder = oneshot::Sender<Result<CommandResult, CoreError>>;

enum Waiter {
    Refresh(Responder),
    /// Answered `Saved` once the post-save reload has run.
    Save(Responder),
}

#[derive(Default)]
struct PendingRefresh {
    force: bool,
    waiters: Vec<Waiter>,
}

struct InFlight {
    pending: PendingRefresh,
    fetch: BoxFuture<'static, RefreshData>,
    /// Fetched before a save was confirmed; its snapshot predates the save.
    superseded: bool,
}

struct SessionTask {
    client: Arc<UbusClient>,
    session: Session,
    store: Arc<ViewStore>,
    commands: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
    ticker: Option<Interval>,
    log_limit: u32,
    in_flight: Option<InFlight>,
    queued: Option<PendingRefresh>,
}

impl SessionTask {
    async fn run(mut self) {
        if self.ticker.is_some() {
            self.start_refresh(PendingRefresh::default());
        }

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                data = settle(&mut self.in_flight) => self.finish_refresh(data),
                envelope = self.commands.recv() => {
                    let Some(envelope) = envelope else { break };
                    self.handle(envelope).await;
                }
                () = next_tick(&mut self.ticker) => self.on_tick(),
            }
        }
        debug!("session task stopped");
    }

    // ── Refresh scheduling ───────────────────────────────────────

    fn on_tick(&mut self) {
        if self.in_flight.is_some() {
            debug!("refresh still in flight; skipping tick");
            return;
        }
        self.start_refresh(PendingRefresh::default());
    }

    fn request_refresh(&mut self, force: bool, waiter: Waiter) {
        if self.in_flight.is_none() {
            self.start_refresh(PendingRefresh {
                force,
                waiters: vec![waiter],
            });
            return;
        }
        let queued = self.queued.get_or_insert_with(PendingRefresh::default);
        queued.force |= force;
        queued.waiters.push(waiter);
        debug!(force = queued.force, "refresh in flight; queued follow-up");
    }

    fn start_refresh(&mut self, pending: PendingRefresh) {
        debug!(force = pending.force, "refresh started");
        self.in_flight = Some(InFlight {
            pending,
            fetch: fetch(Arc::clone(&self.client), self.log_limit),
            superseded: false,
        });
    }

    fn finish_refresh(&mut self, data: RefreshData) {
        let Some(done) = self.in_flight.take() else {
            return;
        };

        if done.superseded {
            debug!("discarding refresh fetched before the last save");
            self.queued
                .get_or_insert_with(PendingRefresh::default)
                .waiters
                .extend(done.pending.waiters);
        } else {
            let overview_error = data.overview.as_ref().err().cloned();
            let report = self.session.commit(data, done.pending.force, Utc::now());
            self.store.publish(&self.session);
            debug!(
                form_replaced = report.form_replaced,
                overview_ok = report.overview_ok,
                state = %self.session.state(),
                "refresh committed"
            );

            for waiter in done.pending.waiters {
                let (tx, result) = match waiter {
                    Waiter::Refresh(tx) => (
                        tx,
                        overview_error.clone().map_or(
                            Ok(CommandResult::Refreshed {
                                form_replaced: report.form_replaced,
                            }),
                            Err,
                        ),
                    ),
                    Waiter::Save(tx) => (tx, Ok(CommandResult::Saved)),
                };
                let _ = tx.send(result);
            }
        }

        if let Some(next) = self.queued.take() {
            self.start_refresh(next);
        }
    }

    // ── Command routing ──────────────────────────────────────────

    async fn handle(&mut self, envelope: CommandEnvelope) {
        let CommandEnvelope {
            command,
            response_tx,
        } = envelope;

        let result = match command {
            Command::Refresh { force } => {
                self.request_refresh(force, Waiter::Refresh(response_tx));
                return;
            }
            Command::Save => {
                self.save(response_tx).await;
                return;
            }
            Command::Edit(edit) => {
                let result = self.session.edit(edit);
                self.store.publish(&self.session);
                result
            }
            Command::PauseClient { mac, minutes } => {
                self.client_action(&mac, ClientAction::Pause { minutes }).await
            }
            Command::BlockClient { mac } => self.client_action(&mac, ClientAction::Block).await,
            Command::UnblockClient { mac } => self.client_action(&mac, ClientAction::Unblock).await,
            Command::PauseGroup { group, minutes } => {
                self.group_action(&group, ClientAction::Pause { minutes }).await
            }
            Command::BlockGroup { group } => self.group_action(&group, ClientAction::Block).await,
            Command::UnblockGroup { group } => {
                self.group_action(&group, ClientAction::Unblock).await
            }
            Command::SyncExternalFilter => {
                router_action("sync_external_filter", self.client.sync_external_filter().await)
            }
            Command::ApplyRules => router_action("apply_rules", self.client.apply_rules().await),
        };
        let _ = response_tx.send(result);
    }

    async fn save(&mut self, tx: Responder) {
        let payload = self.session.save_payload();
        match self.client.save_config(&payload).await {
            Ok(ack) if ack.confirmed() => {
                info!(
                    groups = payload.groups.len(),
                    clients = payload.clients.len(),
                    "configuration saved"
                );
                self.session.mark_saved();
                self.store.publish(&self.session);
                if let Some(in_flight) = self.in_flight.as_mut() {
                    in_flight.superseded = true;
                }
                self.request_refresh(true, Waiter::Save(tx));
            }
            Ok(ack) => {
                let message = ack.failure_message();
                warn!(%message, "save rejected; edits kept");
                let _ = tx.send(Err(CoreError::SaveRejected { message }));
            }
            Err(e) => {
                warn!(error = %e, "save failed; edits kept");
                let _ = tx.send(Err(e.into()));
            }
        }
    }

    async fn client_action(
        &mut self,
        mac: &MacAddress,
        action: ClientAction,
    ) -> Result<CommandResult, CoreError> {
        action.validate()?;
        action.run(&self.client, mac).await?;
        info!(mac = %mac, action = action.name(), "client action applied");
        Ok(CommandResult::Ok)
    }

    /// Run `action` for every client effectively in `group`, concurrently.
    /// Each call settles on its own; failures are reported per client.
    async fn group_action(
        &mut self,
        group: &str,
        action: ClientAction,
    ) -> Result<CommandResult, CoreError> {
        action.validate()?;
        let form = self.session.form();
        if form.group(group).is_none() {
            return Err(CoreError::GroupNotFound {
                id: group.to_owned(),
            });
        }
        let members: Vec<MacAddress> = form.clients_in_group(group).map(|c| c.mac.clone()).collect();

        let client = &self.client;
        let outcomes: Vec<ActionOutcome> = join_all(members.into_iter().map(|mac| async move {
            let error = action.run(client, &mac).await.err().map(|e| e.to_string());
            ActionOutcome { mac, error }
        }))
        .await;

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if failed > 0 {
            warn!(group, action = action.name(), failed, total = outcomes.len(), "group action partially failed");
        } else {
            info!(group, action = action.name(), total = outcomes.len(), "group action applied");
        }
        Ok(CommandResult::Batch(outcomes))
    }
}

// ── Remote actions ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum ClientAction {
    Pause { minutes: u32 },
    Block,
    Unblock,
}

impl ClientAction {
    fn name(self) -> &'static str {
        match self {
            Self::Pause { .. } => "pause_client",
            Self::Block => "block_client",
            Self::Unblock => "unblock_client",
        }
    }

    fn validate(self) -> Result<(), CoreError> {
        if let Self::Pause { minutes: 0 } = self {
            return Err(CoreError::ValidationFailed {
                message: "pause duration must be at least one minute".into(),
            });
        }
        Ok(())
    }

    async fn run(self, client: &UbusClient, mac: &MacAddress) -> Result<(), CoreError> {
        let ack = match self {
            Self::Pause { minutes } => client.pause_client(mac.as_str(), minutes).await?,
            Self::Block => client.block_client(mac.as_str()).await?,
            Self::Unblock => client.unblock_client(mac.as_str()).await?,
        };
        check_ack(self.name(), &ack)
    }
}

fn check_ack(action: &str, ack: &ActionAck) -> Result<(), CoreError> {
    if ack.is_success() {
        Ok(())
    } else {
        Err(CoreError::ActionRejected {
            action: action.to_owned(),
            message: ack.failure_message(),
        })
    }
}

fn router_action(
    action: &str,
    reply: Result<ActionAck, parental_api::Error>,
) -> Result<CommandResult, CoreError> {
    check_ack(action, &reply?)?;
    info!(action, "router action applied");
    Ok(CommandResult::Ok)
}

// ── Helpers ──────────────────────────────────────────────────────

/// Fetch overview, health and activity concurrently; all three settle
/// before the result is returned.
fn fetch(client: Arc<UbusClient>, log_limit: u32) -> BoxFuture<'static, RefreshData> {
    Box::pin(async move {
        let (overview, health, activity) = tokio::join!(
            client.get_overview(),
            client.health(),
            client.activity_log(log_limit),
        );
        RefreshData {
            overview: overview.map_err(CoreError::from),
            health: health.map(HealthStatus::from).map_err(CoreError::from),
            activity: activity
                .map(|log| log.entries.into_iter().map(ActivityEntry::from).collect())
                .map_err(CoreError::from),
        }
    })
}

/// Resolves when the in-flight refresh completes; never, if there is none.
async fn settle(in_flight: &mut Option<InFlight>) -> RefreshData {
    match in_flight {
        Some(in_flight) => (&mut in_flight.fetch).await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Timer for periodic refreshes. The first tick fires one period from now;
/// the startup refresh is issued separately.
fn ticker(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>(_: &T) {}

    // Compile-time check: `start` hands this future to `tokio::spawn`.
    #[allow(dead_code)]
    fn session_task_future(task: SessionTask) {
        let run = task.run();
        assert_send(&run);
    }

    #[test]
    fn zero_period_has_no_ticker() {
        assert!(ticker(Duration::ZERO).is_none());
    }

    #[tokio::test]
    async fn nonzero_period_ticks() {
        assert!(ticker(Duration::from_secs(30)).is_some());
    }

    #[test]
    fn zero_minute_pause_is_rejected_before_any_call() {
        assert!(ClientAction::Pause { minutes: 0 }.validate().is_err());
        assert!(ClientAction::Pause { minutes: 1 }.validate().is_ok());
        assert_eq!(ClientAction::Block.name(), "block_client");
    }
}
