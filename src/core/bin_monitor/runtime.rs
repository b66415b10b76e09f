//! Tokio runtime and orchestrator for the bin monitor.
//!
//! One orchestrator task owns the [`StateStore`] and the
//! [`TransportSession`]. Link events, user commands and timers all funnel
//! into it, so chunks are applied strictly one after another. Readers get
//! immutable snapshots through a `watch` channel, which also coalesces
//! bursts: a slow reader only ever sees the latest snapshot.

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep_until, Duration, Instant, MissedTickBehavior};

use super::alerts::{evaluate_alerts, Alert, AlertCategory, AlertMonitor, AlertSeverity};
use super::history::{Bucket, HistorySample};
use super::logbook::{LogEntry, LogKind};
use super::persistence::save_store;
use super::state::DeviceState;
use super::store::{StateStore, Transition};
use crate::core::config::Settings;
use crate::core::protocol::{DeviceCommand, DeviceEvent, LineAssembler};
use crate::core::storage::BlobStore;
use crate::core::transport::{ConnectionState, LinkEvent, PortProvider, TransportSession};
use crate::error::{Result, SmartBinError, TransportError};

/// Link events buffered between the reader and the orchestrator
const LINK_CHANNEL_CAPACITY: usize = 1;
const ALERT_CHECK_INTERVAL: Duration = Duration::from_secs(10);
const FLUSH_INTERVAL: Duration = Duration::from_secs(30);
/// Log entries carried in each snapshot
const SNAPSHOT_LOG_LIMIT: usize = 200;
/// Raw samples carried in each snapshot
const SNAPSHOT_SAMPLE_LIMIT: usize = 120;

/// Requests accepted by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCommand {
    /// Connect to the given port, or the configured/auto-selected one.
    /// `baud` overrides the configured rate for this connection only.
    Connect {
        port: Option<String>,
        baud: Option<u32>,
    },
    Disconnect,
    Send(DeviceCommand),
    AcknowledgeAlert,
    SetAutoRefresh(bool),
    ClearLogs,
}

/// Summary of one history bucket, without its timestamps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary {
    pub key: String,
    pub average: f64,
    pub max: u8,
    pub min: u8,
    pub count: u64,
}

impl BucketSummary {
    pub fn from_bucket(key: &str, bucket: &Bucket) -> Self {
        Self {
            key: key.to_string(),
            average: bucket.average(),
            max: bucket.max,
            min: bucket.min,
            count: bucket.count,
        }
    }
}

/// Everything a presentation layer needs, as of one moment
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub state: DeviceState,
    pub connection: ConnectionState,
    pub port_name: Option<String>,
    pub connected_since: Option<DateTime<Local>>,
    pub settings: Settings,
    pub logs: Vec<LogEntry>,
    pub samples: Vec<HistorySample>,
    pub weekly: Vec<BucketSummary>,
    pub monthly: Vec<BucketSummary>,
    pub alerts: Vec<Alert>,
    pub alert_acknowledged: bool,
    pub taken_at: DateTime<Local>,
}

impl DashboardSnapshot {
    fn capture(
        store: &StateStore,
        session: &TransportSession,
        alerts: &AlertMonitor,
        now: DateTime<Local>,
    ) -> Self {
        let history = store.history();
        let daily = history.daily();
        let samples_from = daily.len().saturating_sub(SNAPSHOT_SAMPLE_LIMIT);

        Self {
            state: store.snapshot(),
            connection: session.state(),
            port_name: session.port_name().map(str::to_string),
            connected_since: session.connected_since(),
            settings: store.settings().clone(),
            logs: store.logs().recent(SNAPSHOT_LOG_LIMIT),
            samples: daily[samples_from..].to_vec(),
            weekly: history
                .weekly()
                .iter()
                .map(|(k, b)| BucketSummary::from_bucket(k, b))
                .collect(),
            monthly: history
                .monthly()
                .iter()
                .map(|(k, b)| BucketSummary::from_bucket(k, b))
                .collect(),
            alerts: evaluate_alerts(store.state(), store.settings(), now),
            alert_acknowledged: alerts.is_acknowledged(),
            taken_at: now,
        }
    }

    /// Alerts still waiting for the user; an acknowledged capacity alert is hidden
    pub fn banner_alerts(&self) -> Vec<&Alert> {
        self.alerts
            .iter()
            .filter(|a| !(self.alert_acknowledged && a.category == AlertCategory::Capacity))
            .collect()
    }
}

/// The task that owns state and connection
pub struct Orchestrator {
    store: StateStore,
    session: TransportSession,
    assembler: LineAssembler,
    alerts: AlertMonitor,
    provider: Arc<dyn PortProvider>,
    blobs: Arc<dyn BlobStore>,
    snapshot_tx: watch::Sender<Arc<DashboardSnapshot>>,
    last_port: Option<String>,
    last_baud: Option<u32>,
    reconnect_at: Option<Instant>,
    reconnect_attempted: bool,
    dirty: bool,
}

/// Channels for talking to a spawned orchestrator
pub struct OrchestratorHandles {
    pub snapshot_rx: watch::Receiver<Arc<DashboardSnapshot>>,
    pub command_tx: mpsc::UnboundedSender<RuntimeCommand>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub task: JoinHandle<()>,
}

/// Spawn the orchestrator on the current tokio runtime
pub fn spawn_orchestrator(
    store: StateStore,
    blobs: Arc<dyn BlobStore>,
    provider: Arc<dyn PortProvider>,
) -> OrchestratorHandles {
    let (link_tx, link_rx) = mpsc::channel::<LinkEvent>(LINK_CHANNEL_CAPACITY);
    let (command_tx, command_rx) = mpsc::unbounded_channel::<RuntimeCommand>();
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    let session = TransportSession::new(link_tx);
    let alerts = AlertMonitor::new();
    let initial = DashboardSnapshot::capture(&store, &session, &alerts, Local::now());
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(initial));

    let orchestrator = Orchestrator {
        store,
        session,
        assembler: LineAssembler::new(),
        alerts,
        provider,
        blobs,
        snapshot_tx,
        last_port: None,
        last_baud: None,
        reconnect_at: None,
        reconnect_attempted: false,
        dirty: false,
    };

    let task = tokio::spawn(orchestrator.run(command_rx, link_rx, shutdown_rx));

    OrchestratorHandles {
        snapshot_rx,
        command_tx,
        shutdown_tx,
        task,
    }
}

impl Orchestrator {
    async fn run(
        mut self,
        mut command_rx: mpsc::UnboundedReceiver<RuntimeCommand>,
        mut link_rx: mpsc::Receiver<LinkEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        log::info!("Monitor orchestrator started");

        let poll_every = Duration::from_millis(self.store.settings().auto_refresh_interval);
        let mut poll = interval(poll_every);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut alert_check = interval(ALERT_CHECK_INTERVAL);
        alert_check.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut flush = interval(FLUSH_INTERVAL);
        flush.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let reconnect_deadline = self.reconnect_at.unwrap_or_else(Instant::now);

            tokio::select! {
                command = command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }
                Some(event) = link_rx.recv() => {
                    self.handle_link_event(event);
                }
                _ = poll.tick() => {
                    if self.store.settings().auto_refresh && self.session.is_connected() {
                        self.send_command(DeviceCommand::Status);
                    }
                }
                _ = alert_check.tick() => {
                    self.check_alerts();
                    // Keeps the "since last update" age and stale-data notices fresh
                    self.publish();
                }
                _ = flush.tick() => {
                    self.flush();
                }
                _ = sleep_until(reconnect_deadline), if self.reconnect_at.is_some() => {
                    self.reconnect_at = None;
                    self.reconnect();
                }
                _ = shutdown.recv() => {
                    break;
                }
            }
        }

        self.shut_down();
    }

    fn handle_command(&mut self, command: RuntimeCommand) {
        match command {
            RuntimeCommand::Connect { port, baud } => {
                self.reconnect_at = None;
                self.reconnect_attempted = false;
                self.connect(port, baud);
            }
            RuntimeCommand::Disconnect => {
                self.reconnect_at = None;
                self.drain_assembler();
                if self.session.disconnect() {
                    self.log(LogKind::Info, "Disconnected", None);
                }
            }
            RuntimeCommand::Send(command) => self.send_command(command),
            RuntimeCommand::AcknowledgeAlert => {
                self.alerts.acknowledge();
                self.log(LogKind::Info, "Alert acknowledged", None);
            }
            RuntimeCommand::SetAutoRefresh(enabled) => {
                self.store.settings_mut().auto_refresh = enabled;
                self.dirty = true;
                let state = if enabled { "enabled" } else { "disabled" };
                self.log(LogKind::Info, format!("Auto refresh {}", state), None);
            }
            RuntimeCommand::ClearLogs => {
                self.store.clear_logs();
                self.dirty = true;
            }
        }
        self.publish();
    }

    fn connect(&mut self, port: Option<String>, baud: Option<u32>) {
        let port = port.or_else(|| self.store.settings().port_path.clone());
        let port = match port {
            Some(port) => port,
            None => match self.provider.auto_select() {
                Ok(port) => port,
                Err(e) => {
                    self.report_transport_error(&e);
                    return;
                }
            },
        };

        let baud = baud.unwrap_or(self.store.settings().connection_baud);
        self.assembler = LineAssembler::new();
        match self.session.connect(self.provider.as_ref(), &port, baud) {
            Ok(()) => {
                self.log(
                    LogKind::Success,
                    format!("Connected to {} at {} baud", port, baud),
                    Some(json!({ "port": port, "baud": baud })),
                );
                self.last_port = Some(port);
                self.last_baud = Some(baud);
                // Ask for a full report right away
                self.send_command(DeviceCommand::Status);
            }
            Err(e) => self.report_transport_error(&e),
        }
    }

    fn reconnect(&mut self) {
        if self.session.is_connected() {
            return;
        }
        self.log(LogKind::Info, "Attempting to reconnect", None);
        self.connect(self.last_port.clone(), self.last_baud);
        self.publish();
    }

    fn send_command(&mut self, command: DeviceCommand) {
        match self.session.send(command.wire()) {
            Ok(()) => self.log(
                LogKind::Info,
                format!("Sent {}", command),
                Some(json!({ "command": command.wire() })),
            ),
            Err(e) => self.report_transport_error(&e),
        }
    }

    fn handle_link_event(&mut self, event: LinkEvent) {
        if !self.session.is_current(&event) {
            log::debug!("Ignoring event from stale session {}", event.generation());
            return;
        }

        match event {
            LinkEvent::Chunk { text, .. } => {
                let events = self.assembler.push(&text);
                self.apply(&events);
            }
            LinkEvent::Closed { .. } => {
                self.drain_assembler();
                self.session.disconnect();
                self.log(LogKind::Warning, "Device closed the connection", None);
            }
            LinkEvent::Failed { error, .. } => {
                self.drain_assembler();
                self.session.disconnect();
                let error = TransportError::Read(error);
                self.report_transport_error(&error);
                self.schedule_reconnect(&error);
            }
        }
        self.publish();
    }

    fn apply(&mut self, events: &[DeviceEvent]) {
        if events.is_empty() {
            return;
        }

        let outcome = self.store.apply_batch(events, Local::now());
        if outcome.is_empty() {
            return;
        }
        self.dirty = true;

        if let Some(Transition::Opened) = outcome.transition {
            log::info!("Lid opened, total usage {}", self.store.state().total_usage);
        }
        if outcome.changed_state() {
            self.check_alerts();
        }
    }

    fn drain_assembler(&mut self) {
        let events = self.assembler.flush();
        self.apply(&events);
    }

    fn schedule_reconnect(&mut self, error: &TransportError) {
        let settings = self.store.settings();
        if !settings.auto_reconnect || !error.is_retryable() || self.reconnect_attempted {
            return;
        }

        let delay = Duration::from_millis(settings.reconnect_delay_ms);
        self.reconnect_attempted = true;
        self.reconnect_at = Some(Instant::now() + delay);
        self.log(
            LogKind::Info,
            format!("Reconnecting in {:.1}s", delay.as_secs_f32()),
            None,
        );
    }

    fn check_alerts(&mut self) {
        let now = Local::now();
        if let Some(alert) = self
            .alerts
            .check(self.store.state(), self.store.settings(), now)
        {
            let kind = match alert.severity {
                AlertSeverity::Critical => LogKind::Error,
                AlertSeverity::Warning => LogKind::Warning,
                AlertSeverity::Info => LogKind::Info,
            };
            log::warn!("{}", alert.message);
            self.log(kind, alert.message, Some(json!({ "capacity": alert.value })));
        }
    }

    fn report_transport_error(&mut self, error: &TransportError) {
        match error {
            TransportError::NotConnected => log::warn!("{}", error),
            _ => log::error!("{}", error),
        }
        let kind = match error {
            TransportError::NotConnected => LogKind::Warning,
            _ => LogKind::Error,
        };
        self.log(kind, error.to_string(), None);
    }

    fn log(&mut self, kind: LogKind, message: impl Into<String>, payload: Option<serde_json::Value>) {
        self.store.log(kind, message, payload, Local::now());
        self.dirty = true;
    }

    fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        if save_store(self.blobs.as_ref(), &self.store) {
            self.dirty = false;
        }
    }

    fn publish(&self) {
        let snapshot =
            DashboardSnapshot::capture(&self.store, &self.session, &self.alerts, Local::now());
        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }

    fn shut_down(&mut self) {
        log::info!("Monitor orchestrator shutting down");
        self.drain_assembler();
        self.session.disconnect();
        self.dirty = true;
        self.flush();
        self.publish();
    }
}

/// Wrapper around a dedicated tokio runtime, for synchronous callers such
/// as the TUI loop
pub struct MonitorRuntime {
    /// Receiver for dashboard snapshots
    pub snapshot_rx: watch::Receiver<Arc<DashboardSnapshot>>,

    command_tx: mpsc::UnboundedSender<RuntimeCommand>,

    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,

    task: Option<JoinHandle<()>>,

    runtime: tokio::runtime::Runtime,
}

impl MonitorRuntime {
    /// Build the runtime and spawn the orchestrator
    pub fn start(
        store: StateStore,
        blobs: Arc<dyn BlobStore>,
        provider: Arc<dyn PortProvider>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .thread_name("smartbin-worker")
            .build()?;

        let handles = runtime.block_on(async move { spawn_orchestrator(store, blobs, provider) });

        Ok(Self {
            snapshot_rx: handles.snapshot_rx,
            command_tx: handles.command_tx,
            shutdown_tx: handles.shutdown_tx,
            task: Some(handles.task),
            runtime,
        })
    }

    pub fn command(&self, command: RuntimeCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| SmartBinError::runtime("Monitor orchestrator is not running"))
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Block until `done` accepts a published snapshot or `limit` elapses,
    /// then return the latest snapshot
    pub fn wait_until<F>(&self, limit: Duration, mut done: F) -> Arc<DashboardSnapshot>
    where
        F: FnMut(&DashboardSnapshot) -> bool,
    {
        let mut rx = self.snapshot_rx.clone();
        self.runtime.block_on(async move {
            let watch_snapshots = async {
                loop {
                    let snapshot = rx.borrow_and_update().clone();
                    if done(&snapshot) || rx.changed().await.is_err() {
                        return;
                    }
                }
            };
            if tokio::time::timeout(limit, watch_snapshots).await.is_err() {
                log::debug!("Stopped waiting for the monitor after {:?}", limit);
            }
        });
        self.snapshot()
    }

    /// Stop the orchestrator, waiting for its final flush
    pub fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(task) = self.task.take() {
            if let Err(e) = self.runtime.block_on(task) {
                log::error!("Monitor orchestrator ended abnormally: {}", e);
            }
        }
        self.runtime.shutdown_timeout(Duration::from_secs(1));
    }
}
