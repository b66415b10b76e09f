use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

use super::support::{MockLink, MockProvider, ReadStep};
use smartbin::core::bin_monitor::{
    load_store, spawn_orchestrator, DashboardSnapshot, LogKind, MonitorRuntime,
    OrchestratorHandles, RuntimeCommand, StateStore,
};
use smartbin::core::config::Settings;
use smartbin::core::protocol::DeviceCommand;
use smartbin::core::storage::{BlobStore, MemoryBlobStore, KEY_DB};
use smartbin::core::transport::ConnectionState;

const WAIT: Duration = Duration::from_secs(3);

async fn wait_for<F>(
    rx: &mut watch::Receiver<Arc<DashboardSnapshot>>,
    pred: F,
) -> Arc<DashboardSnapshot>
where
    F: Fn(&DashboardSnapshot) -> bool,
{
    timeout(WAIT, async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if pred(&snapshot) {
                return snapshot;
            }
            rx.changed().await.expect("orchestrator stopped");
        }
    })
    .await
    .expect("condition not reached in time")
}

struct Harness {
    link: MockLink,
    provider: Arc<MockProvider>,
    blobs: Arc<MemoryBlobStore>,
    handles: OrchestratorHandles,
}

impl Harness {
    fn start(settings: Settings) -> Self {
        let link = MockLink::new();
        let provider = Arc::new(MockProvider::new(link.clone()));
        let blobs = Arc::new(MemoryBlobStore::new());
        let handles = spawn_orchestrator(StateStore::new(settings), blobs.clone(), provider.clone());
        Self {
            link,
            provider,
            blobs,
            handles,
        }
    }

    fn command(&self, command: RuntimeCommand) {
        self.handles.command_tx.send(command).unwrap();
    }

    async fn connect(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        let mut rx = self.handles.snapshot_rx.clone();
        self.command(RuntimeCommand::Connect {
            port: Some("/dev/mock0".to_string()),
            baud: None,
        });
        wait_for(&mut rx, |s| s.connection == ConnectionState::Connected).await;
        rx
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connect_requests_status_and_applies_reports() {
    let harness = Harness::start(Settings::default());
    let mut rx = harness.connect().await;

    assert!(harness.link.written().starts_with("STATUS\n"));

    harness.link.push_text("BUKA,45,");
    harness.link.push_text("27,3,120\n");
    let snapshot = wait_for(&mut rx, |s| s.state.capacity == 45).await;

    assert!(snapshot.state.status.is_open());
    assert_eq!(snapshot.state.daily_usage, 4);
    assert_eq!(snapshot.state.total_usage, 121);
    assert_eq!(snapshot.samples.len(), 1);
    assert_eq!(snapshot.port_name.as_deref(), Some("/dev/mock0"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_commands_are_written_to_the_device() {
    let harness = Harness::start(Settings::default());
    let mut rx = harness.connect().await;

    harness.command(RuntimeCommand::Send(DeviceCommand::Open));
    harness.command(RuntimeCommand::Send(DeviceCommand::Close));
    wait_for(&mut rx, |s| s.logs.iter().any(|e| e.message == "Sent TUTUP")).await;

    assert_eq!(harness.link.written(), "STATUS\nBUKA\nTUTUP\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_send_while_disconnected_logs_a_warning() {
    let harness = Harness::start(Settings::default());
    let mut rx = harness.handles.snapshot_rx.clone();

    harness.command(RuntimeCommand::Send(DeviceCommand::Status));
    let snapshot = wait_for(&mut rx, |s| {
        s.logs.iter().any(|e| e.kind == LogKind::Warning)
    })
    .await;

    assert_eq!(snapshot.connection, ConnectionState::Disconnected);
    assert_eq!(harness.provider.open_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_read_failure_reconnects_once() {
    let settings = Settings {
        reconnect_delay_ms: 50,
        ..Settings::default()
    };
    let harness = Harness::start(settings);
    let mut rx = harness.connect().await;

    harness.link.push(ReadStep::Fail(io::ErrorKind::BrokenPipe));
    wait_for(&mut rx, |s| {
        s.connection == ConnectionState::Connected
            && s.logs.iter().any(|e| e.message == "Attempting to reconnect")
    })
    .await;
    assert_eq!(harness.provider.open_count(), 2);

    // A second failure without a user connect in between is not retried
    harness.link.push(ReadStep::Fail(io::ErrorKind::BrokenPipe));
    wait_for(&mut rx, |s| s.connection == ConnectionState::Disconnected).await;
    sleep(Duration::from_millis(300)).await;

    assert_eq!(harness.provider.open_count(), 2);
    assert_eq!(
        harness.handles.snapshot_rx.borrow().connection,
        ConnectionState::Disconnected
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_end_of_stream_is_not_retried() {
    let settings = Settings {
        reconnect_delay_ms: 50,
        ..Settings::default()
    };
    let harness = Harness::start(settings);
    let mut rx = harness.connect().await;

    harness.link.push(ReadStep::Eof);
    let snapshot = wait_for(&mut rx, |s| s.connection == ConnectionState::Disconnected).await;
    sleep(Duration::from_millis(200)).await;

    assert!(snapshot
        .logs
        .iter()
        .any(|e| e.kind == LogKind::Warning && e.message.contains("closed")));
    assert_eq!(harness.provider.open_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_auto_refresh_polls_status() {
    let settings = Settings {
        auto_refresh: true,
        auto_refresh_interval: 500,
        ..Settings::default()
    };
    let harness = Harness::start(settings);
    harness.connect().await;

    sleep(Duration::from_millis(1200)).await;

    let polls = harness.link.written().matches("STATUS\n").count();
    assert!(polls >= 2, "expected repeated polls, saw {}", polls);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_flushes_state() {
    let harness = Harness::start(Settings::default());
    let mut rx = harness.connect().await;

    harness.link.push_text("TUTUP,30,35,2,6\n");
    wait_for(&mut rx, |s| s.state.capacity == 30).await;

    let Harness { blobs, handles, .. } = harness;
    handles.shutdown_tx.send(()).unwrap();
    timeout(WAIT, handles.task).await.unwrap().unwrap();

    assert!(blobs.get(KEY_DB).unwrap().is_some());
    let restored = load_store(blobs.as_ref());
    assert_eq!(restored.state().capacity, 30);
    assert_eq!(restored.state().total_usage, 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_capacity_alert_stays_on_banner_until_acknowledged() {
    let harness = Harness::start(Settings::default());
    let mut rx = harness.connect().await;

    harness.link.push_text("TUTUP,90,5,0,0\n");
    let snapshot = wait_for(&mut rx, |s| s.state.capacity == 90).await;

    assert_eq!(snapshot.alerts.len(), 1);
    assert!(!snapshot.alert_acknowledged);
    assert_eq!(snapshot.banner_alerts().len(), 1);
    assert!(snapshot
        .logs
        .iter()
        .any(|e| e.kind == LogKind::Warning && e.message.contains("90")));

    harness.command(RuntimeCommand::AcknowledgeAlert);
    let snapshot = wait_for(&mut rx, |s| s.alert_acknowledged).await;
    assert_eq!(snapshot.alerts.len(), 1);
    assert!(snapshot.banner_alerts().is_empty());

    harness.link.push_text("TUTUP,20,40,0,0\n");
    let snapshot = wait_for(&mut rx, |s| s.state.capacity == 20).await;
    assert!(!snapshot.alert_acknowledged);
    assert!(snapshot.banner_alerts().is_empty());
}

#[test]
fn test_wait_until_returns_once_the_device_answers() {
    let link = MockLink::new();
    let provider = Arc::new(MockProvider::new(link.clone()));
    let blobs = Arc::new(MemoryBlobStore::new());
    let runtime = MonitorRuntime::start(StateStore::new(Settings::default()), blobs, provider)
        .unwrap();

    runtime
        .command(RuntimeCommand::Connect {
            port: Some("/dev/mock0".to_string()),
            baud: None,
        })
        .unwrap();
    runtime
        .command(RuntimeCommand::Send(DeviceCommand::Open))
        .unwrap();
    link.push_text("CMD_RECEIVED:BUKA\n");

    let started = Instant::now();
    let snapshot = runtime.wait_until(Duration::from_secs(5), |s| {
        s.logs.iter().any(|e| e.message == "Device acknowledged BUKA")
    });
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(snapshot.connection, ConnectionState::Connected);

    let started = Instant::now();
    runtime.wait_until(Duration::from_millis(100), |_| false);
    assert!(started.elapsed() >= Duration::from_millis(100));

    runtime.shutdown();
}
