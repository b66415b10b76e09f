use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::core::bin_monitor::{DashboardSnapshot, MonitorRuntime, RuntimeCommand};
use crate::core::protocol::DeviceCommand;

use super::event_handler::{map_key, DashboardEvent};
use super::render::render_ui;

/// Which aggregation the history panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryView {
    #[default]
    Samples,
    Weekly,
    Monthly,
}

impl HistoryView {
    pub fn next(self) -> Self {
        match self {
            HistoryView::Samples => HistoryView::Weekly,
            HistoryView::Weekly => HistoryView::Monthly,
            HistoryView::Monthly => HistoryView::Samples,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            HistoryView::Samples => "Recent samples",
            HistoryView::Weekly => "Weekly average",
            HistoryView::Monthly => "Monthly average",
        }
    }
}

/// Dashboard application state
pub struct DashboardApp {
    pub snapshot: Arc<DashboardSnapshot>,
    pub should_quit: bool,
    pub show_help: bool,
    pub history_view: HistoryView,
    /// Entries scrolled back from the newest log line
    pub log_offset: usize,
    port: Option<String>,
    baud: Option<u32>,
}

impl DashboardApp {
    pub fn new(snapshot: Arc<DashboardSnapshot>, port: Option<String>, baud: Option<u32>) -> Self {
        Self {
            snapshot,
            should_quit: false,
            show_help: false,
            history_view: HistoryView::default(),
            log_offset: 0,
            port,
            baud,
        }
    }

    /// Replace the displayed snapshot
    pub fn update_snapshot(&mut self, snapshot: Arc<DashboardSnapshot>) {
        if self.snapshot.settings.auto_scroll_logs {
            self.log_offset = 0;
        } else {
            // Keep the same entries on screen as new lines arrive
            let added = snapshot
                .logs
                .last()
                .zip(self.snapshot.logs.last())
                .map(|(new, old)| new.id.saturating_sub(old.id) as usize)
                .unwrap_or(0);
            if self.log_offset > 0 {
                self.log_offset += added;
            }
        }
        self.snapshot = snapshot;
        self.log_offset = self.log_offset.min(self.snapshot.logs.len().saturating_sub(1));
    }

    /// Apply a UI event; returns the request for the runtime, if any
    pub fn handle_event(&mut self, event: DashboardEvent) -> Option<RuntimeCommand> {
        if self.show_help && event != DashboardEvent::None {
            self.show_help = false;
            if event != DashboardEvent::Quit {
                return None;
            }
        }

        match event {
            DashboardEvent::Quit => {
                self.should_quit = true;
                None
            }
            DashboardEvent::ToggleHelp => {
                self.show_help = !self.show_help;
                None
            }
            DashboardEvent::Connect => Some(RuntimeCommand::Connect {
                port: self.port.clone(),
                baud: self.baud,
            }),
            DashboardEvent::Disconnect => Some(RuntimeCommand::Disconnect),
            DashboardEvent::OpenLid => Some(RuntimeCommand::Send(DeviceCommand::Open)),
            DashboardEvent::CloseLid => Some(RuntimeCommand::Send(DeviceCommand::Close)),
            DashboardEvent::RequestStatus => Some(RuntimeCommand::Send(DeviceCommand::Status)),
            DashboardEvent::AcknowledgeAlert => Some(RuntimeCommand::AcknowledgeAlert),
            DashboardEvent::ToggleAutoRefresh => Some(RuntimeCommand::SetAutoRefresh(
                !self.snapshot.settings.auto_refresh,
            )),
            DashboardEvent::ClearLogs => {
                self.log_offset = 0;
                Some(RuntimeCommand::ClearLogs)
            }
            DashboardEvent::NextHistoryView => {
                self.history_view = self.history_view.next();
                None
            }
            DashboardEvent::ScrollUp => {
                let max_offset = self.snapshot.logs.len().saturating_sub(1);
                if self.log_offset < max_offset {
                    self.log_offset += 1;
                }
                None
            }
            DashboardEvent::ScrollDown => {
                self.log_offset = self.log_offset.saturating_sub(1);
                None
            }
            DashboardEvent::None => None,
        }
    }
}

/// Configuration for the dashboard app
#[derive(Debug, Clone)]
pub struct DashboardAppConfig {
    /// Redraw interval
    pub tick_ms: u64,
    /// Port to use for connections, `None` for the configured/auto-selected one
    pub port: Option<String>,
    /// Baud rate override for this session
    pub baud: Option<u32>,
    /// Connect as soon as the dashboard opens
    pub connect_on_start: bool,
}

impl Default for DashboardAppConfig {
    fn default() -> Self {
        Self {
            tick_ms: 250,
            port: None,
            baud: None,
            connect_on_start: true,
        }
    }
}

/// Run the dashboard TUI against a running monitor runtime
pub fn run_dashboard_app(runtime: &MonitorRuntime, config: DashboardAppConfig) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = run_loop(&mut terminal, runtime, config);

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &MonitorRuntime,
    config: DashboardAppConfig,
) -> Result<()> {
    let mut app = DashboardApp::new(runtime.snapshot(), config.port.clone(), config.baud);
    let tick_rate = Duration::from_millis(config.tick_ms);

    if config.connect_on_start {
        runtime.command(RuntimeCommand::Connect {
            port: config.port,
            baud: config.baud,
        })?;
    }

    let mut snapshot_rx = runtime.snapshot_rx.clone();

    // Main loop
    loop {
        if snapshot_rx.has_changed().unwrap_or(false) {
            let snapshot = snapshot_rx.borrow_and_update().clone();
            app.update_snapshot(snapshot);
        }

        // Draw UI
        terminal.draw(|frame| render_ui(frame, &app))?;

        if event::poll(tick_rate).context("Event poll failed")? {
            if let Event::Key(key) = event::read().context("Event read failed")? {
                if key.kind == KeyEventKind::Press {
                    if let Some(command) = app.handle_event(map_key(key.code)) {
                        runtime.command(command)?;
                    }
                }
            }
        }

        // Check if should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
