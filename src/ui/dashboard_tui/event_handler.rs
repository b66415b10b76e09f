use crossterm::event::KeyCode;

/// Events that can occur in the dashboard TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardEvent {
    /// Quit the application
    Quit,
    /// Toggle help overlay
    ToggleHelp,
    Connect,
    Disconnect,
    /// Send BUKA
    OpenLid,
    /// Send TUTUP
    CloseLid,
    /// Request a full report
    RequestStatus,
    AcknowledgeAlert,
    ToggleAutoRefresh,
    ClearLogs,
    /// Cycle the history panel between samples, weeks and months
    NextHistoryView,
    /// Scroll the log pane towards older entries
    ScrollUp,
    /// Scroll the log pane towards newer entries
    ScrollDown,
    /// No action
    None,
}

/// Keyboard mapping of the dashboard
pub fn map_key(code: KeyCode) -> DashboardEvent {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => DashboardEvent::Quit,
        KeyCode::Char('?') | KeyCode::Char('h') => DashboardEvent::ToggleHelp,
        KeyCode::Char('c') => DashboardEvent::Connect,
        KeyCode::Char('d') => DashboardEvent::Disconnect,
        KeyCode::Char('o') => DashboardEvent::OpenLid,
        KeyCode::Char('t') => DashboardEvent::CloseLid,
        KeyCode::Char('s') => DashboardEvent::RequestStatus,
        KeyCode::Char('a') => DashboardEvent::AcknowledgeAlert,
        KeyCode::Char('r') => DashboardEvent::ToggleAutoRefresh,
        KeyCode::Char('l') => DashboardEvent::ClearLogs,
        KeyCode::Tab => DashboardEvent::NextHistoryView,
        KeyCode::Up | KeyCode::Char('k') => DashboardEvent::ScrollUp,
        KeyCode::Down | KeyCode::Char('j') => DashboardEvent::ScrollDown,
        _ => DashboardEvent::None,
    }
}
