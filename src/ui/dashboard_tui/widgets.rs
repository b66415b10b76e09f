use ratatui::{prelude::*, widgets::Gauge};

use crate::core::bin_monitor::{AlertSeverity, DoorStatus, LogKind};
use crate::core::transport::ConnectionState;

/// Color for a fill level relative to the alert threshold
pub fn capacity_color(capacity: u8, threshold: u8) -> Color {
    match capacity {
        c if c >= 100 => Color::Red,
        c if c >= threshold => Color::LightRed,
        c if c >= threshold / 2 => Color::LightYellow,
        _ => Color::Cyan,
    }
}

/// Create a fill gauge colored by the alert threshold
pub fn colored_gauge<'a>(capacity: u8, threshold: u8, label: &'a str) -> Gauge<'a> {
    let color = capacity_color(capacity, threshold);

    Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio(f64::from(capacity.min(100)) / 100.0)
        .label(label)
}

pub fn status_style(status: DoorStatus) -> Style {
    let color = if status.is_open() {
        Color::LightYellow
    } else {
        Color::Green
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

pub fn connection_style(connection: ConnectionState) -> (&'static str, Color) {
    match connection {
        ConnectionState::Connected => ("● Connected", Color::Green),
        ConnectionState::Connecting => ("◌ Connecting", Color::Yellow),
        ConnectionState::Disconnected => ("○ Disconnected", Color::DarkGray),
    }
}

pub fn log_color(kind: LogKind) -> Color {
    match kind {
        LogKind::Info => Color::Cyan,
        LogKind::Success => Color::Green,
        LogKind::Warning => Color::Yellow,
        LogKind::Error => Color::Red,
        LogKind::Device => Color::White,
    }
}

pub fn alert_style(severity: AlertSeverity) -> (&'static str, Color) {
    match severity {
        AlertSeverity::Critical => ("🔴", Color::Red),
        AlertSeverity::Warning => ("⚠ ", Color::Yellow),
        AlertSeverity::Info => ("🔵", Color::Cyan),
    }
}
