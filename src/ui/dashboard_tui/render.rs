use ratatui::{
    prelude::*,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Sparkline},
};

use super::app::{DashboardApp, HistoryView};
use super::widgets::{
    alert_style, capacity_color, colored_gauge, connection_style, log_color, status_style,
};
use crate::core::bin_monitor::AlertSeverity;
use crate::ui::formatters::{format_clock, format_since};

/// Main render function
pub fn render_ui(frame: &mut Frame, app: &DashboardApp) {
    let area = frame.area();
    let snapshot = &app.snapshot;

    let banner_alerts = snapshot.banner_alerts();
    let has_alerts = !banner_alerts.is_empty();
    let alert_height = if has_alerts {
        (banner_alerts.len().min(3) + 2) as u16
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Header
            Constraint::Length(alert_height), // Alerts banner
            Constraint::Length(7),            // Bin state
            Constraint::Min(6),               // History + logs
            Constraint::Length(1),            // Footer
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    if has_alerts {
        render_alerts_banner(frame, chunks[1], app);
    }
    render_state_section(frame, chunks[2], app);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[3]);
    render_history_section(frame, lower[0], app);
    render_logs_section(frame, lower[1], app);

    render_footer(frame, chunks[4]);

    // Render help overlay if active
    if app.show_help {
        render_help_overlay(frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &DashboardApp) {
    let snapshot = &app.snapshot;
    let (label, color) = connection_style(snapshot.connection);
    let port = snapshot.port_name.as_deref().unwrap_or("-");
    let refresh = if snapshot.settings.auto_refresh {
        format!("{}ms", snapshot.settings.auto_refresh_interval)
    } else {
        "off".to_string()
    };

    let title = format!(
        " SmartBin │ {} │ Port: {} @ {} │ Auto refresh: {} ",
        label, port, snapshot.settings.connection_baud, refresh
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    frame.render_widget(block, area);
}

/// Render alerts banner
fn render_alerts_banner(frame: &mut Frame, area: Rect, app: &DashboardApp) {
    let block = Block::default()
        .title(" ⚠ ALERTS (a: acknowledge) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut alerts_to_show = app.snapshot.banner_alerts();
    alerts_to_show.sort_by_key(|a| match a.severity {
        AlertSeverity::Critical => 0,
        AlertSeverity::Warning => 1,
        AlertSeverity::Info => 2,
    });
    alerts_to_show.truncate(3);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(1); alerts_to_show.len()])
        .split(inner);

    for (i, alert) in alerts_to_show.iter().enumerate() {
        let (icon, color) = alert_style(alert.severity);
        let text = Paragraph::new(format!("{} {}", icon, alert.message))
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD));

        frame.render_widget(text, layout[i]);
    }
}

fn render_state_section(frame: &mut Frame, area: Rect, app: &DashboardApp) {
    let snapshot = &app.snapshot;
    let state = &snapshot.state;

    let block = Block::default().title(" Bin ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Gauge
            Constraint::Length(1), // Status + distance
            Constraint::Length(1), // Usage
            Constraint::Length(1), // Timestamps
        ])
        .split(inner);

    let label = format!("Capacity {}%", state.capacity);
    let gauge = colored_gauge(state.capacity, snapshot.settings.alert_threshold, &label);
    frame.render_widget(gauge, rows[0]);

    let status_line = Line::from(vec![
        Span::raw("Lid: "),
        Span::styled(state.status.to_string(), status_style(state.status)),
        Span::raw(format!(
            "   Distance: {} cm (range {}-{} cm)",
            state.distance, snapshot.settings.min_distance, snapshot.settings.max_distance
        )),
    ]);
    frame.render_widget(Paragraph::new(status_line), rows[1]);

    let usage = Paragraph::new(format!(
        "Openings today: {}   Total: {}",
        state.daily_usage, state.total_usage
    ))
    .style(Style::default().fg(Color::White));
    frame.render_widget(usage, rows[2]);

    let times = Paragraph::new(format!(
        "Last update: {}   Last activity: {}",
        format_since(state.last_update.as_ref(), snapshot.taken_at),
        format_since(state.last_activity.as_ref(), snapshot.taken_at),
    ))
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(times, rows[3]);
}

fn render_history_section(frame: &mut Frame, area: Rect, app: &DashboardApp) {
    let snapshot = &app.snapshot;
    let block = Block::default()
        .title(format!(" {} (Tab) ", app.history_view.title()))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match app.history_view {
        HistoryView::Samples => {
            if snapshot.samples.is_empty() {
                frame.render_widget(
                    Paragraph::new("No samples yet").style(Style::default().fg(Color::DarkGray)),
                    inner,
                );
                return;
            }
            let width = inner.width as usize;
            let start = snapshot.samples.len().saturating_sub(width);
            let data: Vec<u64> = snapshot.samples[start..]
                .iter()
                .map(|s| u64::from(s.capacity))
                .collect();
            let sparkline = Sparkline::default()
                .data(&data)
                .max(100)
                .style(Style::default().fg(Color::Cyan));
            frame.render_widget(sparkline, inner);
        }
        HistoryView::Weekly | HistoryView::Monthly => {
            let buckets = if app.history_view == HistoryView::Weekly {
                &snapshot.weekly
            } else {
                &snapshot.monthly
            };
            if buckets.is_empty() {
                frame.render_widget(
                    Paragraph::new("No history yet").style(Style::default().fg(Color::DarkGray)),
                    inner,
                );
                return;
            }

            // Each bar takes its width plus a gap
            let bar_width: u16 = 9;
            let max_bars = (inner.width / (bar_width + 1)).max(1) as usize;
            let start = buckets.len().saturating_sub(max_bars);
            let threshold = snapshot.settings.alert_threshold;

            let bars: Vec<Bar> = buckets[start..]
                .iter()
                .map(|b| {
                    let avg = b.average.round() as u8;
                    Bar::default()
                        .label(Line::from(b.key.clone()))
                        .value(u64::from(avg))
                        .text_value(format!("{}%", avg))
                        .style(Style::default().fg(capacity_color(avg, threshold)))
                })
                .collect();

            let chart = BarChart::default()
                .direction(Direction::Vertical)
                .bar_width(bar_width)
                .bar_gap(1)
                .data(BarGroup::default().bars(&bars))
                .max(100);
            frame.render_widget(chart, inner);
        }
    }
}

fn render_logs_section(frame: &mut Frame, area: Rect, app: &DashboardApp) {
    let logs = &app.snapshot.logs;
    let title = if app.log_offset > 0 {
        format!(" Logs ({} back) ", app.log_offset)
    } else {
        format!(" Logs ({}) ", logs.len())
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let height = inner.height as usize;
    let end = logs.len().saturating_sub(app.log_offset);
    let start = end.saturating_sub(height);

    let lines: Vec<Line> = logs[start..end]
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", format_clock(&entry.timestamp)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<7} ", entry.kind.label()),
                    Style::default().fg(log_color(entry.kind)),
                ),
                Span::raw(entry.message.clone()),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let help = " q: Quit │ ?: Help │ c/d: Connect/Disconnect │ o/t: Open/Close │ s: Status │ a: Ack alert ";
    let para = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_text = r#"
    SmartBin Monitor - Help

    Keyboard Shortcuts:
    ─────────────────────────────────────
    q / Esc     Quit the application
    ? / h       Toggle this help screen
    c           Connect to the device
    d           Disconnect
    o           Open the lid (BUKA)
    t           Close the lid (TUTUP)
    s           Request a full status report
    a           Acknowledge the current alert
    r           Toggle auto refresh
    l           Clear logs
    Tab         Cycle history view
    ↑/↓ (k/j)   Scroll logs

    Press any key to close this help
    "#;

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::DarkGray));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    // Center the help popup
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(paragraph, popup_area);
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
