//! Terminal User Interface for the bin monitor.
//!
//! Provides a real-time dashboard using ratatui, fed by snapshots from the
//! monitor runtime.

mod app;
mod event_handler;
mod render;
mod widgets;

pub use app::{run_dashboard_app, DashboardApp, DashboardAppConfig, HistoryView};
pub use event_handler::{map_key, DashboardEvent};
