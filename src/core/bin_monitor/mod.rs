//! Bin monitoring core functionality.
//!
//! This module provides the state reconciliation for the trash-bin
//! controller: the device state store, its event log, capacity history,
//! alerts, persistence and the async runtime that drives them.

pub mod alerts;
mod history;
mod logbook;
pub mod persistence;
pub mod runtime;
mod state;
mod store;

pub use alerts::{evaluate_alerts, Alert, AlertCategory, AlertMonitor, AlertSeverity};
pub use history::{month_key, week_key, Bucket, HistoryAggregator, HistorySample};
pub use logbook::{LogBook, LogEntry, LogKind};
pub use persistence::{load_store, save_store, PersistedDb};
pub use runtime::{
    spawn_orchestrator, BucketSummary, DashboardSnapshot, MonitorRuntime, OrchestratorHandles,
    RuntimeCommand,
};
pub use state::{capacity_from_distance, clamp_capacity, clamp_distance, DeviceState, DoorStatus};
pub use store::{BatchOutcome, StateStore, Transition};
