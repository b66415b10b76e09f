//! The single owner of device state.
//!
//! Every classified batch goes through [`StateStore::apply_batch`]; readers
//! only ever get cloned snapshots.

use chrono::{DateTime, Local};
use serde_json::json;

use super::history::{HistoryAggregator, HistorySample};
use super::logbook::{LogBook, LogKind};
use super::state::{
    capacity_from_distance, clamp_capacity, clamp_distance, DeviceState, DoorStatus,
};
use crate::core::config::{Settings, UsageCounting};
use crate::core::protocol::{DeviceEvent, FullReport, PartialReport};

/// Status change observed while applying events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Opened,
    Closed,
}

/// What a batch did to the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Number of state-bearing events applied
    pub applied: usize,
    /// Number of events only forwarded to the log
    pub logged: usize,
    /// Full or partial reports dropped by the batch policy
    pub superseded: usize,
    /// Last status transition in the batch, if any
    pub transition: Option<Transition>,
}

impl BatchOutcome {
    pub fn changed_state(&self) -> bool {
        self.applied > 0
    }

    pub fn is_empty(&self) -> bool {
        self.applied == 0 && self.logged == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct StateStore {
    state: DeviceState,
    settings: Settings,
    logs: LogBook,
    history: HistoryAggregator,
}

impl StateStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Rebuild a store from persisted parts
    pub fn from_parts(
        state: DeviceState,
        settings: Settings,
        logs: LogBook,
        history: HistoryAggregator,
    ) -> Self {
        Self {
            state,
            settings,
            logs,
            history,
        }
    }

    /// Apply the events of one chunk.
    ///
    /// When the batch holds full reports, only the last one is applied and
    /// the batch's status/distance/usage partials are dropped. Without full
    /// reports every partial is applied in order. Diagnostic lines,
    /// `SYSTEM_READY` and `CMD_RECEIVED` only ever reach the log.
    pub fn apply_batch(&mut self, events: &[DeviceEvent], now: DateTime<Local>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        if events.is_empty() {
            return outcome;
        }

        self.roll_day(now);

        let last_full = events.iter().rposition(DeviceEvent::is_full);

        for (index, event) in events.iter().enumerate() {
            match event {
                DeviceEvent::Full(report) => {
                    if Some(index) == last_full {
                        outcome.applied += 1;
                        if let Some(t) = self.apply_full(report, now) {
                            outcome.transition = Some(t);
                        }
                    } else {
                        outcome.superseded += 1;
                    }
                }
                DeviceEvent::Partial(partial) if partial.is_state_bearing() => {
                    if last_full.is_some() {
                        outcome.superseded += 1;
                    } else {
                        outcome.applied += 1;
                        if let Some(t) = self.apply_partial(partial, now) {
                            outcome.transition = Some(t);
                        }
                    }
                }
                DeviceEvent::Partial(partial) => {
                    outcome.logged += 1;
                    self.log_partial(partial, now);
                }
                DeviceEvent::Message(text) => {
                    outcome.logged += 1;
                    self.logs.push(LogKind::Device, text.clone(), None, now);
                }
            }
        }

        if outcome.superseded > 0 {
            log::debug!(
                "Batch of {} events: {} superseded by a later full report",
                events.len(),
                outcome.superseded
            );
        }

        outcome
    }

    /// Apply a single event as a batch of one
    pub fn apply_event(&mut self, event: &DeviceEvent, now: DateTime<Local>) -> BatchOutcome {
        self.apply_batch(std::slice::from_ref(event), now)
    }

    fn apply_full(&mut self, report: &FullReport, now: DateTime<Local>) -> Option<Transition> {
        log::debug!("Full report: {:?}", report);

        let transition = self.set_status(&report.status, now);

        self.state.capacity = clamp_capacity(report.capacity);
        self.state.distance = clamp_distance(report.distance, self.settings.max_distance);
        self.state.daily_usage = non_negative(report.daily_usage);
        self.state.total_usage = non_negative(report.total_usage);

        if transition == Some(Transition::Opened) {
            self.count_opening();
        }

        self.state.last_update = Some(now);
        self.history
            .record(HistorySample::new(now, self.state.capacity));

        transition
    }

    fn apply_partial(&mut self, partial: &PartialReport, now: DateTime<Local>) -> Option<Transition> {
        let mut transition = None;

        match partial {
            PartialReport::Status(raw) => {
                transition = self.set_status(raw, now);
                if transition == Some(Transition::Opened) {
                    self.count_opening();
                }
            }
            PartialReport::Distance(distance) => {
                self.state.distance = clamp_distance(*distance, self.settings.max_distance);
                self.state.capacity = capacity_from_distance(
                    self.state.distance as i64,
                    self.settings.min_distance,
                    self.settings.max_distance,
                );
            }
            PartialReport::Usage(usage) => {
                self.state.daily_usage = non_negative(*usage);
            }
            PartialReport::SystemReady | PartialReport::CommandReceived(_) => return None,
        }

        self.state.last_update = Some(now);
        transition
    }

    /// Update the status from its wire form and report a flip, if any
    fn set_status(&mut self, raw: &str, now: DateTime<Local>) -> Option<Transition> {
        let Some(status) = DoorStatus::from_wire(raw) else {
            self.logs.push(
                LogKind::Warning,
                format!("Unrecognised status '{}', keeping {}", raw, self.state.status),
                Some(json!({ "status": raw })),
                now,
            );
            return None;
        };

        let previous = self.state.status;
        self.state.status = status;

        match (previous, status) {
            (DoorStatus::Closed, DoorStatus::Open) => {
                self.state.last_activity = Some(now);
                self.logs.push(LogKind::Success, "Lid opened", None, now);
                Some(Transition::Opened)
            }
            (DoorStatus::Open, DoorStatus::Closed) => {
                self.logs.push(LogKind::Info, "Lid closed", None, now);
                Some(Transition::Closed)
            }
            _ => None,
        }
    }

    fn count_opening(&mut self) {
        if self.settings.usage_counting == UsageCounting::Additive {
            self.state.daily_usage += 1;
            self.state.total_usage += 1;
        }
    }

    fn log_partial(&mut self, partial: &PartialReport, now: DateTime<Local>) {
        match partial {
            PartialReport::SystemReady => {
                self.logs.push(LogKind::Success, "Device ready", None, now);
            }
            PartialReport::CommandReceived(command) => {
                self.logs.push(
                    LogKind::Info,
                    format!("Device acknowledged {}", command),
                    Some(json!({ "command": command })),
                    now,
                );
            }
            _ => {}
        }
    }

    /// Reset the daily counter on the first event of a new local day
    fn roll_day(&mut self, now: DateTime<Local>) {
        if let Some(last) = self.state.last_update {
            if last.date_naive() != now.date_naive() && self.state.daily_usage > 0 {
                self.logs.push(
                    LogKind::Info,
                    format!("New day, daily usage reset (was {})", self.state.daily_usage),
                    None,
                    now,
                );
                self.state.daily_usage = 0;
            }
        }
    }

    /// Append an entry to the event log
    pub fn log(
        &mut self,
        kind: LogKind,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
        now: DateTime<Local>,
    ) {
        self.logs.push(kind, message, payload, now);
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    pub fn snapshot(&self) -> DeviceState {
        self.state.clone()
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn logs(&self) -> &LogBook {
        &self.logs
    }

    pub fn history(&self) -> &HistoryAggregator {
        &self.history
    }
}

fn non_negative(value: i64) -> u64 {
    value.max(0) as u64
}
