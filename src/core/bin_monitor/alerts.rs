//! Alert system for the bin.
//!
//! Evaluates the device state against the configured fill threshold and the
//! age of the last report.

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

use super::state::DeviceState;
use crate::core::config::Settings;

/// Fill level reported as critical regardless of the threshold
pub const FULL_CAPACITY: u8 = 100;

/// Reports older than this raise a stale-data notice
pub const STALE_AFTER_MINUTES: i64 = 5;

/// An individual alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub message: String,
    pub value: f32,
    pub threshold: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCategory {
    Capacity,
    StaleData,
}

/// Evaluate the device state and generate alerts
pub fn evaluate_alerts(state: &DeviceState, settings: &Settings, now: DateTime<Local>) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if state.capacity >= FULL_CAPACITY {
        alerts.push(Alert {
            severity: AlertSeverity::Critical,
            category: AlertCategory::Capacity,
            message: format!("Bin is full ({}%), empty it now", state.capacity),
            value: state.capacity as f32,
            threshold: FULL_CAPACITY as f32,
        });
    } else if state.capacity >= settings.alert_threshold {
        alerts.push(Alert {
            severity: AlertSeverity::Warning,
            category: AlertCategory::Capacity,
            message: format!(
                "Bin at {}% (alert threshold: {}%)",
                state.capacity, settings.alert_threshold
            ),
            value: state.capacity as f32,
            threshold: settings.alert_threshold as f32,
        });
    }

    if let Some(age) = state.since_last_update(now) {
        if age >= Duration::minutes(STALE_AFTER_MINUTES) {
            alerts.push(Alert {
                severity: AlertSeverity::Info,
                category: AlertCategory::StaleData,
                message: format!("No report from the device for {} min", age.num_minutes()),
                value: age.num_minutes() as f32,
                threshold: STALE_AFTER_MINUTES as f32,
            });
        }
    }

    alerts
}

/// Tracks the lifecycle of the current capacity alert.
///
/// A capacity alert is announced once when the threshold is crossed and
/// stays visible until the user acknowledges it. Both flags clear when the
/// level drops below the threshold again.
#[derive(Debug, Clone, Default)]
pub struct AlertMonitor {
    announced: bool,
    acknowledged: bool,
}

impl AlertMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the capacity alert to announce, if one is newly due
    pub fn check(
        &mut self,
        state: &DeviceState,
        settings: &Settings,
        now: DateTime<Local>,
    ) -> Option<Alert> {
        let capacity_alert = evaluate_alerts(state, settings, now)
            .into_iter()
            .find(|a| a.category == AlertCategory::Capacity);

        match capacity_alert {
            Some(alert) if !self.announced && !self.acknowledged => {
                self.announced = true;
                Some(alert)
            }
            Some(_) => None,
            None => {
                self.announced = false;
                self.acknowledged = false;
                None
            }
        }
    }

    /// Silence the active capacity alert until the level drops
    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
    }

    pub fn is_announced(&self) -> bool {
        self.announced
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }
}
