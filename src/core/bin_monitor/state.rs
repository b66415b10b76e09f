use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lid position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorStatus {
    Open,
    #[default]
    Closed,
}

impl DoorStatus {
    /// Parse the firmware's status word (`BUKA` / `TUTUP`). English aliases
    /// are accepted too; anything else is `None`.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "BUKA" | "OPEN" => Some(DoorStatus::Open),
            "TUTUP" | "CLOSED" | "CLOSE" => Some(DoorStatus::Closed),
            _ => None,
        }
    }

    pub fn wire(&self) -> &'static str {
        match self {
            DoorStatus::Open => "BUKA",
            DoorStatus::Closed => "TUTUP",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, DoorStatus::Open)
    }
}

impl fmt::Display for DoorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorStatus::Open => f.write_str("OPEN"),
            DoorStatus::Closed => f.write_str("CLOSED"),
        }
    }
}

/// Snapshot of everything known about the bin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceState {
    pub status: DoorStatus,
    /// Fill level, 0-100
    pub capacity: u8,
    /// Raw ultrasonic reading in centimeters
    pub distance: u32,
    pub daily_usage: u64,
    pub total_usage: u64,
    /// Last CLOSED→OPEN transition
    pub last_activity: Option<DateTime<Local>>,
    pub last_update: Option<DateTime<Local>>,
}

impl DeviceState {
    /// Time elapsed since the last applied event
    pub fn since_last_update(&self, now: DateTime<Local>) -> Option<chrono::Duration> {
        self.last_update.map(|t| now.signed_duration_since(t))
    }
}

/// Convert a distance reading into a fill percentage.
///
/// `min_distance` is the reading of a full bin and `max_distance` the
/// reading of an empty one; the reading is clamped to that range first and
/// the result rounded to the nearest percent.
pub fn capacity_from_distance(distance: i64, min_distance: u32, max_distance: u32) -> u8 {
    if max_distance <= min_distance {
        return 0;
    }

    let min = min_distance as f64;
    let max = max_distance as f64;
    let d = (distance as f64).clamp(min, max);
    let percent = 100.0 - 100.0 * (d - min) / (max - min);

    percent.clamp(0.0, 100.0).round() as u8
}

/// Clamp a raw distance to what gets stored: `[0, max_distance]`
pub fn clamp_distance(distance: i64, max_distance: u32) -> u32 {
    distance.clamp(0, max_distance as i64) as u32
}

/// Clamp a reported capacity into `[0, 100]`
pub fn clamp_capacity(capacity: i64) -> u8 {
    capacity.clamp(0, 100) as u8
}
