//! Classification of single device lines.
//!
//! The controller speaks newline-delimited ASCII. A line is either a full
//! comma-separated report, one of a handful of `KEY:value` partial reports,
//! or free-form diagnostic text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum number of comma fields for a line to count as a full report
const FULL_REPORT_FIELDS: usize = 5;

/// Complete state snapshot reported by the device:
/// `STATUS,CAPACITY,DISTANCE,DAILY_USAGE,TOTAL_USAGE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullReport {
    pub status: String,
    pub capacity: i64,
    pub distance: i64,
    pub daily_usage: i64,
    pub total_usage: i64,
}

/// Single-field update reported by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartialReport {
    Status(String),
    Distance(i64),
    Usage(i64),
    SystemReady,
    CommandReceived(String),
}

impl PartialReport {
    /// Whether this report carries a device field (status, distance or usage)
    pub fn is_state_bearing(&self) -> bool {
        matches!(
            self,
            PartialReport::Status(_) | PartialReport::Distance(_) | PartialReport::Usage(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PartialReport::Status(_) => "STATUS",
            PartialReport::Distance(_) => "DISTANCE",
            PartialReport::Usage(_) => "USAGE",
            PartialReport::SystemReady => "SYSTEM_READY",
            PartialReport::CommandReceived(_) => "CMD_RECEIVED",
        }
    }
}

/// A classified device line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceEvent {
    Full(FullReport),
    Partial(PartialReport),
    /// Diagnostic text, kept verbatim
    Message(String),
}

impl DeviceEvent {
    pub fn is_full(&self) -> bool {
        matches!(self, DeviceEvent::Full(_))
    }
}

static STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^STATUS:\s*(.+?)\s*$").expect("valid STATUS pattern"));
static DISTANCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^DISTANCE:\s*(-?\d+)").expect("valid DISTANCE pattern"));
static USAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^USAGE:\s*(\d+)").expect("valid USAGE pattern"));
static SYSTEM_READY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SYSTEM_READY\s*$").expect("valid SYSTEM_READY pattern"));
static CMD_RECEIVED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^CMD_RECEIVED:\s*(.+?)\s*$").expect("valid CMD_RECEIVED pattern"));

/// Classify one non-empty line. Never fails: anything unrecognised becomes a
/// [`DeviceEvent::Message`].
pub fn classify(line: &str) -> DeviceEvent {
    if line.contains(',') {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() >= FULL_REPORT_FIELDS {
            return DeviceEvent::Full(FullReport {
                status: fields[0].to_string(),
                capacity: parse_lenient(fields[1]),
                distance: parse_lenient(fields[2]),
                daily_usage: parse_lenient(fields[3]),
                total_usage: parse_lenient(fields[4]),
            });
        }
    }

    match classify_partial(line) {
        Some(partial) => DeviceEvent::Partial(partial),
        None => DeviceEvent::Message(line.to_string()),
    }
}

fn classify_partial(line: &str) -> Option<PartialReport> {
    if let Some(caps) = STATUS_RE.captures(line) {
        return Some(PartialReport::Status(caps[1].to_string()));
    }
    if let Some(caps) = DISTANCE_RE.captures(line) {
        return Some(PartialReport::Distance(parse_lenient(&caps[1])));
    }
    if let Some(caps) = USAGE_RE.captures(line) {
        return Some(PartialReport::Usage(parse_lenient(&caps[1])));
    }
    if SYSTEM_READY_RE.is_match(line) {
        return Some(PartialReport::SystemReady);
    }
    if let Some(caps) = CMD_RECEIVED_RE.captures(line) {
        return Some(PartialReport::CommandReceived(caps[1].to_string()));
    }
    None
}

/// Parse an optional sign followed by leading digits, ignoring any trailing
/// text (`"27.5"` is 27, `"12cm"` is 12). Anything without digits, or too
/// large for an `i64`, is 0.
pub fn parse_lenient(field: &str) -> i64 {
    let field = field.trim();
    let (negative, rest) = match field.as_bytes().first() {
        Some(b'-') => (true, &field[1..]),
        Some(b'+') => (false, &field[1..]),
        _ => (false, field),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];

    match digits.parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => 0,
    }
}
