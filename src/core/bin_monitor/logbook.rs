use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const DEFAULT_LOG_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Warning,
    Error,
    /// Text coming straight from the device
    Device,
}

impl LogKind {
    pub fn label(&self) -> &'static str {
        match self {
            LogKind::Info => "INFO",
            LogKind::Success => "OK",
            LogKind::Warning => "WARN",
            LogKind::Error => "ERROR",
            LogKind::Device => "DEVICE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub kind: LogKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Bounded event log, oldest entries dropped first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogBook {
    capacity: usize,
    next_id: u64,
    entries: VecDeque<LogEntry>,
}

impl LogBook {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_id: 1,
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY)),
        }
    }

    pub fn push(
        &mut self,
        kind: LogKind,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
        now: DateTime<Local>,
    ) -> &LogEntry {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }

        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_back(LogEntry {
            id,
            timestamp: now,
            message: message.into(),
            kind,
            payload,
        });

        // Just pushed, so the deque is non-empty
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LogEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The `limit` most recent entries, oldest first
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for LogBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let now = Local::now();
        let mut book = LogBook::with_capacity(3);
        for i in 0..5 {
            book.push(LogKind::Info, format!("entry {}", i), None, now);
        }

        assert_eq!(book.len(), 3);
        let messages: Vec<_> = book.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn test_ids_keep_increasing_after_clear() {
        let now = Local::now();
        let mut book = LogBook::new();
        let first = book.push(LogKind::Device, "a", None, now).id;
        book.clear();
        let second = book.push(LogKind::Device, "b", None, now).id;

        assert!(book.len() == 1);
        assert!(second > first);
    }

    #[test]
    fn test_recent() {
        let now = Local::now();
        let mut book = LogBook::new();
        for i in 0..10 {
            book.push(LogKind::Info, i.to_string(), None, now);
        }

        let recent = book.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "7");
        assert_eq!(recent[2].message, "9");
        assert_eq!(book.recent(50).len(), 10);
    }
}
