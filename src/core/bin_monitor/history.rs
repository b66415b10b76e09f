use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw samples kept before a batch trim kicks in
const DAILY_TRIM_THRESHOLD: usize = 2880;
/// Raw samples kept after a batch trim
const DAILY_RETAIN: usize = 1440;
/// Month buckets kept
const MONTH_RETENTION: usize = 12;
/// Week buckets kept
const WEEK_RETENTION: usize = 52;

/// One capacity reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub timestamp: DateTime<Local>,
    pub capacity: u8,
}

impl HistorySample {
    pub fn new(timestamp: DateTime<Local>, capacity: u8) -> Self {
        Self { timestamp, capacity }
    }
}

/// Running statistics for one calendar period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub total: u64,
    pub count: u64,
    pub max: u8,
    pub min: u8,
    pub timestamps: Vec<DateTime<Local>>,
}

impl Bucket {
    fn from_sample(sample: &HistorySample) -> Self {
        Self {
            total: sample.capacity as u64,
            count: 1,
            max: sample.capacity,
            min: sample.capacity,
            timestamps: vec![sample.timestamp],
        }
    }

    fn add(&mut self, sample: &HistorySample) {
        self.total += sample.capacity as u64;
        self.count += 1;
        self.max = self.max.max(sample.capacity);
        self.min = self.min.min(sample.capacity);
        self.timestamps.push(sample.timestamp);
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total as f64 / self.count as f64
        }
    }
}

/// Week key: year, month and week-of-month (`ceil(day / 7)`), e.g. `2026-03-W2`
pub fn week_key(timestamp: &DateTime<Local>) -> String {
    let week = timestamp.day().div_ceil(7);
    format!("{:04}-{:02}-W{}", timestamp.year(), timestamp.month(), week)
}

/// Month key, e.g. `2026-03`
pub fn month_key(timestamp: &DateTime<Local>) -> String {
    format!("{:04}-{:02}", timestamp.year(), timestamp.month())
}

/// Capacity history: raw samples plus weekly and monthly roll-ups.
///
/// Keys are zero-padded so the `BTreeMap` order is chronological, which is
/// what eviction relies on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryAggregator {
    daily: Vec<HistorySample>,
    weekly: BTreeMap<String, Bucket>,
    monthly: BTreeMap<String, Bucket>,
}

impl HistoryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sample: HistorySample) {
        Self::fold_into(&mut self.weekly, week_key(&sample.timestamp), &sample);
        Self::fold_into(&mut self.monthly, month_key(&sample.timestamp), &sample);

        self.daily.push(sample);
        if self.daily.len() > DAILY_TRIM_THRESHOLD {
            let excess = self.daily.len() - DAILY_RETAIN;
            self.daily.drain(..excess);
        }

        Self::evict_oldest(&mut self.monthly, MONTH_RETENTION);
        Self::evict_oldest(&mut self.weekly, WEEK_RETENTION);
    }

    fn fold_into(buckets: &mut BTreeMap<String, Bucket>, key: String, sample: &HistorySample) {
        buckets
            .entry(key)
            .and_modify(|bucket| bucket.add(sample))
            .or_insert_with(|| Bucket::from_sample(sample));
    }

    fn evict_oldest(buckets: &mut BTreeMap<String, Bucket>, keep: usize) {
        while buckets.len() > keep {
            buckets.pop_first();
        }
    }

    pub fn daily(&self) -> &[HistorySample] {
        &self.daily
    }

    /// Raw samples taken at or after `since`
    pub fn daily_since(&self, since: DateTime<Local>) -> &[HistorySample] {
        let start = self.daily.partition_point(|s| s.timestamp < since);
        &self.daily[start..]
    }

    pub fn weekly(&self) -> &BTreeMap<String, Bucket> {
        &self.weekly
    }

    pub fn monthly(&self) -> &BTreeMap<String, Bucket> {
        &self.monthly
    }

    pub fn is_empty(&self) -> bool {
        self.daily.is_empty() && self.monthly.is_empty()
    }
}
