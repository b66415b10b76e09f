use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::storage::{BlobStore, KEY_SETTINGS};

pub const DEFAULT_BAUD: u32 = 115_200;
pub const DEFAULT_AUTO_REFRESH_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_ALERT_THRESHOLD: u8 = 80;
pub const DEFAULT_MIN_DISTANCE: u32 = 0;
pub const DEFAULT_MAX_DISTANCE: u32 = 50;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;

/// Smallest polling interval accepted from the user
const MIN_AUTO_REFRESH_INTERVAL_MS: u64 = 500;

/// How usage counters react to a local CLOSED→OPEN transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UsageCounting {
    /// Device counters plus one local increment per observed opening
    #[default]
    Additive,
    /// Device counters only
    DeviceOnly,
}

/// User settings, persisted under the `settings` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub connection_baud: u32,
    pub auto_refresh: bool,
    pub auto_refresh_interval: u64,
    pub alert_threshold: u8,
    pub auto_scroll_logs: bool,
    /// Serial port to use; `None` picks one at connect time
    pub port_path: Option<String>,
    /// Sensor distance (cm) reported when the bin is full
    pub min_distance: u32,
    /// Sensor distance (cm) reported when the bin is empty
    pub max_distance: u32,
    pub auto_reconnect: bool,
    pub reconnect_delay_ms: u64,
    pub usage_counting: UsageCounting,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connection_baud: DEFAULT_BAUD,
            auto_refresh: false,
            auto_refresh_interval: DEFAULT_AUTO_REFRESH_INTERVAL_MS,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            auto_scroll_logs: true,
            port_path: None,
            min_distance: DEFAULT_MIN_DISTANCE,
            max_distance: DEFAULT_MAX_DISTANCE,
            auto_reconnect: true,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            usage_counting: UsageCounting::Additive,
        }
    }
}

/// Keys accepted by `config set`, in display order
pub const SETTING_KEYS: &[&str] = &[
    "connectionBaud",
    "autoRefresh",
    "autoRefreshInterval",
    "alertThreshold",
    "autoScrollLogs",
    "portPath",
    "minDistance",
    "maxDistance",
    "autoReconnect",
    "reconnectDelayMs",
    "usageCounting",
];

impl Settings {
    /// Load settings from the store, falling back to defaults when the entry
    /// is missing or unreadable
    pub fn load(store: &dyn BlobStore) -> Result<Self> {
        let raw = store
            .get(KEY_SETTINGS)
            .context("Failed to read settings")?;

        let settings = match raw {
            None => Settings::default(),
            Some(data) if data.trim().is_empty() => Settings::default(),
            Some(data) => serde_json::from_str::<Settings>(&data).unwrap_or_else(|e| {
                log::warn!("Stored settings are corrupted, using defaults: {}", e);
                Settings::default()
            }),
        };

        Ok(settings.sanitized())
    }

    pub fn save(&self, store: &dyn BlobStore) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        store
            .put(KEY_SETTINGS, &data)
            .context("Failed to write settings")?;
        Ok(())
    }

    /// Clamp values a hand-edited file could have pushed out of range
    pub fn sanitized(mut self) -> Self {
        self.alert_threshold = self.alert_threshold.min(100);
        if self.max_distance <= self.min_distance {
            self.min_distance = DEFAULT_MIN_DISTANCE;
            self.max_distance = DEFAULT_MAX_DISTANCE;
        }
        if self.auto_refresh_interval < MIN_AUTO_REFRESH_INTERVAL_MS {
            self.auto_refresh_interval = MIN_AUTO_REFRESH_INTERVAL_MS;
        }
        if self.connection_baud == 0 {
            self.connection_baud = DEFAULT_BAUD;
        }
        self
    }

    /// Set one setting from its textual form. Accepts camelCase or
    /// snake_case names.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match normalize_key(key).as_str() {
            "connectionbaud" => self.connection_baud = parse_number(key, value)?,
            "autorefresh" => self.auto_refresh = parse_bool(key, value)?,
            "autorefreshinterval" => {
                let interval: u64 = parse_number(key, value)?;
                if interval < MIN_AUTO_REFRESH_INTERVAL_MS {
                    bail!(
                        "autoRefreshInterval must be at least {} ms",
                        MIN_AUTO_REFRESH_INTERVAL_MS
                    );
                }
                self.auto_refresh_interval = interval;
            }
            "alertthreshold" => {
                let threshold: u8 = parse_number(key, value)?;
                if threshold > 100 {
                    bail!("alertThreshold must be between 0 and 100");
                }
                self.alert_threshold = threshold;
            }
            "autoscrolllogs" => self.auto_scroll_logs = parse_bool(key, value)?,
            "portpath" => {
                self.port_path = match value {
                    "" | "auto" | "none" => None,
                    path => Some(path.to_string()),
                }
            }
            "mindistance" => {
                let min: u32 = parse_number(key, value)?;
                if min >= self.max_distance {
                    bail!("minDistance must be below maxDistance ({})", self.max_distance);
                }
                self.min_distance = min;
            }
            "maxdistance" => {
                let max: u32 = parse_number(key, value)?;
                if max <= self.min_distance {
                    bail!("maxDistance must be above minDistance ({})", self.min_distance);
                }
                self.max_distance = max;
            }
            "autoreconnect" => self.auto_reconnect = parse_bool(key, value)?,
            "reconnectdelayms" => self.reconnect_delay_ms = parse_number(key, value)?,
            "usagecounting" => {
                self.usage_counting = match normalize_key(value).as_str() {
                    "additive" => UsageCounting::Additive,
                    "deviceonly" => UsageCounting::DeviceOnly,
                    _ => bail!("usageCounting must be 'additive' or 'deviceOnly'"),
                }
            }
            _ => bail!(
                "Unknown setting '{}'. Known settings: {}",
                key,
                SETTING_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// Textual form of one setting, for `config get`
    pub fn get_value(&self, key: &str) -> Option<String> {
        let value = match normalize_key(key).as_str() {
            "connectionbaud" => self.connection_baud.to_string(),
            "autorefresh" => self.auto_refresh.to_string(),
            "autorefreshinterval" => self.auto_refresh_interval.to_string(),
            "alertthreshold" => self.alert_threshold.to_string(),
            "autoscrolllogs" => self.auto_scroll_logs.to_string(),
            "portpath" => self.port_path.clone().unwrap_or_else(|| "auto".to_string()),
            "mindistance" => self.min_distance.to_string(),
            "maxdistance" => self.max_distance.to_string(),
            "autoreconnect" => self.auto_reconnect.to_string(),
            "reconnectdelayms" => self.reconnect_delay_ms.to_string(),
            "usagecounting" => match self.usage_counting {
                UsageCounting::Additive => "additive".to_string(),
                UsageCounting::DeviceOnly => "deviceOnly".to_string(),
            },
            _ => return None,
        };
        Some(value)
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => bail!("{} expects true/false, got '{}'", key, value),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| anyhow::anyhow!("{} expects a number, got '{}'", key, value))
}
