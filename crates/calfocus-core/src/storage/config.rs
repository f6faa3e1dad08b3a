//! Presence-detection configuration.
//!
//! Stores user preferences including:
//! - Lead-in / lag-out tolerances around busy intervals
//! - All-day and video-link policies
//! - Which focus profile the actuator toggles
//! - Scheduler and network timing
//!
//! Lives in the `[config]` table of the settings document. Every key has a
//! default and unknown keys are ignored, so older or hand-edited files load.

use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use crate::error::ConfigError;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Seconds before a busy interval starts during which it already counts.
    #[serde(default = "default_60")]
    pub lead_in_seconds: u32,
    /// Seconds after a busy interval ends during which it still counts.
    #[serde(default = "default_60")]
    pub lag_out_seconds: u32,
    #[serde(default = "default_true")]
    pub ignore_all_day: bool,
    /// Busy time only counts when an in-window event carries a join link.
    #[serde(default = "default_true")]
    pub require_video_link: bool,
    /// Focus profile name, e.g. "Work" runs the "Enable Work Focus" shortcut.
    #[serde(default = "default_focus_name")]
    pub focus_name: String,
    /// An active call-provider tab forces focus on.
    #[serde(default = "default_true")]
    pub call_page_awareness: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u32,
    /// Seconds without input before the device counts as idle.
    #[serde(default = "default_60")]
    pub idle_threshold_seconds: u32,
    /// Upper bound for any single network call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
}

// Default functions
fn default_60() -> u32 {
    60
}
fn default_true() -> bool {
    true
}
fn default_focus_name() -> String {
    "Work".into()
}
fn default_poll_interval() -> u32 {
    30
}
fn default_request_timeout() -> u32 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lead_in_seconds: default_60(),
            lag_out_seconds: default_60(),
            ignore_all_day: true,
            require_video_link: true,
            focus_name: default_focus_name(),
            call_page_awareness: true,
            poll_interval_seconds: default_poll_interval(),
            idle_threshold_seconds: default_60(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Config {
    pub fn lead_in(&self) -> Duration {
        Duration::seconds(i64::from(self.lead_in_seconds))
    }

    pub fn lag_out(&self) -> Duration {
        Duration::seconds(i64::from(self.lag_out_seconds))
    }

    pub fn poll_interval(&self) -> StdDuration {
        StdDuration::from_secs(u64::from(self.poll_interval_seconds.max(1)))
    }

    pub fn idle_threshold(&self) -> StdDuration {
        StdDuration::from_secs(u64::from(self.idle_threshold_seconds))
    }

    pub fn request_timeout(&self) -> StdDuration {
        StdDuration::from_secs(u64::from(self.request_timeout_seconds.max(1)))
    }

    /// The `[now - lead_in, now + lag_out]` range queried from the provider.
    pub fn query_window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - self.lead_in(), now + self.lag_out())
    }

    /// Get a config value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, parsing `value` as the existing field's type.
    ///
    /// The caller is responsible for persisting the settings document.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigError::ParseFailed("config is not an object".into()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("expected true or false, got '{value}'")))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("expected a non-negative integer, got '{value}'")))?;
                serde_json::Value::Number(n.into())
            }
            _ => {
                if value.trim().is_empty() {
                    return Err(invalid("value must not be empty".into()));
                }
                serde_json::Value::String(value.trim().to_string())
            }
        };

        obj.insert(key.to_string(), new_value);
        *self = serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(())
    }

    /// Recognized option names.
    pub fn keys() -> Vec<String> {
        match serde_json::to_value(Config::default()) {
            Ok(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}
