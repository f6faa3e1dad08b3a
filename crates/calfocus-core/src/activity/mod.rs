//! Device activity signals: idle state and the active browser tab.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::platform::run_with_timeout;
use crate::presence::DeviceSignals;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

const FRONT_TAB_SCRIPT: &str = r#"tell application "System Events" to set chromeRunning to (name of processes) contains "Google Chrome"
if chromeRunning then
    tell application "Google Chrome"
        if (count of windows) > 0 then return URL of active tab of front window
    end tell
end if
return """#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

impl IdleState {
    pub fn is_active(self) -> bool {
        matches!(self, IdleState::Active)
    }
}

/// Source of live device state.
#[async_trait]
pub trait ActivitySensor: Send + Sync {
    /// Idle when there has been no input for at least `threshold`.
    async fn idle_state(&self, threshold: Duration) -> IdleState;

    /// URL of the focused browser tab, if known.
    async fn active_tab_url(&self) -> Option<String>;

    async fn sample(&self, threshold: Duration) -> DeviceSignals {
        DeviceSignals {
            active: self.idle_state(threshold).await.is_active(),
            active_tab_url: self.active_tab_url().await,
        }
    }
}

/// Sensor with externally set values.
#[derive(Debug)]
pub struct StaticSensor {
    state: Mutex<(IdleState, Option<String>)>,
}

impl Default for StaticSensor {
    fn default() -> Self {
        Self::new(IdleState::Active, None)
    }
}

impl StaticSensor {
    pub fn new(idle: IdleState, tab_url: Option<String>) -> Self {
        Self {
            state: Mutex::new((idle, tab_url)),
        }
    }

    pub fn set_idle_state(&self, idle: IdleState) {
        if let Ok(mut state) = self.state.lock() {
            state.0 = idle;
        }
    }

    pub fn set_tab_url(&self, url: Option<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.1 = url;
        }
    }
}

#[async_trait]
impl ActivitySensor for StaticSensor {
    async fn idle_state(&self, _threshold: Duration) -> IdleState {
        self.state
            .lock()
            .map(|s| s.0)
            .unwrap_or(IdleState::Active)
    }

    async fn active_tab_url(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.1.clone())
    }
}

/// Reads input idle time from `ioreg` and the front Chrome tab via
/// `osascript`. Anywhere those tools are missing or fail, the device is
/// reported active with no tab.
#[derive(Debug, Clone, Default)]
pub struct SystemSensor;

#[async_trait]
impl ActivitySensor for SystemSensor {
    async fn idle_state(&self, threshold: Duration) -> IdleState {
        if !cfg!(target_os = "macos") {
            return IdleState::Active;
        }
        let output = match run_with_timeout("ioreg", &["-c", "IOHIDSystem"], COMMAND_TIMEOUT).await {
            Ok(output) => output,
            Err(e) => {
                debug!(?e, "ioreg unavailable, assuming active");
                return IdleState::Active;
            }
        };
        match parse_hid_idle_ns(&output) {
            Some(ns) if Duration::from_nanos(ns) >= threshold => IdleState::Idle,
            _ => IdleState::Active,
        }
    }

    async fn active_tab_url(&self) -> Option<String> {
        if !cfg!(target_os = "macos") {
            return None;
        }
        match run_with_timeout("osascript", &["-e", FRONT_TAB_SCRIPT], COMMAND_TIMEOUT).await {
            Ok(url) if !url.is_empty() => Some(url),
            Ok(_) => None,
            Err(e) => {
                debug!(?e, "front tab lookup failed");
                None
            }
        }
    }
}

/// Extract `HIDIdleTime` (nanoseconds) from `ioreg -c IOHIDSystem` output.
pub fn parse_hid_idle_ns(output: &str) -> Option<u64> {
    output
        .lines()
        .find(|line| line.contains("\"HIDIdleTime\""))
        .and_then(|line| line.split('=').nth(1))
        .and_then(|value| value.trim().parse().ok())
}
