//! Focus actuators: things that actually switch a named focus mode.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ActuatorError;
use crate::platform::{run_with_timeout, CommandFailure};

pub const SHORTCUTS_BIN: &str = "/usr/bin/shortcuts";
pub const DEFAULT_ACTUATOR_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusCommand {
    On,
    Off,
}

impl FocusCommand {
    pub fn from_state(is_on: bool) -> Self {
        if is_on {
            FocusCommand::On
        } else {
            FocusCommand::Off
        }
    }

    /// Name of the user shortcut that performs this command, e.g.
    /// "Enable Work Focus".
    pub fn shortcut_name(self, focus_name: &str) -> String {
        let verb = match self {
            FocusCommand::On => "Enable",
            FocusCommand::Off => "Disable",
        };
        format!("{verb} {} Focus", focus_name.trim())
    }
}

impl fmt::Display for FocusCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FocusCommand::On => "on",
            FocusCommand::Off => "off",
        })
    }
}

/// Switches a named focus mode on or off.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn set_focus(&self, command: FocusCommand, focus_name: &str) -> Result<(), ActuatorError>;
}

#[async_trait]
impl<T: Actuator + ?Sized> Actuator for Arc<T> {
    async fn set_focus(&self, command: FocusCommand, focus_name: &str) -> Result<(), ActuatorError> {
        (**self).set_focus(command, focus_name).await
    }
}

/// Runs the user's "Enable/Disable <name> Focus" shortcut via the
/// `shortcuts` command-line tool.
#[derive(Debug, Clone)]
pub struct ShortcutsActuator {
    program: String,
    timeout: Duration,
}

impl Default for ShortcutsActuator {
    fn default() -> Self {
        Self::new(SHORTCUTS_BIN, Duration::from_secs(DEFAULT_ACTUATOR_TIMEOUT_SECS))
    }
}

impl ShortcutsActuator {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Actuator for ShortcutsActuator {
    async fn set_focus(&self, command: FocusCommand, focus_name: &str) -> Result<(), ActuatorError> {
        let shortcut = command.shortcut_name(focus_name);
        debug!(%shortcut, "running shortcut");
        match run_with_timeout(&self.program, &["run", &shortcut], self.timeout).await {
            Ok(_) => Ok(()),
            Err(CommandFailure::Spawn(e)) => Err(ActuatorError::Unreachable(e)),
            Err(CommandFailure::Timeout) => Err(ActuatorError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }),
            Err(CommandFailure::Exit { code, stderr }) => Err(ActuatorError::Failed(format!(
                "shortcut '{shortcut}' exited with {}: {stderr}",
                code.map_or_else(|| "signal".to_string(), |c| c.to_string())
            ))),
        }
    }
}

/// Opens a `shortcuts://run-shortcut` URL. The OS may ask the user to
/// confirm, so success only means the URL was handed off.
#[derive(Debug, Clone, Default)]
pub struct UrlSchemeActuator;

impl UrlSchemeActuator {
    pub fn url(command: FocusCommand, focus_name: &str) -> String {
        format!(
            "shortcuts://run-shortcut?name={}",
            urlencoding::encode(&command.shortcut_name(focus_name))
        )
    }
}

#[async_trait]
impl Actuator for UrlSchemeActuator {
    async fn set_focus(&self, command: FocusCommand, focus_name: &str) -> Result<(), ActuatorError> {
        let url = Self::url(command, focus_name);
        debug!(%url, "opening shortcut url");
        open::that(&url).map_err(|e| ActuatorError::Unreachable(e.to_string()))
    }
}

/// Tries `primary`; when it cannot be reached (or times out) tries `secondary`.
///
/// A primary that ran and reported failure is not retried through the
/// secondary path.
pub struct FallbackActuator {
    primary: Box<dyn Actuator>,
    secondary: Box<dyn Actuator>,
}

impl FallbackActuator {
    pub fn new(primary: impl Actuator + 'static, secondary: impl Actuator + 'static) -> Self {
        Self {
            primary: Box::new(primary),
            secondary: Box::new(secondary),
        }
    }

    /// `shortcuts` CLI with URL-scheme fallback.
    pub fn system_default() -> Self {
        Self::new(ShortcutsActuator::default(), UrlSchemeActuator)
    }
}

#[async_trait]
impl Actuator for FallbackActuator {
    async fn set_focus(&self, command: FocusCommand, focus_name: &str) -> Result<(), ActuatorError> {
        match self.primary.set_focus(command, focus_name).await {
            Err(e) if e.is_unreachable() => {
                warn!(error = %e, %command, "primary actuator unreachable, using fallback");
                self.secondary.set_focus(command, focus_name).await
            }
            other => other,
        }
    }
}
