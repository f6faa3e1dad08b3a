//! User-facing alerts with per-category rate limiting.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

/// Default minimum gap between two alerts of the same category.
pub const DEFAULT_COOLDOWN_SECS: i64 = 3600;

/// Consecutive refresh failures before the user is told to sign in again.
pub const CREDENTIAL_FAILURE_THRESHOLD: u32 = 3;

/// Alert category; each has its own cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotificationKey {
    /// OAuth client credentials were never entered.
    MissingSetup,
    /// An account's credentials keep getting rejected.
    CredentialInvalid(String),
}

impl NotificationKey {
    pub fn message(&self) -> String {
        match self {
            NotificationKey::MissingSetup => {
                "Calendar access is not set up. Run `calfocus auth login` and `calfocus account add`.".into()
            }
            NotificationKey::CredentialInvalid(email) => {
                format!("Calendar access for {email} stopped working. Re-add the account.")
            }
        }
    }
}

/// Remembers when each category last fired.
#[derive(Debug, Clone)]
pub struct NotificationLimiter {
    cooldown: Duration,
    last_sent: HashMap<NotificationKey, DateTime<Utc>>,
}

impl Default for NotificationLimiter {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS))
    }
}

impl NotificationLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: HashMap::new(),
        }
    }

    /// Returns true (and records `now`) when `key` may fire.
    pub fn should_send(&mut self, key: &NotificationKey, now: DateTime<Utc>) -> bool {
        match self.last_sent.get(key) {
            Some(last) if now < *last + self.cooldown => false,
            _ => {
                self.last_sent.insert(key.clone(), now);
                true
            }
        }
    }

    pub fn reset(&mut self, key: &NotificationKey) {
        self.last_sent.remove(key);
    }
}

/// Delivers alerts to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, key: &NotificationKey, message: &str);
}

/// Writes alerts to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, key: &NotificationKey, message: &str) {
        warn!(?key, "{message}");
    }
}
