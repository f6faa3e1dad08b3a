//! The persisted settings document: accounts, configuration and focus state.
//!
//! The document is always loaded and saved whole. [`FileStore`] keeps it as
//! TOML at `~/.config/calfocus/settings.toml`; [`MemoryStore`] backs tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::config::Config;
use super::data_dir;
use crate::error::StoreError;
use crate::integrations::provider::TokenGrant;

/// Credentials are refreshed when they expire within this many seconds.
pub const REFRESH_MARGIN_SECS: i64 = 30;

/// OAuth credential bundle for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    /// Build credentials from a token grant received at `now`.
    pub fn from_grant(grant: TokenGrant, now: DateTime<Utc>) -> Self {
        Self {
            expires_at: now + grant.lifetime(),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
        }
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .checked_sub_signed(Duration::seconds(REFRESH_MARGIN_SECS))
            .map_or(true, |deadline| now >= deadline)
    }

    /// Merge a refresh grant; the old refresh token survives when the
    /// provider does not rotate it.
    pub fn apply_grant(&mut self, grant: TokenGrant, now: DateTime<Utc>) {
        self.expires_at = now + grant.lifetime();
        self.access_token = grant.access_token;
        if grant.refresh_token.is_some() {
            self.refresh_token = grant.refresh_token;
        }
    }
}

/// A calendar belonging to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub enabled: bool,
}

/// An authorized calendar account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub calendars: Vec<Calendar>,
}

impl Account {
    /// Enabled calendar ids in configured order.
    pub fn enabled_calendar_ids(&self) -> Vec<String> {
        self.calendars
            .iter()
            .filter(|c| c.enabled)
            .map(|c| c.id.clone())
            .collect()
    }
}

/// Last actuated focus state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusState {
    #[serde(default)]
    pub is_on: bool,
    #[serde(default)]
    pub last_reason: String,
}

/// The whole persisted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub focus: FocusState,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl Settings {
    pub fn account(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.email == email)
    }

    /// Insert a new account or replace the one with the same email,
    /// keeping its position.
    pub fn upsert_account(&mut self, account: Account) {
        match self.accounts.iter_mut().find(|a| a.email == account.email) {
            Some(existing) => *existing = account,
            None => self.accounts.push(account),
        }
    }

    /// Returns whether an account was removed.
    pub fn remove_account(&mut self, email: &str) -> bool {
        let before = self.accounts.len();
        self.accounts.retain(|a| a.email != email);
        self.accounts.len() != before
    }

    /// Toggle a calendar. Returns false if the account or calendar is unknown.
    pub fn set_calendar_enabled(&mut self, email: &str, calendar_id: &str, enabled: bool) -> bool {
        let Some(account) = self.accounts.iter_mut().find(|a| a.email == email) else {
            return false;
        };
        match account.calendars.iter_mut().find(|c| c.id == calendar_id) {
            Some(calendar) => {
                calendar.enabled = enabled;
                true
            }
            None => false,
        }
    }
}

/// Whole-document persistence boundary.
pub trait SettingsStore: Send + Sync {
    /// Load the document; a store with nothing saved yields defaults.
    fn load(&self) -> Result<Settings, StoreError>;

    /// Overwrite the document.
    fn save(&self, settings: &Settings) -> Result<(), StoreError>;
}

/// TOML file store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `data_dir()/settings.toml`.
    pub fn default_location() -> Result<Self, StoreError> {
        Ok(Self::new(data_dir()?.join("settings.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_failed(&self, message: impl ToString) -> StoreError {
        StoreError::LoadFailed {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }

    fn save_failed(&self, message: impl ToString) -> StoreError {
        StoreError::SaveFailed {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

impl SettingsStore for FileStore {
    fn load(&self) -> Result<Settings, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => toml::from_str(&content).map_err(|e| self.load_failed(e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(self.load_failed(e)),
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        let content = toml::to_string_pretty(settings).map_err(|e| self.save_failed(e))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| self.save_failed(e))?;

        // Uniquely named sibling, renamed over the target.
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.save_failed(e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| self.save_failed(e))?;
        tmp.persist(&self.path).map_err(|e| self.save_failed(e.error))?;
        Ok(())
    }
}

/// In-memory store that counts saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<Settings>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.settings
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Settings, StoreError> {
        self.settings
            .lock()
            .map(|s| s.clone())
            .map_err(|e| StoreError::LoadFailed {
                path: PathBuf::from(":memory:"),
                message: e.to_string(),
            })
    }

    fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        let mut guard = self.settings.lock().map_err(|e| StoreError::SaveFailed {
            path: PathBuf::from(":memory:"),
            message: e.to_string(),
        })?;
        *guard = settings.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
