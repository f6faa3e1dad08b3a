//! Wiring from CLI options to core collaborators.

use std::path::PathBuf;
use std::sync::Arc;

use calfocus_core::activity::SystemSensor;
use calfocus_core::integrations::ClientCredentials;
use calfocus_core::storage::{Config, FileStore, Settings, SettingsStore};
use calfocus_core::{Cycle, FallbackActuator, GoogleCalendarProvider, StoreError};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub struct Context {
    settings_path: Option<PathBuf>,
}

impl Context {
    pub fn new(settings_path: Option<PathBuf>) -> Self {
        Self { settings_path }
    }

    pub fn store(&self) -> Result<FileStore, StoreError> {
        match &self.settings_path {
            Some(path) => Ok(FileStore::new(path)),
            None => FileStore::default_location(),
        }
    }

    pub fn load(&self) -> Result<Settings, StoreError> {
        self.store()?.load()
    }

    /// Apply `edit` to a freshly loaded document and save it.
    ///
    /// Edits must not hold a copy loaded earlier: the daemon may have saved
    /// focus state or refreshed tokens in the meantime.
    pub fn update<T>(&self, edit: impl FnOnce(&mut Settings) -> CliResult<T>) -> CliResult<T> {
        let store = self.store()?;
        let mut settings = store.load()?;
        let value = edit(&mut settings)?;
        store.save(&settings)?;
        Ok(value)
    }

    /// Client credentials from the keyring. A keyring that cannot be read
    /// is treated as "not configured".
    pub fn client_credentials(&self) -> Option<ClientCredentials> {
        ClientCredentials::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "cannot read OAuth client credentials");
            None
        })
    }

    pub fn provider(
        &self,
        client: Option<ClientCredentials>,
        config: &Config,
    ) -> CliResult<GoogleCalendarProvider> {
        Ok(GoogleCalendarProvider::new(client, config.request_timeout())?)
    }

    pub fn cycle(&self, client: Option<ClientCredentials>, config: &Config) -> CliResult<Cycle> {
        let provider = self.provider(client, config)?;
        Ok(Cycle::new(
            Arc::new(provider),
            Arc::new(SystemSensor),
            Arc::new(self.store()?),
            Arc::new(FallbackActuator::system_default()),
        ))
    }
}
