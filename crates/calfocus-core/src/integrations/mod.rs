pub mod enroll;
pub mod google;
pub mod oauth;
pub mod provider;

pub use enroll::enroll_account;
pub use google::{GoogleCalendarProvider, GoogleEndpoints};
pub use provider::{
    BusyInterval, CalendarEvent, CalendarListEntry, CalendarProvider, EventTime, TokenGrant,
};

use crate::error::OAuthError;

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "calfocus";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// OAuth client id/secret registered with the calendar provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    const CLIENT_ID_KEY: &'static str = "google_client_id";
    const CLIENT_SECRET_KEY: &'static str = "google_client_secret";

    /// Load from the keyring. `Ok(None)` when either half is missing.
    pub fn load() -> Result<Option<Self>, OAuthError> {
        let keyring_err = |e: keyring::Error| OAuthError::Keyring(e.to_string());
        let client_id = keyring_store::get(Self::CLIENT_ID_KEY).map_err(keyring_err)?;
        let client_secret = keyring_store::get(Self::CLIENT_SECRET_KEY).map_err(keyring_err)?;
        Ok(match (client_id, client_secret) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(Self {
                    client_id,
                    client_secret,
                })
            }
            _ => None,
        })
    }

    /// Persist to the keyring.
    pub fn save(&self) -> Result<(), OAuthError> {
        keyring_store::set(Self::CLIENT_ID_KEY, &self.client_id)
            .and_then(|()| keyring_store::set(Self::CLIENT_SECRET_KEY, &self.client_secret))
            .map_err(|e| OAuthError::Keyring(e.to_string()))
    }

    /// Remove from the keyring.
    pub fn delete() -> Result<(), OAuthError> {
        keyring_store::delete(Self::CLIENT_ID_KEY)
            .and_then(|()| keyring_store::delete(Self::CLIENT_SECRET_KEY))
            .map_err(|e| OAuthError::Keyring(e.to_string()))
    }
}
