//! Turning an authorization code into a stored [`Account`].

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::oauth::AuthorizationCode;
use super::provider::{CalendarListEntry, CalendarProvider};
use crate::error::ProviderError;
use crate::storage::{Account, Calendar, Credentials};

/// Email used when the provider does not disclose the user's address.
pub fn placeholder_email() -> String {
    format!("account_{}@unknown", uuid::Uuid::new_v4().simple())
}

/// Calendars for a new account; only the primary one starts enabled.
pub fn calendars_from_list(entries: &[CalendarListEntry]) -> Vec<Calendar> {
    entries
        .iter()
        .map(|entry| Calendar {
            id: entry.id.clone(),
            display_name: entry.display_name(),
            enabled: entry.primary,
        })
        .collect()
}

/// Exchange `code`, identify the user and fetch their calendar list.
pub async fn enroll_account(
    provider: &dyn CalendarProvider,
    code: &AuthorizationCode,
    now: DateTime<Utc>,
) -> Result<Account, ProviderError> {
    let grant = provider.exchange_code(&code.code, &code.redirect_uri).await?;
    let credentials = Credentials::from_grant(grant, now);

    let email = match provider.user_email(&credentials.access_token).await {
        Ok(Some(email)) => email,
        Ok(None) => placeholder_email(),
        Err(e) => {
            warn!(error = %e, "could not identify account, using placeholder");
            placeholder_email()
        }
    };

    let entries = provider.list_calendars(&credentials.access_token).await?;
    debug!(%email, calendars = entries.len(), "account enrolled");

    Ok(Account {
        email,
        credentials: Some(credentials),
        calendars: calendars_from_list(&entries),
    })
}
