//! Presence check for a single account.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::event_filter::is_busy_relevant;
use super::join_link::has_join_link;
use crate::error::ProviderError;
use crate::integrations::provider::CalendarProvider;
use crate::storage::{Account, Config};

/// Why an account did not contribute to the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoCredentials,
    /// Token expired and there is no refresh token to renew it.
    CredentialExpired,
    /// The token endpoint rejected the refresh.
    CredentialInvalid,
    NoCalendars,
    ProviderUnavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoCredentials => "not signed in",
            SkipReason::CredentialExpired => "credentials expired",
            SkipReason::CredentialInvalid => "credentials rejected",
            SkipReason::NoCalendars => "no calendars enabled",
            SkipReason::ProviderUnavailable => "calendar provider unavailable",
        };
        f.write_str(text)
    }
}

/// Result of checking one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOutcome {
    InMeeting,
    Free,
    Skipped(SkipReason),
    /// A provider call hit its deadline; the caller stops checking accounts.
    TimedOut,
}

impl AccountOutcome {
    pub fn is_in_meeting(self) -> bool {
        matches!(self, AccountOutcome::InMeeting)
    }
}

/// Bound one provider call by the configured request timeout.
async fn bounded<T>(
    config: &Config,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    tokio::time::timeout(config.request_timeout(), call).await?
}

/// Decide whether `account` is in a meeting at `now`.
///
/// Refreshes the access token in place when it is about to expire, so the
/// caller must persist `account` afterwards. Provider failures never escape:
/// they become [`AccountOutcome::Skipped`] for the account, or are logged and
/// skip a single calendar during event confirmation.
pub async fn check_account(
    provider: &dyn CalendarProvider,
    account: &mut Account,
    now: DateTime<Utc>,
    config: &Config,
) -> AccountOutcome {
    let Some(credentials) = account.credentials.as_mut() else {
        debug!(account = %account.email, "no credentials, skipping");
        return AccountOutcome::Skipped(SkipReason::NoCredentials);
    };

    if credentials.needs_refresh(now) {
        let Some(refresh_token) = credentials.refresh_token.clone() else {
            warn!(account = %account.email, "access token expired and no refresh token");
            return AccountOutcome::Skipped(SkipReason::CredentialExpired);
        };
        match bounded(config, provider.refresh_token(&refresh_token)).await {
            Ok(grant) => {
                credentials.apply_grant(grant, now);
                debug!(account = %account.email, "access token refreshed");
            }
            Err(ProviderError::Timeout) => return AccountOutcome::TimedOut,
            Err(e) => {
                warn!(account = %account.email, error = %e, "token refresh failed, skipping account");
                return AccountOutcome::Skipped(SkipReason::CredentialInvalid);
            }
        }
    }
    let token = credentials.access_token.clone();

    let calendar_ids = account.enabled_calendar_ids();
    if calendar_ids.is_empty() {
        debug!(account = %account.email, "no enabled calendars");
        return AccountOutcome::Skipped(SkipReason::NoCalendars);
    }

    let (time_min, time_max) = config.query_window(now);
    let busy = match bounded(
        config,
        provider.free_busy(&token, &calendar_ids, time_min, time_max),
    )
    .await
    {
        Ok(busy) => busy,
        Err(ProviderError::Timeout) => return AccountOutcome::TimedOut,
        Err(e) => {
            warn!(account = %account.email, error = %e, "free/busy query failed, skipping account");
            return AccountOutcome::Skipped(SkipReason::ProviderUnavailable);
        }
    };

    let busy_calendars: Vec<&String> = calendar_ids
        .iter()
        .filter(|id| {
            busy.get(*id)
                .is_some_and(|intervals| intervals.iter().any(|i| i.overlaps(now, config)))
        })
        .collect();

    if busy_calendars.is_empty() {
        return AccountOutcome::Free;
    }
    debug!(account = %account.email, busy = busy_calendars.len(), "busy calendars found");
    if !config.require_video_link {
        return AccountOutcome::InMeeting;
    }

    for calendar_id in busy_calendars {
        match bounded(
            config,
            provider.list_events(&token, calendar_id, time_min, time_max),
        )
        .await
        {
            Ok(events) => {
                if events
                    .iter()
                    .any(|e| is_busy_relevant(e, now, config) && has_join_link(e))
                {
                    return AccountOutcome::InMeeting;
                }
            }
            Err(ProviderError::Timeout) => return AccountOutcome::TimedOut,
            Err(e) => {
                warn!(account = %account.email, calendar = %calendar_id, error = %e, "event listing failed, skipping calendar");
            }
        }
    }

    AccountOutcome::Free
}
