//! Shared fakes for presence and cycle tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use calfocus_core::error::{ActuatorError, ProviderError};
use calfocus_core::focus::{Actuator, FocusCommand};
use calfocus_core::integrations::provider::{
    BusyInterval, CalendarEvent, CalendarListEntry, CalendarProvider, EventTime, TokenGrant,
};
use calfocus_core::notify::{NotificationKey, Notifier};
use calfocus_core::storage::{Account, Calendar, Credentials};

// ============================================================================
// Time helpers
// ============================================================================

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 30, 0).unwrap()
}

pub fn rfc(t: DateTime<Utc>) -> String {
    t.to_rfc3339()
}

/// Interval covering `now()`.
pub fn busy_now() -> BusyInterval {
    BusyInterval {
        start: "2025-03-10T12:00:00Z".into(),
        end: "2025-03-10T13:00:00Z".into(),
    }
}

/// Event covering `now()` with the given description.
pub fn event_now(description: &str) -> CalendarEvent {
    CalendarEvent {
        status: Some("confirmed".into()),
        start: Some(EventTime {
            date: None,
            date_time: Some("2025-03-10T12:00:00Z".into()),
        }),
        end: Some(EventTime {
            date: None,
            date_time: Some("2025-03-10T13:00:00Z".into()),
        }),
        description: Some(description.into()),
        ..CalendarEvent::default()
    }
}

pub fn meet_event_now() -> CalendarEvent {
    event_now("Join: https://meet.google.com/abc-defg-hij")
}

// ============================================================================
// Accounts
// ============================================================================

/// Account with a valid token `tok-<email>` and refresh token `rt-<email>`.
pub fn account(email: &str, calendars: &[(&str, bool)]) -> Account {
    Account {
        email: email.to_string(),
        credentials: Some(Credentials {
            access_token: format!("tok-{email}"),
            refresh_token: Some(format!("rt-{email}")),
            expires_at: now() + chrono::Duration::hours(1),
        }),
        calendars: calendars
            .iter()
            .map(|(id, enabled)| Calendar {
                id: id.to_string(),
                display_name: id.to_string(),
                enabled: *enabled,
            })
            .collect(),
    }
}

/// Same as [`account`] but with an access token that needs refreshing.
pub fn expiring_account(email: &str, calendars: &[(&str, bool)]) -> Account {
    let mut account = account(email, calendars);
    if let Some(credentials) = account.credentials.as_mut() {
        credentials.expires_at = now() + chrono::Duration::seconds(10);
    }
    account
}

// ============================================================================
// Fake calendar provider
// ============================================================================

/// Provider backed by in-memory tables keyed by calendar id.
#[derive(Default)]
pub struct FakeProvider {
    pub busy: HashMap<String, Vec<BusyInterval>>,
    pub events: HashMap<String, Vec<CalendarEvent>>,
    pub calendar_list: Vec<CalendarListEntry>,
    pub email: Option<String>,
    /// Refresh tokens the token endpoint rejects.
    pub rejected_refresh: HashSet<String>,
    /// Access tokens whose free/busy call fails.
    pub failing_free_busy: HashSet<String>,
    /// Calendars whose event listing fails.
    pub failing_events: HashSet<String>,
    /// Access tokens whose calls hang far past any timeout.
    pub hanging_tokens: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn with_busy(mut self, calendar_id: &str, intervals: Vec<BusyInterval>) -> Self {
        self.busy.insert(calendar_id.to_string(), intervals);
        self
    }

    pub fn with_events(mut self, calendar_id: &str, events: Vec<CalendarEvent>) -> Self {
        self.events.insert(calendar_id.to_string(), events);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn maybe_hang(&self, token: &str) {
        if self.hanging_tokens.contains(token) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }
}

#[async_trait]
impl CalendarProvider for FakeProvider {
    async fn free_busy(
        &self,
        access_token: &str,
        calendar_ids: &[String],
        _time_min: DateTime<Utc>,
        _time_max: DateTime<Utc>,
    ) -> Result<HashMap<String, Vec<BusyInterval>>, ProviderError> {
        self.record(format!("free_busy:{access_token}"));
        self.maybe_hang(access_token).await;
        if self.failing_free_busy.contains(access_token) {
            return Err(ProviderError::ProviderUnavailable {
                status: 500,
                message: "backend error".into(),
            });
        }
        Ok(calendar_ids
            .iter()
            .map(|id| (id.clone(), self.busy.get(id).cloned().unwrap_or_default()))
            .collect())
    }

    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        _time_min: DateTime<Utc>,
        _time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, ProviderError> {
        self.record(format!("list_events:{calendar_id}"));
        self.maybe_hang(access_token).await;
        if self.failing_events.contains(calendar_id) {
            return Err(ProviderError::ProviderUnavailable {
                status: 404,
                message: "not found".into(),
            });
        }
        Ok(self.events.get(calendar_id).cloned().unwrap_or_default())
    }

    async fn list_calendars(
        &self,
        _access_token: &str,
    ) -> Result<Vec<CalendarListEntry>, ProviderError> {
        Ok(self.calendar_list.clone())
    }

    async fn user_email(&self, _access_token: &str) -> Result<Option<String>, ProviderError> {
        Ok(self.email.clone())
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError> {
        self.record(format!("refresh:{refresh_token}"));
        if self.rejected_refresh.contains(refresh_token) {
            return Err(ProviderError::CredentialInvalid("invalid_grant".into()));
        }
        Ok(TokenGrant {
            access_token: format!("fresh-{refresh_token}"),
            refresh_token: None,
            expires_in: 3600,
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        _redirect_uri: &str,
    ) -> Result<TokenGrant, ProviderError> {
        Ok(TokenGrant {
            access_token: format!("tok-{code}"),
            refresh_token: Some(format!("rt-{code}")),
            expires_in: 3600,
        })
    }
}

// ============================================================================
// Fake actuator and notifier
// ============================================================================

#[derive(Default)]
pub struct RecordingActuator {
    pub fail: bool,
    pub calls: Mutex<Vec<(FocusCommand, String)>>,
}

impl RecordingActuator {
    pub fn calls(&self) -> Vec<(FocusCommand, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Actuator for RecordingActuator {
    async fn set_focus(&self, command: FocusCommand, focus_name: &str) -> Result<(), ActuatorError> {
        self.calls
            .lock()
            .unwrap()
            .push((command, focus_name.to_string()));
        // Yield so concurrently started cycles get a chance to interleave.
        tokio::task::yield_now().await;
        if self.fail {
            Err(ActuatorError::Failed("shortcut not found".into()))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<NotificationKey>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<NotificationKey> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, key: &NotificationKey, _message: &str) {
        self.sent.lock().unwrap().push(key.clone());
    }
}
