//! Calendar provider interface and its wire types.
//!
//! Field names follow the Google Calendar v3 JSON shapes. Timestamps are kept
//! as strings here and parsed at the point of use, so one malformed interval
//! or event never fails a whole response.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::presence::window::{self, parse_instant};
use crate::storage::Config;

/// One busy range from a free/busy response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: String,
    pub end: String,
}

impl BusyInterval {
    /// Padded overlap with `now`; unparseable bounds never match.
    pub fn overlaps(&self, now: DateTime<Utc>, config: &Config) -> bool {
        match (parse_instant(&self.start), parse_instant(&self.end)) {
            (Some(start), Some(end)) => {
                window::overlaps_now(start, end, now, config.lead_in(), config.lag_out())
            }
            _ => false,
        }
    }
}

/// `start` / `end` of an event: either a calendar date or a precise instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

impl EventTime {
    pub fn is_date_only(&self) -> bool {
        self.date.is_some() && self.date_time.is_none()
    }

    /// Absolute instant; date-only values resolve to midnight UTC.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.date_time
            .as_deref()
            .or(self.date.as_deref())
            .and_then(parse_instant)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPoint {
    #[serde(default)]
    pub entry_point_type: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceData {
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
}

/// A single (expanded) calendar event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// "confirmed", "tentative" or "cancelled".
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
    /// "opaque" (busy, the default) or "transparent" (free).
    #[serde(default)]
    pub transparency: Option<String>,
    #[serde(default)]
    pub conference_data: Option<ConferenceData>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hangout_link: Option<String>,
}

impl CalendarEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }

    pub fn is_transparent(&self) -> bool {
        self.transparency
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("transparent"))
    }

    pub fn is_all_day(&self) -> bool {
        matches!(
            (&self.start, &self.end),
            (Some(start), Some(end)) if start.is_date_only() && end.is_date_only()
        )
    }
}

/// Entry from the user's calendar list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub summary_override: Option<String>,
    #[serde(default)]
    pub primary: bool,
}

impl CalendarListEntry {
    pub fn display_name(&self) -> String {
        self.summary_override
            .clone()
            .or_else(|| self.summary.clone())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Token endpoint response, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

/// Longest access-token lifetime accepted from a token endpoint.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

impl TokenGrant {
    /// `expires_in` clamped to `0..=MAX_TOKEN_LIFETIME_SECS`.
    pub fn lifetime(&self) -> Duration {
        Duration::seconds(self.expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS))
    }
}

/// Calendar data provider reachable with bearer-token auth.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Busy intervals per requested calendar over `[time_min, time_max]`.
    async fn free_busy(
        &self,
        access_token: &str,
        calendar_ids: &[String],
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<HashMap<String, Vec<BusyInterval>>, ProviderError>;

    /// Single-instance events in the range, ascending by start time.
    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, ProviderError>;

    async fn list_calendars(
        &self,
        access_token: &str,
    ) -> Result<Vec<CalendarListEntry>, ProviderError>;

    /// Email of the authorized user, if the provider discloses it.
    async fn user_email(&self, access_token: &str) -> Result<Option<String>, ProviderError>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError>;

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant, ProviderError>;
}
