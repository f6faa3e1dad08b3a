//! Google Calendar provider.
//!
//! Read-only use of the Calendar v3 API: free/busy, event listing and the
//! calendar list, plus the OpenID userinfo endpoint and the OAuth2 token
//! endpoint. Every request goes through one `reqwest::Client` with a
//! per-request timeout.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::oauth::OAuthConfig;
use super::provider::{
    BusyInterval, CalendarEvent, CalendarListEntry, CalendarProvider, TokenGrant,
    MAX_TOKEN_LIFETIME_SECS,
};
use super::ClientCredentials;
use crate::error::ProviderError;

const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Default OAuth callback port for `account add`.
pub const OAUTH_REDIRECT_PORT: u16 = 19822;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Base URLs, overridable so tests can point at a local mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    pub api_base: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// All endpoints rooted at one base URL (e.g. a mockito server).
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api_base: base.to_string(),
            auth_url: format!("{base}/o/oauth2/v2/auth"),
            token_url: format!("{base}/token"),
            userinfo_url: format!("{base}/userinfo"),
        }
    }
}

/// Google Calendar provider.
pub struct GoogleCalendarProvider {
    http: Client,
    endpoints: GoogleEndpoints,
    client: Option<ClientCredentials>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<BusyInterval>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl GoogleCalendarProvider {
    /// Create a provider. `client` may be `None` when OAuth client
    /// credentials are not configured; token refresh then fails per account.
    pub fn new(client: Option<ClientCredentials>, timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoints: GoogleEndpoints::default(),
            client,
        })
    }

    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &GoogleEndpoints {
        &self.endpoints
    }

    /// OAuth settings for the interactive authorization-code flow.
    pub fn oauth_config(&self, redirect_port: u16) -> Option<OAuthConfig> {
        let client = self.client.as_ref()?;
        Some(OAuthConfig {
            service_name: "google".to_string(),
            client_id: client.client_id.clone(),
            auth_url: self.endpoints.auth_url.clone(),
            scopes: vec![
                CALENDAR_READONLY_SCOPE.to_string(),
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
            redirect_port,
        })
    }

    fn client_credentials(&self) -> Result<&ClientCredentials, ProviderError> {
        self.client.as_ref().ok_or_else(|| {
            ProviderError::CredentialInvalid("OAuth client credentials not configured".into())
        })
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenGrant, ProviderError> {
        let resp = self.http.post(&self.endpoints.token_url).form(params).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedResponse(format!("token response: {e}")))?;

        if !status.is_success() || parsed.error.is_some() {
            let reason = parsed
                .error_description
                .or(parsed.error)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(ProviderError::CredentialInvalid(reason));
        }

        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::CredentialInvalid("token response missing access_token".into()))?;

        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        if !(0..=MAX_TOKEN_LIFETIME_SECS).contains(&expires_in) {
            return Err(ProviderError::MalformedResponse(format!(
                "token response: expires_in {expires_in} out of range"
            )));
        }

        Ok(TokenGrant {
            access_token,
            refresh_token: parsed.refresh_token,
            expires_in,
        })
    }
}

/// Map non-success statuses to `ProviderUnavailable` and parse the body.
async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ProviderError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(ProviderError::ProviderUnavailable {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }
    serde_json::from_str(&body).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    async fn free_busy(
        &self,
        access_token: &str,
        calendar_ids: &[String],
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<HashMap<String, Vec<BusyInterval>>, ProviderError> {
        let body = json!({
            "timeMin": rfc3339(time_min),
            "timeMax": rfc3339(time_max),
            "items": calendar_ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>(),
        });

        let resp = self
            .http
            .post(format!("{}/freeBusy", self.endpoints.api_base))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;
        let parsed: FreeBusyResponse = read_json(resp).await?;

        Ok(parsed
            .calendars
            .into_iter()
            .map(|(id, cal)| {
                if !cal.errors.is_empty() {
                    debug!(calendar = %id, errors = ?cal.errors, "free/busy reported calendar errors");
                }
                (id, cal.busy)
            })
            .collect())
    }

    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, ProviderError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.endpoints.api_base,
            urlencoding::encode(calendar_id)
        );
        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", rfc3339(time_min)),
                ("timeMax", rfc3339(time_max)),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await?;
        let parsed: EventsResponse = read_json(resp).await?;
        Ok(parsed.items)
    }

    async fn list_calendars(
        &self,
        access_token: &str,
    ) -> Result<Vec<CalendarListEntry>, ProviderError> {
        let resp = self
            .http
            .get(format!("{}/users/me/calendarList", self.endpoints.api_base))
            .bearer_auth(access_token)
            .send()
            .await?;
        let parsed: CalendarListResponse = read_json(resp).await?;
        Ok(parsed.items)
    }

    async fn user_email(&self, access_token: &str) -> Result<Option<String>, ProviderError> {
        let resp = self
            .http
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;
        let info: UserInfo = read_json(resp).await?;
        Ok(info.email.filter(|e| !e.is_empty()))
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError> {
        let client = self.client_credentials()?;
        self.token_request(&[
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant, ProviderError> {
        let client = self.client_credentials()?;
        self.token_request(&[
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooted_endpoints_share_base() {
        let endpoints = GoogleEndpoints::rooted_at("http://127.0.0.1:1234/");
        assert_eq!(endpoints.api_base, "http://127.0.0.1:1234");
        assert_eq!(endpoints.token_url, "http://127.0.0.1:1234/token");
        assert_eq!(endpoints.userinfo_url, "http://127.0.0.1:1234/userinfo");
    }

    #[test]
    fn oauth_config_requires_client_credentials() {
        let provider = GoogleCalendarProvider::new(None, Duration::from_secs(5)).unwrap();
        assert!(provider.oauth_config(OAUTH_REDIRECT_PORT).is_none());

        let provider = GoogleCalendarProvider::new(
            Some(ClientCredentials {
                client_id: "cid".into(),
                client_secret: "secret".into(),
            }),
            Duration::from_secs(5),
        )
        .unwrap();
        let config = provider.oauth_config(OAUTH_REDIRECT_PORT).unwrap();
        assert_eq!(config.client_id, "cid");
        assert!(config.scopes.iter().any(|s| s.ends_with("calendar.readonly")));
    }

    #[test]
    fn rfc3339_uses_zulu_suffix() {
        use chrono::TimeZone;
        let t = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(rfc3339(t), "2025-03-10T12:00:00.000Z");
    }

    #[tokio::test]
    async fn refresh_without_client_credentials_is_credential_invalid() {
        let provider = GoogleCalendarProvider::new(None, Duration::from_secs(5)).unwrap();
        let err = provider.refresh_token("rt").await.unwrap_err();
        assert!(matches!(err, ProviderError::CredentialInvalid(_)));
    }
}
