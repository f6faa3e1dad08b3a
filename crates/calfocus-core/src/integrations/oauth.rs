//! Lightweight OAuth2 Authorization Code flow for desktop use.
//!
//! 1. Binds a localhost listener for the redirect
//! 2. Opens the browser to the authorization URL with a random `state`
//! 3. Waits for the callback, verifies `state` and extracts the code
//!
//! Exchanging the code for tokens is the provider's job
//! ([`CalendarProvider::exchange_code`](super::provider::CalendarProvider::exchange_code)).

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::error::OAuthError;

/// How long `authorize` waits for the browser redirect.
pub const CALLBACK_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub service_name: String,
    pub client_id: String,
    pub auth_url: String,
    pub scopes: Vec<String>,
    pub redirect_port: u16,
}

impl OAuthConfig {
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.redirect_port)
    }

    pub fn auth_url_full(&self, state: &str) -> String {
        let scopes = self.scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt={}&state={}",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri()),
            urlencoding::encode(&scopes),
            urlencoding::encode("consent select_account"),
            urlencoding::encode(state),
        )
    }
}

/// Authorization code plus the redirect URI it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub redirect_uri: String,
}

/// Run the browser part of the flow and return the authorization code.
pub async fn authorize(config: &OAuthConfig) -> Result<AuthorizationCode, OAuthError> {
    let state = uuid::Uuid::new_v4().simple().to_string();

    // Bind before opening the browser so a fast redirect cannot be missed.
    let listener = TcpListener::bind(("127.0.0.1", config.redirect_port))
        .await
        .map_err(|e| OAuthError::AuthorizationFailed(format!("cannot listen for callback: {e}")))?;

    let auth_url = config.auth_url_full(&state);
    info!(service = %config.service_name, "opening browser for authorization");
    open::that(&auth_url).map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?;

    let code = tokio::time::timeout(
        Duration::from_secs(CALLBACK_TIMEOUT_SECS),
        accept_callback(&listener, &state),
    )
    .await
    .map_err(|_| OAuthError::CallbackTimeout {
        timeout_secs: CALLBACK_TIMEOUT_SECS,
    })??;

    Ok(AuthorizationCode {
        code,
        redirect_uri: config.redirect_uri(),
    })
}

async fn accept_callback(listener: &TcpListener, expected_state: &str) -> Result<String, OAuthError> {
    let io_err = |e: std::io::Error| OAuthError::InvalidCallback(e.to_string());

    let (mut stream, peer) = listener.accept().await.map_err(io_err)?;
    debug!(%peer, "received OAuth callback");
    let mut buf = [0u8; 4096];
    let n = stream.read(&mut buf).await.map_err(io_err)?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let result = parse_callback(&request, expected_state);
    let page = match &result {
        Ok(_) => "<h2>Authentication successful!</h2><p>You can close this tab.</p>",
        Err(_) => "<h2>Authentication failed.</h2><p>Return to the terminal for details.</p>",
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body>{page}</body></html>"
    );
    stream.write_all(response.as_bytes()).await.map_err(io_err)?;
    let _ = stream.shutdown().await;
    result
}

/// Extract the code from `GET /callback?code=...&state=...`.
pub fn parse_callback(request: &str, expected_state: &str) -> Result<String, OAuthError> {
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| OAuthError::InvalidCallback("empty request".into()))?;
    let url = url::Url::parse(&format!("http://localhost{path}"))
        .map_err(|e| OAuthError::InvalidCallback(e.to_string()))?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        return Err(OAuthError::AuthorizationFailed(error));
    }
    if param("state").as_deref() != Some(expected_state) {
        return Err(OAuthError::StateMismatch);
    }
    param("code")
        .filter(|c| !c.is_empty())
        .ok_or_else(|| OAuthError::InvalidCallback("no code in callback".into()))
}
