//! Core error types for calfocus-core.
//!
//! This module defines the error hierarchy using thiserror. Only
//! [`StoreError`] is allowed to abort a decision cycle; provider and
//! actuator failures are logged and the affected account, calendar or
//! actuation is skipped.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for calfocus-core.
///
/// Only settings persistence can fail a whole cycle; everything else is
/// absorbed into the decision or the cycle report.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings persistence errors
    #[error("Settings store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key is not a recognized option
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Settings store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read or parse the settings document
    #[error("Failed to load settings from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to serialize or write the settings document
    #[error("Failed to save settings to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// OAuth-specific errors.
#[derive(Error, Debug)]
pub enum OAuthError {
    /// Authorization failed
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Callback timeout
    #[error("OAuth callback timeout: no callback received within {timeout_secs} seconds")]
    CallbackTimeout { timeout_secs: u64 },

    /// Invalid callback
    #[error("Invalid OAuth callback: {0}")]
    InvalidCallback(String),

    /// The `state` parameter returned by the provider did not match
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// Credentials not configured
    #[error("OAuth credentials not configured for {service}")]
    CredentialsNotConfigured { service: String },

    /// Credential storage failure
    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Calendar provider errors.
///
/// `CredentialInvalid` is recoverable on the next cycle; everything else is
/// treated as the provider being unavailable.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Token refresh or exchange was rejected
    #[error("Credential rejected: {0}")]
    CredentialInvalid(String),

    /// Non-success HTTP status
    #[error("Provider returned HTTP {status}: {message}")]
    ProviderUnavailable { status: u16, message: String },

    /// Unparseable payload
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Call exceeded its deadline
    #[error("Provider request timed out")]
    Timeout,

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<tokio::time::error::Elapsed> for ProviderError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ProviderError::Timeout
    }
}

/// Focus actuator errors.
#[derive(Error, Debug)]
pub enum ActuatorError {
    /// The actuator channel could not be reached at all
    #[error("Actuator unreachable: {0}")]
    Unreachable(String),

    /// The actuator ran but reported failure
    #[error("Actuator failed: {0}")]
    Failed(String),

    /// The actuator did not finish in time
    #[error("Actuator timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

impl ActuatorError {
    /// Whether the secondary actuation path should be attempted.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            ActuatorError::Unreachable(_) | ActuatorError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_unreachable_and_timeout_trigger_fallback() {
        assert!(ActuatorError::Unreachable("missing".into()).is_unreachable());
        assert!(ActuatorError::Timeout { timeout_secs: 5 }.is_unreachable());
        assert!(!ActuatorError::Failed("exit 1".into()).is_unreachable());
    }

    #[test]
    fn store_error_converts_into_core_error() {
        let err: CoreError = StoreError::DataDir("no home".into()).into();
        assert!(err.to_string().contains("no home"));
    }
}
