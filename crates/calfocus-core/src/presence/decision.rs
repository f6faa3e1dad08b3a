//! Aggregate "in a meeting?" decision across device signals and accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::account::{check_account, AccountOutcome, SkipReason};
use super::join_link::call_page_host;
use crate::integrations::provider::CalendarProvider;
use crate::storage::{Account, Config};

pub const REASON_DEVICE_IDLE: &str = "device idle";
pub const REASON_NO_MEETING: &str = "no meeting";

/// Live device state sampled at the start of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSignals {
    /// False when the device is idle or locked.
    pub active: bool,
    pub active_tab_url: Option<String>,
}

impl DeviceSignals {
    pub fn active() -> Self {
        Self {
            active: true,
            active_tab_url: None,
        }
    }

    pub fn with_tab(mut self, url: impl Into<String>) -> Self {
        self.active_tab_url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAccount {
    pub email: String,
    pub reason: SkipReason,
}

/// Outcome of one presence evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub in_meeting: bool,
    pub reason: String,
    /// Account whose calendar produced the meeting, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedAccount>,
    /// Set when an account check hit its deadline and later accounts were not consulted.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
}

impl Decision {
    fn new(in_meeting: bool, reason: impl Into<String>) -> Self {
        Self {
            in_meeting,
            reason: reason.into(),
            account: None,
            skipped: Vec::new(),
            timed_out: false,
        }
    }
}

/// Host of `url` when it is a known call provider's page.
pub fn call_page(url: Option<&str>) -> Option<String> {
    url.and_then(call_page_host)
}

/// Evaluate presence.
///
/// An idle device short-circuits to "not in a meeting" without any network
/// call. An active call page short-circuits to "in a meeting" when call-page
/// awareness is on. Otherwise accounts are consulted in order and the first
/// one in a meeting wins. Accounts may have their credentials refreshed.
pub async fn decide(
    provider: &dyn CalendarProvider,
    accounts: &mut [Account],
    now: DateTime<Utc>,
    config: &Config,
    signals: &DeviceSignals,
) -> Decision {
    if !signals.active {
        debug!("device idle, skipping calendar checks");
        return Decision::new(false, REASON_DEVICE_IDLE);
    }

    if config.call_page_awareness {
        if let Some(host) = call_page(signals.active_tab_url.as_deref()) {
            debug!(%host, "active tab is a call page");
            return Decision::new(true, format!("call page: {host}"));
        }
    }

    let mut decision = Decision::new(false, REASON_NO_MEETING);
    for account in accounts.iter_mut() {
        match check_account(provider, account, now, config).await {
            AccountOutcome::InMeeting => {
                decision.in_meeting = true;
                decision.reason = format!("meeting ({})", account.email);
                decision.account = Some(account.email.clone());
                return decision;
            }
            AccountOutcome::Free => {}
            AccountOutcome::Skipped(reason) => decision.skipped.push(SkippedAccount {
                email: account.email.clone(),
                reason,
            }),
            AccountOutcome::TimedOut => {
                warn!(account = %account.email, "provider timed out, abandoning remaining accounts");
                decision.timed_out = true;
                return decision;
            }
        }
    }
    decision
}
