//! One decision cycle: load settings, sense, decide, persist, actuate.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::activity::ActivitySensor;
use crate::error::CoreError;
use crate::focus::{Actuator, FocusMachine, Transition};
use crate::integrations::provider::CalendarProvider;
use crate::notify::{
    LogNotifier, NotificationKey, NotificationLimiter, Notifier, CREDENTIAL_FAILURE_THRESHOLD,
};
use crate::presence::{decide, Decision, SkipReason};
use crate::storage::{Account, SettingsStore};

/// What a cycle decided and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub decision: Decision,
    pub transition: Transition,
    /// Set when the transition's actuation failed on every path.
    pub actuator_error: Option<String>,
}

/// State carried between cycles.
#[derive(Debug, Default)]
struct CycleMemory {
    limiter: NotificationLimiter,
    refresh_failures: HashMap<String, u32>,
}

/// Runs decision cycles against a set of collaborators.
///
/// Cycles are serialized: a second caller waits until the first has
/// persisted and actuated, then sees its result as the current state.
pub struct Cycle {
    provider: Arc<dyn CalendarProvider>,
    sensor: Arc<dyn ActivitySensor>,
    store: Arc<dyn SettingsStore>,
    actuator: Arc<dyn Actuator>,
    notifier: Arc<dyn Notifier>,
    memory: Mutex<CycleMemory>,
}

impl Cycle {
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        sensor: Arc<dyn ActivitySensor>,
        store: Arc<dyn SettingsStore>,
        actuator: Arc<dyn Actuator>,
    ) -> Self {
        Self {
            provider,
            sensor,
            store,
            actuator,
            notifier: Arc::new(LogNotifier),
            memory: Mutex::new(CycleMemory::default()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn sensor(&self) -> Arc<dyn ActivitySensor> {
        Arc::clone(&self.sensor)
    }

    /// Run one full cycle.
    ///
    /// Only settings store failures are errors; provider and actuator
    /// problems are logged and reflected in the report.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<CycleReport, CoreError> {
        let mut memory = self.memory.lock().await;

        let mut settings = self.store.load()?;
        let config = settings.config.clone();
        let signals = self.sensor.sample(config.idle_threshold()).await;
        debug!(active = signals.active, tab = ?signals.active_tab_url, "device sampled");

        let accounts_before = settings.accounts.clone();
        let decision = decide(
            self.provider.as_ref(),
            &mut settings.accounts,
            now,
            &config,
            &signals,
        )
        .await;
        debug!(in_meeting = decision.in_meeting, reason = %decision.reason, "presence decided");

        self.track_credential_health(&mut memory, &accounts_before, &settings.accounts, &decision, now);

        let transition = FocusMachine::apply(&mut settings.focus, &decision);
        if transition != Transition::Unchanged || settings.accounts != accounts_before {
            self.store.save(&settings)?;
        }

        let actuator_error = match &transition {
            Transition::Unchanged => None,
            Transition::Changed { command, reason } => {
                info!(%command, %reason, focus = %config.focus_name, "focus transition");
                match self.actuator.set_focus(*command, &config.focus_name).await {
                    Ok(()) => None,
                    Err(e) => {
                        warn!(error = %e, %command, "focus actuation failed");
                        Some(e.to_string())
                    }
                }
            }
        };

        Ok(CycleReport {
            decision,
            transition,
            actuator_error,
        })
    }

    /// Evaluate presence without persisting or actuating anything.
    pub async fn run_dry(&self, now: DateTime<Utc>) -> Result<Decision, CoreError> {
        let _memory = self.memory.lock().await;
        let settings = self.store.load()?;
        let signals = self.sensor.sample(settings.config.idle_threshold()).await;
        let mut accounts = settings.accounts;
        Ok(decide(self.provider.as_ref(), &mut accounts, now, &settings.config, &signals).await)
    }

    /// Send `key`'s alert unless it fired within the cooldown.
    pub async fn alert(&self, key: NotificationKey, now: DateTime<Utc>) {
        let mut memory = self.memory.lock().await;
        self.alert_locked(&mut memory, &key, now);
    }

    fn alert_locked(&self, memory: &mut CycleMemory, key: &NotificationKey, now: DateTime<Utc>) {
        if memory.limiter.should_send(key, now) {
            self.notifier.notify(key, &key.message());
        }
    }

    fn track_credential_health(
        &self,
        memory: &mut CycleMemory,
        before: &[Account],
        after: &[Account],
        decision: &Decision,
        now: DateTime<Utc>,
    ) {
        for (old, new) in before.iter().zip(after) {
            if old.credentials != new.credentials {
                memory.refresh_failures.remove(&new.email);
                memory
                    .limiter
                    .reset(&NotificationKey::CredentialInvalid(new.email.clone()));
            }
        }

        for skipped in &decision.skipped {
            if !matches!(
                skipped.reason,
                SkipReason::CredentialInvalid | SkipReason::CredentialExpired
            ) {
                continue;
            }
            let failures = memory
                .refresh_failures
                .entry(skipped.email.clone())
                .or_insert(0);
            *failures += 1;
            if *failures >= CREDENTIAL_FAILURE_THRESHOLD {
                let key = NotificationKey::CredentialInvalid(skipped.email.clone());
                self.alert_locked(memory, &key, now);
            }
        }
    }
}
