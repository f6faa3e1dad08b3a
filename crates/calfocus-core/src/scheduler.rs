//! Cycle scheduling: a periodic timer plus coalesced on-demand triggers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::activity::ActivitySensor;
use crate::cycle::Cycle;
use crate::presence::DeviceSignals;

/// How often the activity watcher samples the sensor.
pub const ACTIVITY_POLL_SECS: u64 = 5;

/// Why a cycle ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    ActivityChanged,
    TabChanged,
    Manual,
}

/// Requests cycles from anywhere. Requests made while one is already
/// pending collapse into that one; the latest trigger kind is reported.
#[derive(Debug, Clone, Default)]
pub struct TriggerHandle {
    notify: Arc<Notify>,
    pending: Arc<Mutex<Option<Trigger>>>,
}

impl TriggerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, trigger: Trigger) {
        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(trigger);
        }
        self.notify.notify_one();
    }

    /// Wait for the next request.
    pub async fn next_request(&self) -> Trigger {
        self.notify.notified().await;
        self.pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.take())
            .unwrap_or(Trigger::Manual)
    }
}

/// Drives [`Cycle`]s until shutdown.
pub struct Scheduler {
    cycle: Arc<Cycle>,
    triggers: TriggerHandle,
    interval: Duration,
}

impl Scheduler {
    pub fn new(cycle: Arc<Cycle>, interval: Duration) -> Self {
        Self {
            cycle,
            triggers: TriggerHandle::new(),
            interval,
        }
    }

    pub fn triggers(&self) -> TriggerHandle {
        self.triggers.clone()
    }

    /// Run until `shutdown` flips to true or its sender is dropped.
    ///
    /// The first timer tick fires immediately. Cycles run inline, so
    /// triggers arriving mid-cycle coalesce into a single follow-up run.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = self.interval.as_secs(), "scheduler started");

        loop {
            let trigger = tokio::select! {
                _ = ticker.tick() => Trigger::Timer,
                trigger = self.triggers.next_request() => trigger,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            };
            self.run_cycle(trigger).await;
        }
        info!("scheduler stopped");
    }

    async fn run_cycle(&self, trigger: Trigger) {
        debug!(?trigger, "cycle triggered");
        match self.cycle.run(Utc::now()).await {
            Ok(report) => debug!(
                in_meeting = report.decision.in_meeting,
                reason = %report.decision.reason,
                "cycle complete"
            ),
            Err(e) => error!(error = %e, "cycle failed"),
        }
    }
}

/// Trigger kind for a change between two samples, if any.
pub fn signal_change(previous: &DeviceSignals, current: &DeviceSignals) -> Option<Trigger> {
    if previous.active != current.active {
        Some(Trigger::ActivityChanged)
    } else if previous.active_tab_url != current.active_tab_url {
        Some(Trigger::TabChanged)
    } else {
        None
    }
}

/// Poll `sensor` every `poll` and request a cycle whenever idle state or
/// the active tab changes.
pub async fn watch_activity(
    sensor: Arc<dyn ActivitySensor>,
    idle_threshold: Duration,
    poll: Duration,
    triggers: TriggerHandle,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut previous = sensor.sample(idle_threshold).await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }
        let current = sensor.sample(idle_threshold).await;
        if let Some(trigger) = signal_change(&previous, &current) {
            debug!(?trigger, "device signals changed");
            triggers.request(trigger);
        }
        previous = current;
    }
}
