//! # calfocus Core Library
//!
//! This library decides whether the user is in a meeting right now, from
//! calendar free/busy data, event metadata and live device signals, and
//! switches a named focus mode on or off when that answer changes. The
//! `calfocus` CLI is a thin layer over the same core.
//!
//! ## Architecture
//!
//! - **Presence**: time-window matching, event policy, video-link detection,
//!   per-account checks and the aggregate decision
//! - **Focus**: the on/off state machine, actuators and the native bridge
//! - **Storage**: the whole-document TOML settings store and configuration
//! - **Integrations**: the calendar provider interface, Google implementation
//!   and OAuth flow
//! - **Scheduler**: periodic and signal-driven cycles, coalesced
//!
//! ## Key Components
//!
//! - [`Cycle`]: one serialized load/sense/decide/persist/actuate pass
//! - [`Scheduler`]: runs cycles on a timer and on demand
//! - [`CalendarProvider`]: trait for calendar backends
//! - [`Actuator`]: trait for focus mode switches
//! - [`Settings`]: the persisted document

pub mod activity;
pub mod cycle;
pub mod error;
pub mod focus;
pub mod integrations;
pub mod notify;
pub mod platform;
pub mod presence;
pub mod scheduler;
pub mod storage;

pub use activity::{ActivitySensor, IdleState, StaticSensor, SystemSensor};
pub use cycle::{Cycle, CycleReport};
pub use error::{
    ActuatorError, ConfigError, CoreError, OAuthError, ProviderError, StoreError,
};
pub use focus::{Actuator, FallbackActuator, FocusCommand, FocusMachine, Transition};
pub use integrations::{CalendarProvider, GoogleCalendarProvider};
pub use notify::{LogNotifier, NotificationKey, NotificationLimiter, Notifier};
pub use presence::{Decision, DeviceSignals};
pub use scheduler::{Scheduler, Trigger, TriggerHandle};
pub use storage::{Account, Calendar, Config, FileStore, FocusState, Settings, SettingsStore};
