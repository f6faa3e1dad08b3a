//! Focus mode control: actuators, the on/off state machine and the
//! native-messaging bridge.

pub mod actuator;
pub mod bridge;
pub mod machine;

pub use actuator::{
    Actuator, FallbackActuator, FocusCommand, ShortcutsActuator, UrlSchemeActuator,
};
pub use machine::{FocusMachine, Transition};
