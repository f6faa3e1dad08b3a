//! Focus on/off state machine.
//!
//! The machine only decides; persisting the new [`FocusState`] and invoking
//! the actuator are the caller's job, in that order.

use crate::presence::Decision;
use crate::storage::FocusState;

use super::actuator::FocusCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Decision matches the current state. Nothing to persist or actuate.
    Unchanged,
    Changed { command: FocusCommand, reason: String },
}

impl Transition {
    pub fn command(&self) -> Option<FocusCommand> {
        match self {
            Transition::Unchanged => None,
            Transition::Changed { command, .. } => Some(*command),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FocusMachine;

impl FocusMachine {
    /// Fold `decision` into `state`.
    ///
    /// Only a change of `is_on` is a transition; a new reason for the same
    /// state leaves `state` untouched.
    pub fn apply(state: &mut FocusState, decision: &Decision) -> Transition {
        if state.is_on == decision.in_meeting {
            return Transition::Unchanged;
        }
        state.is_on = decision.in_meeting;
        state.last_reason = decision.reason.clone();
        Transition::Changed {
            command: FocusCommand::from_state(decision.in_meeting),
            reason: decision.reason.clone(),
        }
    }
}
