//! Controller lifecycle
//!
//! ```text
//! Uninitialized -> Ready -> Scanning <-> Idle -> Ready
//!        \___________\________\__________\______-> Stopped
//! ```

use crate::error::StateMachineError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// Not yet initialized, or initialization failed
    Uninitialized,
    /// Initial pass done, subscriptions live
    Ready,
    /// A pass is running
    Scanning,
    /// Waiting for the next trigger
    Idle,
    /// Shut down; terminal
    Stopped,
}

impl ControllerState {
    /// Lower-case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Scanning => "scanning",
            Self::Idle => "idle",
            Self::Stopped => "stopped",
        }
    }

    /// Whether passes may run in this state
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Ready | Self::Scanning | Self::Idle)
    }
}

impl Display for ControllerState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a transition against the table
///
/// # Errors
/// [`StateMachineError::IllegalTransition`] when `to` is not reachable
/// from `from`
pub fn validate_transition(
    from: ControllerState,
    to: ControllerState,
) -> Result<(), StateMachineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(StateMachineError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: ControllerState) -> Vec<ControllerState> {
    use ControllerState::{Idle, Ready, Scanning, Stopped, Uninitialized};
    match from {
        Uninitialized => vec![Ready, Stopped],
        Ready => vec![Scanning, Stopped],
        Scanning => vec![Idle, Stopped],
        Idle => vec![Scanning, Ready, Stopped],
        Stopped => vec![],
    }
}

fn allowed(from: ControllerState, to: ControllerState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
