//! Workload run state machine.
//!
//! State transitions for one emulation session:
//! IDLE → RUNNING → COMPLETED | CANCELLED
//!
//! Terminal states hand control back to the dispatcher, which may start
//! another run directly from either of them.

use crate::error::{EmuError, EmuResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheduler states for the workload lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkloadState {
    /// No workload has been started.
    #[default]
    Idle,
    /// Pulse output armed; the polling loop owns the output.
    Running,
    /// Workload length elapsed.
    Completed,
    /// Operator cancelled the run.
    Cancelled,
}

impl fmt::Display for WorkloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Running => write!(f, "RUNNING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl WorkloadState {
    /// Check if a transition to `target` is valid from the current state.
    #[must_use]
    pub fn can_transition_to(&self, target: WorkloadState) -> bool {
        use WorkloadState::{Cancelled, Completed, Idle, Running};

        matches!(
            (self, target),
            (Idle, Running)
                | (Running, Completed)
                | (Running, Cancelled)
                // Re-entry by the dispatcher issuing another run
                | (Completed, Running)
                | (Cancelled, Running)
        )
    }

    /// Returns true while a run owns the pulse output.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// State machine wrapper that only moves along valid transitions.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: WorkloadState,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine starting in IDLE.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: WorkloadState::Idle,
        }
    }

    /// Get the current state.
    #[must_use]
    pub fn state(&self) -> WorkloadState {
        self.current
    }

    /// Attempt a state transition.
    pub fn transition(&mut self, target: WorkloadState) -> EmuResult<()> {
        if self.current.can_transition_to(target) {
            self.current = target;
            Ok(())
        } else {
            Err(EmuError::InvalidStateTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            })
        }
    }
}
