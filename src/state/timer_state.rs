//! Pending timer bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tasks::TimerHandle;

/// What a pending timer commits when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPurpose {
    /// End of the arming delay
    Arm,
    /// End of the trigger window
    TriggerWindow,
}

/// The single timer the panel may own at a time
pub struct PendingTimer {
    pub generation: u64,
    pub purpose: TimerPurpose,
    pub deadline: DateTime<Utc>,
    pub handle: Box<dyn TimerHandle>,
}

impl PendingTimer {
    pub fn cancel(mut self) {
        self.handle.cancel();
    }

    pub fn state(&self) -> TimerState {
        TimerState::active(self.purpose, self.deadline)
    }
}

impl std::fmt::Debug for PendingTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTimer")
            .field("generation", &self.generation)
            .field("purpose", &self.purpose)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Observable view of the pending timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub active: bool,
    pub purpose: Option<TimerPurpose>,
    pub deadline: Option<DateTime<Utc>>,
}

impl TimerState {
    /// Create an active timer state
    pub fn active(purpose: TimerPurpose, deadline: DateTime<Utc>) -> Self {
        Self {
            active: true,
            purpose: Some(purpose),
            deadline: Some(deadline),
        }
    }

    /// Create an inactive timer state
    pub fn inactive() -> Self {
        Self {
            active: false,
            purpose: None,
            deadline: None,
        }
    }

    /// Seconds left until the deadline, if the timer is active
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> Option<u64> {
        if !self.active {
            return None;
        }
        self.deadline
            .map(|deadline| (deadline - now).num_seconds().max(0) as u64)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::inactive()
    }
}
