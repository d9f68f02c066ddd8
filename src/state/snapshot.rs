//! Observable panel state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AlarmMode, ArmTarget, TimerState};

/// Point-in-time view of the panel, published on every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSnapshot {
    pub mode: AlarmMode,
    /// Frontend state string (`arming` for both arming modes)
    pub state: String,
    pub is_armed: bool,
    pub is_triggered: bool,
    pub triggered_from: Option<ArmTarget>,
    pub timer: TimerState,
    pub last_command: Option<String>,
    pub last_command_time: Option<DateTime<Utc>>,
    pub changed_at: DateTime<Utc>,
}

impl PanelSnapshot {
    pub fn initial() -> Self {
        Self {
            mode: AlarmMode::Disarmed,
            state: AlarmMode::Disarmed.to_string(),
            is_armed: false,
            is_triggered: false,
            triggered_from: None,
            timer: TimerState::inactive(),
            last_command: None,
            last_command_time: None,
            changed_at: Utc::now(),
        }
    }
}

impl Default for PanelSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}
