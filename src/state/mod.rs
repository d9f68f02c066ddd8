//! State management module
//! 
//! This module contains the alarm modes, the pending timer bookkeeping and
//! the panel state machine that drives both.

pub mod alarm_mode;
pub mod app_state;
pub mod error;
pub mod panel;
pub mod snapshot;
pub mod timer_state;

// Re-export main types
pub use alarm_mode::{AlarmMode, ArmTarget};
pub use app_state::AppState;
pub use error::AlarmError;
pub use panel::AlarmStateMachine;
pub use snapshot::PanelSnapshot;
pub use timer_state::{PendingTimer, TimerPurpose, TimerState};
