//! Synthetic Alarm - a software alarm panel for home automation
//! 
//! This library provides the alarm state machine (arming delays, trigger
//! windows, code checks), the collaborators it drives on transitions
//! (scripts and indicator devices) and an HTTP surface to command it.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, PanelConfig};
pub use state::{AlarmError, AlarmMode, AlarmStateMachine, AppState, ArmTarget};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
