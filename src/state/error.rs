//! Error types for panel commands and setup

use thiserror::Error;

use super::AlarmMode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlarmError {
    /// Code was missing or did not match the configured one
    #[error("invalid code")]
    InvalidCode,

    /// Command is not valid in the current mode
    #[error("cannot {command} while {mode:?}")]
    InvalidState {
        command: &'static str,
        mode: AlarmMode,
    },

    /// Rejected at setup, the panel is never created
    #[error("configuration error: {0}")]
    Configuration(String),
}
