//! External collaborators module
//!
//! This module contains the script actions and indicator devices the panel
//! drives on state transitions.

pub mod actions;
pub mod indicators;

use thiserror::Error;

// Re-export main types
pub use actions::{ActionInvoker, ScriptRunner};
pub use indicators::{Indicator, IndicatorBoard, IndicatorSink};

/// Failure of a fire-and-forget action or indicator call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("failed to start {target}: {reason}")]
    Spawn { target: String, reason: String },
}
