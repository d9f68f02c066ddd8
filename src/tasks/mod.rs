//! Background tasks module
//! 
//! This module contains timer scheduling and the tasks that run alongside
//! the HTTP server.

pub mod scheduler;
pub mod state_reporter;

// Re-export main types and functions
pub use scheduler::{ManualScheduler, Scheduler, TimerCallback, TimerHandle, TokioScheduler};
pub use state_reporter::state_reporter_task;
