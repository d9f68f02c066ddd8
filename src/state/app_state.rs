//! Server-wide application state

use std::time::Instant;

use crate::services::IndicatorBoard;
use super::AlarmStateMachine;

/// State shared by every HTTP handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub panel: AlarmStateMachine,
    /// Last values written to indicator devices
    pub indicators: IndicatorBoard,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    pub fn new(panel: AlarmStateMachine, indicators: IndicatorBoard, port: u16, host: String) -> Self {
        Self {
            panel,
            indicators,
            start_time: Instant::now(),
            port,
            host,
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed().as_secs())
    }
}

fn format_uptime(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::format_uptime;

    #[test]
    fn uptime_uses_largest_unit() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(3 * 3600 + 61), "3h 1m 1s");
    }
}
