//! Indicator devices mirroring the panel state

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::DispatchError;

/// Logical indicator driven by the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Armed,
    Alarm,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Armed => f.write_str("armed"),
            Indicator::Alarm => f.write_str("alarm"),
        }
    }
}

/// Fire-and-forget output for a configured indicator device
pub trait IndicatorSink: Send + Sync {
    fn set(&self, indicator: Indicator, device: &str, on: bool) -> Result<(), DispatchError>;
}

/// Remembers the last value sent to each device and optionally forwards it
/// to an external command as `<command> <device> on|off`.
#[derive(Debug, Clone, Default)]
pub struct IndicatorBoard {
    command: Option<String>,
    values: Arc<Mutex<BTreeMap<String, bool>>>,
}

impl IndicatorBoard {
    pub fn new(command: Option<String>) -> Self {
        Self {
            command,
            values: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Last value written to every device, keyed by device reference
    pub fn values(&self) -> BTreeMap<String, bool> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn value(&self, device: &str) -> Option<bool> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device)
            .copied()
    }
}

impl IndicatorSink for IndicatorBoard {
    fn set(&self, indicator: Indicator, device: &str, on: bool) -> Result<(), DispatchError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(device.to_string(), on);
        debug!("Indicator {} ({}) set to {}", indicator, device, on);

        let Some(command) = &self.command else {
            return Ok(());
        };

        let mut child = Command::new(command)
            .arg(device)
            .arg(if on { "on" } else { "off" })
            .spawn()
            .map_err(|e| DispatchError::Spawn {
                target: device.to_string(),
                reason: e.to_string(),
            })?;

        let device = device.to_string();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => info!("Indicator {} updated", device),
                Ok(status) => warn!(
                    "Indicator command for {} exited with code {}",
                    device,
                    status.code().unwrap_or(-1)
                ),
                Err(e) => warn!("Failed to wait for indicator command for {}: {}", device, e),
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_records_last_value_per_device() {
        let board = IndicatorBoard::new(None);
        board.set(Indicator::Armed, "light.porch", true).unwrap();
        board.set(Indicator::Alarm, "switch.siren", true).unwrap();
        board.set(Indicator::Armed, "light.porch", false).unwrap();

        assert_eq!(board.value("light.porch"), Some(false));
        assert_eq!(board.value("switch.siren"), Some(true));
        assert_eq!(board.value("switch.unknown"), None);
        assert_eq!(board.values().len(), 2);
    }

    #[tokio::test]
    async fn missing_indicator_command_still_records_value() {
        let board = IndicatorBoard::new(Some("/nonexistent/indicator-cmd".to_string()));
        let err = board.set(Indicator::Alarm, "switch.siren", true).unwrap_err();

        assert!(matches!(err, DispatchError::Spawn { .. }));
        assert_eq!(board.value("switch.siren"), Some(true));
    }
}
