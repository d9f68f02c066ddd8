//! Mode transition reporter background task

use tracing::{debug, info};

use crate::state::{AlarmMode, AlarmStateMachine};

/// Background task that logs every mode transition until the panel is dropped
pub async fn state_reporter_task(panel: AlarmStateMachine) {
    info!("Starting state reporter task");

    let mut rx = panel.subscribe();
    let mut last_mode: AlarmMode = rx.borrow_and_update().mode;
    // The task must not keep the panel alive on its own.
    drop(panel);

    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        if snapshot.mode != last_mode {
            info!(
                "Panel state changed: {} -> {} (command={:?})",
                last_mode.platform_state(),
                snapshot.state,
                snapshot.last_command
            );
            last_mode = snapshot.mode;
        } else {
            debug!("Panel snapshot refreshed in {}", snapshot.state);
        }
    }

    info!("State reporter task stopped, panel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{
        config::PanelConfig,
        services::{IndicatorBoard, ScriptRunner},
        tasks::ManualScheduler,
    };

    #[tokio::test]
    async fn reporter_stops_when_panel_is_dropped() {
        let config = PanelConfig {
            delay_time: 0,
            ..PanelConfig::default()
        };
        let panel = AlarmStateMachine::new(
            config,
            Arc::new(ScriptRunner::new("scripts")),
            Arc::new(IndicatorBoard::new(None)),
            Arc::new(ManualScheduler::new()),
        )
        .unwrap();

        let reporter = tokio::spawn(state_reporter_task(panel.clone()));
        panel.arm_home(None).unwrap();
        panel.disarm(None).unwrap();
        drop(panel);

        tokio::time::timeout(std::time::Duration::from_secs(5), reporter)
            .await
            .expect("reporter did not stop")
            .unwrap();
    }
}
