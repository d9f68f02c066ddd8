//! The alarm panel state machine

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    config::{ActionEvent, PanelConfig},
    services::{ActionInvoker, Indicator, IndicatorSink},
    tasks::Scheduler,
};
use super::{
    AlarmError, AlarmMode, ArmTarget, PanelSnapshot, PendingTimer, TimerPurpose, TimerState,
};

/// Mutable panel state, only touched with the lock held
#[derive(Debug, Default)]
struct PanelState {
    mode: AlarmMode,
    triggered_from: Option<ArmTarget>,
    pending: Option<PendingTimer>,
    next_generation: u64,
    last_command: Option<String>,
    last_command_time: Option<DateTime<Utc>>,
    /// Side effects queued by the current transition, run once the lock is released
    effects: Vec<Effect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Action(ActionEvent),
    Indicator(Indicator, bool),
}

struct Inner {
    config: PanelConfig,
    actions: Arc<dyn ActionInvoker>,
    indicators: Arc<dyn IndicatorSink>,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<PanelState>,
    snapshot_tx: watch::Sender<PanelSnapshot>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = state.pending.take() {
            pending.cancel();
        }
    }
}

/// Alarm panel that owns the current mode and its single pending timer.
///
/// Commands and timer callbacks are serialized by one lock. Clones share the
/// same panel. Actions and indicator updates are queued under the lock and run
/// after it is released; they are fire-and-forget, so a failure is logged and
/// the transition stands.
#[derive(Clone)]
pub struct AlarmStateMachine {
    inner: Arc<Inner>,
}

impl AlarmStateMachine {
    /// Create a disarmed panel. Fails if the configuration is out of bounds.
    pub fn new(
        config: PanelConfig,
        actions: Arc<dyn ActionInvoker>,
        indicators: Arc<dyn IndicatorSink>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, AlarmError> {
        config.validate()?;
        info!(
            "Creating alarm panel {} (delay={}s, trigger={}s, code={})",
            config.name,
            config.delay_time,
            config.trigger_time,
            if config.has_code() { "set" } else { "none" }
        );

        let (snapshot_tx, _) = watch::channel(PanelSnapshot::initial());
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                actions,
                indicators,
                scheduler,
                state: Mutex::new(PanelState::default()),
                snapshot_tx,
            }),
        })
    }

    pub fn config(&self) -> &PanelConfig {
        &self.inner.config
    }

    pub fn arm_home(&self, code: Option<&str>) -> Result<AlarmMode, AlarmError> {
        self.arm(ArmTarget::Home, code)
    }

    pub fn arm_away(&self, code: Option<&str>) -> Result<AlarmMode, AlarmError> {
        self.arm(ArmTarget::Away, code)
    }

    /// Arm towards `target`, immediately or after the configured delay.
    /// Returns the mode the panel is in afterwards.
    pub fn arm(&self, target: ArmTarget, code: Option<&str>) -> Result<AlarmMode, AlarmError> {
        let config = &self.inner.config;
        let mut state = self.lock();

        if config.code_arm_required && !self.code_matches(code) {
            warn!("Invalid code provided for arming {}", target);
            return Err(AlarmError::InvalidCode);
        }

        let command = match target {
            ArmTarget::Home => "arm_home",
            ArmTarget::Away => "arm_away",
        };
        match state.mode {
            AlarmMode::Triggered => {
                return Err(AlarmError::InvalidState {
                    command,
                    mode: state.mode,
                });
            }
            mode if mode == target.arming_mode() => {
                debug!("Already arming {}, keeping the pending timer", target);
                return Ok(mode);
            }
            mode if mode == target.armed_mode() => {
                debug!("Already armed {}", target);
                return Ok(mode);
            }
            _ => {}
        }

        self.cancel_pending(&mut state);
        self.record_command(&mut state, command);

        if config.delay_time == 0 {
            self.commit_arm(&mut state, target);
        } else {
            info!("Arming {} in {}s", target, config.delay_time);
            if state.mode.is_armed() {
                // Switching targets: not armed again until the delay ends.
                self.set_indicator(&mut state, Indicator::Armed, false);
            }
            state.mode = target.arming_mode();
            self.schedule(&mut state, TimerPurpose::Arm, config.delay());
        }

        Ok(self.finish(state))
    }

    /// Disarm from any mode. The code is required whenever one is configured.
    pub fn disarm(&self, code: Option<&str>) -> Result<AlarmMode, AlarmError> {
        let mut state = self.lock();

        if self.inner.config.has_code() && !self.code_matches(code) {
            warn!("Invalid code provided for disarming");
            return Err(AlarmError::InvalidCode);
        }

        if state.mode == AlarmMode::Disarmed {
            debug!("Disarm while already disarmed");
            return Ok(AlarmMode::Disarmed);
        }

        let family = match state.mode {
            AlarmMode::Triggered => state.triggered_from,
            mode => mode.family(),
        };
        info!("Disarming from {:?}", state.mode);

        self.cancel_pending(&mut state);
        self.record_command(&mut state, "disarm");
        state.mode = AlarmMode::Disarmed;
        state.triggered_from = None;

        match family {
            Some(ArmTarget::Home) => self.run_action(&mut state, ActionEvent::DisarmHome),
            Some(ArmTarget::Away) => self.run_action(&mut state, ActionEvent::DisarmAway),
            None => {}
        }
        self.set_indicator(&mut state, Indicator::Armed, false);
        self.set_indicator(&mut state, Indicator::Alarm, false);

        Ok(self.finish(state))
    }

    /// Sensor trip. Valid while armed; while triggered it restarts the window.
    pub fn trigger(&self) -> Result<AlarmMode, AlarmError> {
        let config = &self.inner.config;
        let mut state = self.lock();

        let from = match (state.mode, state.triggered_from) {
            (AlarmMode::ArmedHome, _) => ArmTarget::Home,
            (AlarmMode::ArmedAway, _) => ArmTarget::Away,
            (AlarmMode::Triggered, Some(from)) => from,
            (mode, _) => {
                debug!("Ignoring trigger while {:?}", mode);
                return Err(AlarmError::InvalidState {
                    command: "trigger",
                    mode,
                });
            }
        };

        self.cancel_pending(&mut state);
        self.record_command(&mut state, "trigger");

        if config.trigger_time == 0 {
            // Zero-length window: pulse the alarm and stay armed.
            warn!("Alarm triggered while armed {} (no trigger window)", from);
            self.set_indicator(&mut state, Indicator::Alarm, true);
            self.set_indicator(&mut state, Indicator::Alarm, false);
            return Ok(self.finish(state));
        }

        if state.mode == AlarmMode::Triggered {
            info!("Re-triggered, restarting {}s alarm window", config.trigger_time);
        } else {
            warn!(
                "Alarm triggered while armed {}, alarm window {}s",
                from, config.trigger_time
            );
            state.mode = AlarmMode::Triggered;
            state.triggered_from = Some(from);
            self.set_indicator(&mut state, Indicator::Alarm, true);
        }
        self.schedule(&mut state, TimerPurpose::TriggerWindow, config.trigger_window());

        Ok(self.finish(state))
    }

    pub fn current_state(&self) -> AlarmMode {
        self.lock().mode
    }

    pub fn is_armed(&self) -> bool {
        self.current_state().is_armed()
    }

    pub fn is_triggered(&self) -> bool {
        self.current_state().is_triggered()
    }

    /// Whether a timer is scheduled and has neither fired nor been cancelled
    pub fn has_pending_timer(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Current time on the scheduler's clock, the clock timer deadlines use
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.scheduler.now()
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receive a new snapshot on every change
    pub fn subscribe(&self) -> watch::Receiver<PanelSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Tear the panel down, cancelling any pending timer
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if state.pending.is_some() {
            info!("Cancelling pending timer on shutdown");
        }
        self.cancel_pending(&mut state);
        self.publish(&state);
    }

    fn on_timer_fired(&self, generation: u64) {
        let mut state = self.lock();

        let pending = match state.pending.take() {
            Some(pending) if pending.generation == generation => pending,
            other => {
                debug!("Ignoring stale timer {}", generation);
                state.pending = other;
                return;
            }
        };

        match (pending.purpose, state.mode, state.triggered_from) {
            (TimerPurpose::Arm, AlarmMode::ArmingHome, _) => {
                self.commit_arm(&mut state, ArmTarget::Home)
            }
            (TimerPurpose::Arm, AlarmMode::ArmingAway, _) => {
                self.commit_arm(&mut state, ArmTarget::Away)
            }
            (TimerPurpose::TriggerWindow, AlarmMode::Triggered, Some(from)) => {
                info!("Alarm window closed, returning to armed {}", from);
                state.mode = from.armed_mode();
                state.triggered_from = None;
                self.set_indicator(&mut state, Indicator::Alarm, false);
            }
            (purpose, mode, _) => {
                warn!("Timer {:?} fired in unexpected mode {:?}", purpose, mode);
            }
        }

        self.finish(state);
    }

    fn commit_arm(&self, state: &mut PanelState, target: ArmTarget) {
        info!("Alarm armed {}", target);
        state.mode = target.armed_mode();
        state.triggered_from = None;
        let event = match target {
            ArmTarget::Home => ActionEvent::ArmHome,
            ArmTarget::Away => ActionEvent::ArmAway,
        };
        self.run_action(state, event);
        self.set_indicator(state, Indicator::Armed, true);
    }

    fn schedule(&self, state: &mut PanelState, purpose: TimerPurpose, delay: Duration) {
        let generation = state.next_generation;
        state.next_generation += 1;

        let panel: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = self.inner.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(inner) = panel.upgrade() {
                    AlarmStateMachine { inner }.on_timer_fired(generation);
                }
            }),
        );

        let deadline = self.inner.scheduler.now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
        state.pending = Some(PendingTimer {
            generation,
            purpose,
            deadline,
            handle,
        });
    }

    fn cancel_pending(&self, state: &mut PanelState) {
        if let Some(pending) = state.pending.take() {
            debug!("Cancelling pending {:?} timer {}", pending.purpose, pending.generation);
            pending.cancel();
        }
    }

    fn record_command(&self, state: &mut PanelState, command: &str) {
        state.last_command = Some(command.to_string());
        state.last_command_time = Some(self.inner.scheduler.now());
    }

    fn code_matches(&self, supplied: Option<&str>) -> bool {
        let code = &self.inner.config.code;
        code.is_empty() || supplied == Some(code.as_str())
    }

    fn run_action(&self, state: &mut PanelState, event: ActionEvent) {
        state.effects.push(Effect::Action(event));
    }

    fn set_indicator(&self, state: &mut PanelState, indicator: Indicator, on: bool) {
        state.effects.push(Effect::Indicator(indicator, on));
    }

    /// Publish the new state, release the lock, then run the queued effects.
    /// Returns the mode the transition ended in.
    fn finish(&self, mut state: MutexGuard<'_, PanelState>) -> AlarmMode {
        self.publish(&state);
        let mode = state.mode;
        let effects = std::mem::take(&mut state.effects);
        drop(state);

        for effect in effects {
            match effect {
                Effect::Action(event) => self.dispatch_action(event),
                Effect::Indicator(indicator, on) => self.dispatch_indicator(indicator, on),
            }
        }
        mode
    }

    fn dispatch_action(&self, event: ActionEvent) {
        let Some(action) = self.inner.config.actions.get(event) else {
            debug!("No action configured for {}", event.as_str());
            return;
        };
        if let Err(e) = self.inner.actions.invoke(action) {
            warn!("Failed to run {} action {}: {}", event.as_str(), action, e);
        }
    }

    fn dispatch_indicator(&self, indicator: Indicator, on: bool) {
        let indicators = &self.inner.config.indicators;
        let device = match indicator {
            Indicator::Armed => indicators.armed.as_deref(),
            Indicator::Alarm => indicators.alarm.as_deref(),
        };
        let Some(device) = device else {
            return;
        };
        if let Err(e) = self.inner.indicators.set(indicator, device, on) {
            warn!("Failed to set {} indicator {}: {}", indicator, device, e);
        }
    }

    fn publish(&self, state: &PanelState) {
        let snapshot = PanelSnapshot {
            mode: state.mode,
            state: state.mode.to_string(),
            is_armed: state.mode.is_armed(),
            is_triggered: state.mode.is_triggered(),
            triggered_from: state.triggered_from,
            timer: state
                .pending
                .as_ref()
                .map(PendingTimer::state)
                .unwrap_or_else(TimerState::inactive),
            last_command: state.last_command.clone(),
            last_command_time: state.last_command_time,
            changed_at: self.inner.scheduler.now(),
        };
        self.inner.snapshot_tx.send_replace(snapshot);
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AlarmStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlarmStateMachine")
            .field("name", &self.inner.config.name)
            .field("mode", &self.current_state())
            .finish()
    }
}
