//! Timer scheduling for arming delays and trigger windows

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use chrono::{DateTime, Utc};
use tokio::{task::JoinHandle, time::sleep};
use tracing::debug;

/// Callback run when a scheduled timer fires
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Cancellation side of a scheduled timer
pub trait TimerHandle: Send {
    /// Cancel the timer. Its callback must not run afterwards.
    fn cancel(&mut self);
}

/// Schedules a callback after a delay without blocking the caller
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> Box<dyn TimerHandle>;

    /// Wall-clock time as this scheduler sees it
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Scheduler backed by the tokio runtime
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

struct TokioTimer(JoinHandle<()>);

impl TimerHandle for TokioTimer {
    fn cancel(&mut self) {
        self.0.abort();
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> Box<dyn TimerHandle> {
        debug!("Scheduling timer in {:?}", delay);
        let task = tokio::spawn(async move {
            sleep(delay).await;
            callback();
        });
        Box::new(TokioTimer(task))
    }
}

struct ManualEntry {
    id: u64,
    due: Duration,
    callback: TimerCallback,
}

struct ManualClock {
    /// Wall-clock time the simulated clock started at
    origin: DateTime<Utc>,
    now: Duration,
    next_id: u64,
    entries: Vec<ManualEntry>,
}

/// Scheduler driven by a simulated clock.
///
/// Nothing fires until [`ManualScheduler::advance`] moves the clock past a
/// timer's deadline. Callbacks run on the caller's thread with no internal
/// lock held, so they may schedule or cancel further timers.
#[derive(Clone)]
pub struct ManualScheduler {
    clock: Arc<Mutex<ManualClock>>,
}

struct ManualTimer {
    id: u64,
    clock: Arc<Mutex<ManualClock>>,
}

impl TimerHandle for ManualTimer {
    fn cancel(&mut self) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        clock.entries.retain(|entry| entry.id != self.id);
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(Mutex::new(ManualClock {
                origin: Utc::now(),
                now: Duration::ZERO,
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Time elapsed on the simulated clock
    pub fn elapsed(&self) -> Duration {
        self.lock().now
    }

    /// Number of timers scheduled and not yet fired or cancelled
    pub fn pending(&self) -> usize {
        self.lock().entries.len()
    }

    /// Move the clock forward, firing due timers in deadline order
    pub fn advance(&self, by: Duration) {
        let target = self.lock().now + by;
        loop {
            let due = {
                let mut clock = self.lock();
                let next = clock
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| entry.due <= target)
                    .min_by_key(|(_, entry)| (entry.due, entry.id))
                    .map(|(index, _)| index);
                match next {
                    Some(index) => {
                        let entry = clock.entries.remove(index);
                        clock.now = entry.due;
                        Some(entry.callback)
                    }
                    None => {
                        clock.now = target;
                        None
                    }
                }
            };
            match due {
                Some(callback) => callback(),
                None => break,
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualClock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> DateTime<Utc> {
        let clock = self.lock();
        let elapsed =
            chrono::Duration::from_std(clock.now).unwrap_or_else(|_| chrono::Duration::zero());
        clock.origin + elapsed
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> Box<dyn TimerHandle> {
        let mut clock = self.lock();
        let id = clock.next_id;
        clock.next_id += 1;
        let due = clock.now + delay;
        clock.entries.push(ManualEntry { id, due, callback });
        Box::new(ManualTimer {
            id,
            clock: Arc::clone(&self.clock),
        })
    }
}
