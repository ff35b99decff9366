//! Capabilities injected into a [`Spudpole`](crate::Spudpole).
//!
//! A spudpole never drives hardware or reads a clock itself. Motor commands
//! go to a [`ControlSink`] and run-time bookkeeping to a [`RunTimer`]. Both
//! are called synchronously from inside the triggering transition.

use crate::error::Result;
use crate::types::{ControlAction, TimerMode};
use chrono::{DateTime, Utc};

/// Performs physical actuation of the winch motor
pub trait ControlSink {
    /// Apply `action`. Failures are logged by the caller; the transition
    /// that requested the action completes regardless.
    fn actuate(&mut self, action: ControlAction) -> Result<()>;
}

/// Accumulates motor run time
pub trait RunTimer {
    /// Signal a motor start or stop.
    ///
    /// `total` is the currently stored accumulated run time in seconds. The
    /// return value is the updated total; callers only keep it for
    /// [`TimerMode::Stop`].
    fn signal(&mut self, mode: TimerMode, total: u64) -> u64;
}

/// Run timer measuring wall-clock seconds between start and stop
pub struct ClockTimer {
    clock: Box<dyn FnMut() -> DateTime<Utc>>,
    started: Option<DateTime<Utc>>,
    /// Sub-second part of finished runs not yet added to a total
    carry_ms: u64,
}

impl ClockTimer {
    /// Timer reading the system clock
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Timer reading an arbitrary clock source
    pub fn with_clock(clock: impl FnMut() -> DateTime<Utc> + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            started: None,
            carry_ms: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }
}

impl Default for ClockTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RunTimer for ClockTimer {
    fn signal(&mut self, mode: TimerMode, total: u64) -> u64 {
        let now = (self.clock)();
        match mode {
            TimerMode::Start => {
                // A restart while running keeps the first start time
                self.started.get_or_insert(now);
                total
            }
            TimerMode::Stop => match self.started.take() {
                Some(start) => {
                    let elapsed_ms =
                        (now - start).num_milliseconds().max(0) as u64 + self.carry_ms;
                    self.carry_ms = elapsed_ms % 1000;
                    total.saturating_add(elapsed_ms / 1000)
                }
                None => total,
            },
        }
    }
}
