//! Tick timers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cm_engine::ControlBlock;
use cm_ir::tick_period;

use crate::traits::{IoError, TickTimer};

/// Deadlines further behind than this many periods are dropped, not caught up.
const MAX_LAG_PERIODS: u32 = 64;

/// Host timer pacing ticks with `thread::sleep`.
///
/// The tempo is re-read from the control block on every period, so a
/// tempo change takes effect on the next period boundary. Deadlines are
/// accumulated rather than measured from wake-up, which keeps the long-run
/// rate exact despite sleep jitter.
pub struct ThreadTimer {
    control: Arc<ControlBlock>,
    deadline: Option<Instant>,
}

impl ThreadTimer {
    pub fn new(control: Arc<ControlBlock>) -> Self {
        Self { control, deadline: None }
    }
}

impl TickTimer for ThreadTimer {
    fn period(&self) -> Duration {
        tick_period(self.control.tempo())
    }

    fn wait_next(&mut self) -> Result<(), IoError> {
        let period = self.period();
        let now = Instant::now();
        let deadline = match self.deadline {
            None => now,
            Some(previous) => {
                let next = previous + period;
                if now.saturating_duration_since(next) > period * MAX_LAG_PERIODS {
                    tracing::warn!(lag = ?now.duration_since(next), "tick timer fell behind, resyncing");
                    now
                } else {
                    next
                }
            }
        };
        if let Some(wait) = deadline.checked_duration_since(now) {
            std::thread::sleep(wait);
        }
        self.deadline = Some(deadline);
        Ok(())
    }
}

/// Timer that fires a fixed number of ticks without waiting.
///
/// Drives the tick loop offline and in tests.
pub struct ManualTimer {
    remaining: u64,
    period: Duration,
}

impl ManualTimer {
    pub fn new(ticks: u64, bpm: u8) -> Self {
        Self { remaining: ticks, period: tick_period(bpm) }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl TickTimer for ManualTimer {
    fn period(&self) -> Duration {
        self.period
    }

    fn wait_next(&mut self) -> Result<(), IoError> {
        if self.remaining == 0 {
            return Err(IoError::TimerStopped);
        }
        self.remaining -= 1;
        Ok(())
    }
}
