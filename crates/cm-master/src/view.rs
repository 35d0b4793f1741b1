//! Levels and tick position published by the tick thread for the foreground.

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use cm_engine::{OutputLevel, TickReport};
use cm_io::OutputSink;
use cm_ir::{Tick, NUM_CHANNELS};

/// Lock-free snapshot of the outputs, written by the tick thread.
#[derive(Debug, Default)]
pub struct SharedView {
    tick: AtomicU32,
    ticks_processed: AtomicU64,
    gates: AtomicU8,
    pwm: [AtomicU8; NUM_CHANNELS],
    swing_commits: AtomicU32,
}

impl SharedView {
    pub fn tick(&self) -> Tick {
        self.tick.load(Ordering::Acquire)
    }

    /// Total ticks handled since power-on, stopped ticks included.
    pub fn ticks_processed(&self) -> u64 {
        self.ticks_processed.load(Ordering::Acquire)
    }

    pub fn level(&self, channel: usize) -> OutputLevel {
        let Some(pwm) = self.pwm.get(channel) else {
            return OutputLevel::default();
        };
        OutputLevel {
            gate: self.gates.load(Ordering::Acquire) & (1 << channel) != 0,
            pwm: pwm.load(Ordering::Acquire),
        }
    }

    pub fn levels(&self) -> [OutputLevel; NUM_CHANNELS] {
        core::array::from_fn(|channel| self.level(channel))
    }

    /// Number of swing changes the engine has applied.
    pub fn swing_commits(&self) -> u32 {
        self.swing_commits.load(Ordering::Acquire)
    }
}

/// Sink that keeps a [`SharedView`] current.
pub struct ViewPublisher {
    view: Arc<SharedView>,
}

impl ViewPublisher {
    pub fn new(view: Arc<SharedView>) -> Self {
        Self { view }
    }
}

impl OutputSink for ViewPublisher {
    fn set_channel_level(&mut self, channel: usize, gate: bool, pwm: u8) {
        let Some(slot) = self.view.pwm.get(channel) else {
            return;
        };
        slot.store(pwm, Ordering::Release);
        let bit = 1 << channel;
        if gate {
            self.view.gates.fetch_or(bit, Ordering::AcqRel);
        } else {
            self.view.gates.fetch_and(!bit, Ordering::AcqRel);
        }
    }

    fn tick_done(&mut self, report: &TickReport) {
        if report.swing_committed {
            self.view.swing_commits.fetch_add(1, Ordering::AcqRel);
        }
        self.view.tick.store(report.tick, Ordering::Release);
        self.view.ticks_processed.fetch_add(1, Ordering::AcqRel);
    }
}
