//! Collaborator traits and the I/O error type.

use std::time::Duration;

use cm_engine::TickReport;
use cm_ir::Tick;
use thiserror::Error;

/// Errors from timers, sinks and the tick thread.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to spawn tick thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("tick thread panicked")]
    TickThreadPanicked,
    /// The timer will produce no further ticks. Ends a tick loop normally.
    #[error("timer stopped")]
    TimerStopped,
}

/// Receives output levels from the engine.
pub trait OutputSink {
    /// Drive one output jack.
    fn set_channel_level(&mut self, channel: usize, gate: bool, pwm: u8);

    /// Called before the changes of `tick` are delivered.
    fn begin_tick(&mut self, _tick: Tick) {}

    /// Called once per tick after every change was delivered.
    fn tick_done(&mut self, _report: &TickReport) {}
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn set_channel_level(&mut self, channel: usize, gate: bool, pwm: u8) {
        (**self).set_channel_level(channel, gate, pwm);
    }

    fn begin_tick(&mut self, tick: Tick) {
        (**self).begin_tick(tick);
    }

    fn tick_done(&mut self, report: &TickReport) {
        (**self).tick_done(report);
    }
}

/// Fan out to two sinks.
impl<A: OutputSink, B: OutputSink> OutputSink for (A, B) {
    fn set_channel_level(&mut self, channel: usize, gate: bool, pwm: u8) {
        self.0.set_channel_level(channel, gate, pwm);
        self.1.set_channel_level(channel, gate, pwm);
    }

    fn begin_tick(&mut self, tick: Tick) {
        self.0.begin_tick(tick);
        self.1.begin_tick(tick);
    }

    fn tick_done(&mut self, report: &TickReport) {
        self.0.tick_done(report);
        self.1.tick_done(report);
    }
}

/// Deliver one tick's report to `sink`.
pub fn deliver<S: OutputSink + ?Sized>(report: &TickReport, sink: &mut S) {
    sink.begin_tick(report.tick);
    for change in &report.changes {
        sink.set_channel_level(change.channel as usize, change.gate, change.pwm);
    }
    sink.tick_done(report);
}

/// Paces the tick handler.
pub trait TickTimer {
    /// Current tick period.
    fn period(&self) -> Duration;

    /// Block until the next tick is due.
    fn wait_next(&mut self) -> Result<(), IoError>;
}
