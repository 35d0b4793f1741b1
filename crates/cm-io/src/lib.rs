//! Timer and output backends for the clockmod generator.
//!
//! The engine only sees two collaborators: a [`TickTimer`] that paces
//! ticks and an [`OutputSink`] that receives level changes. This crate
//! defines both and provides host implementations.

mod driver;
mod sinks;
mod timer;
mod traits;

pub use driver::{run_tick_loop, spawn_tick_thread, TickThread};
pub use sinks::{level_stream, LevelStream, LogSink, RingbufSink, TraceSink};
pub use timer::{ManualTimer, ThreadTimer};
pub use traits::{deliver, IoError, OutputSink, TickTimer};
