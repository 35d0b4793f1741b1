//! Real-time core of the clockmod generator.
//!
//! Owns the tick counter and the eight channel state machines, the
//! sequence generators, waveform shaping, the swing engine and the
//! bar-commit mailboxes the foreground stages configuration through.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod channel;
pub mod commit;
pub mod generators;
mod scheduler;
mod swing;
mod waveform;

pub use channel::{Channel, ChannelState, EventKind, GateTiming, OutputLevel, PendingEvent};
pub use commit::{link, ControlBlock, StageError, StageReceiver, StageSender};
pub use generators::{euclidean, factory_channels, random_triggers, random_voltages};
pub use scheduler::{Engine, LevelChange, TickReport};
pub use swing::{apply_swing, SwingTable, SWING_BUCKETS};
pub use waveform::{ramp_level, sine_level};
