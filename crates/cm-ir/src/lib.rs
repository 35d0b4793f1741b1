//! Core data types for the clockmod clock/trigger/CV generator.
//!
//! This crate defines the plain data shared by the real-time engine and
//! the foreground controller: tick-space timing, the note-division table,
//! channel kinds, step and voltage sequences, and channel configuration.
//!
//! Designed to be `no_std` compatible.

#![cfg_attr(not(feature = "std"), no_std)]

mod channel_kind;
mod clock_length;
mod config;
mod sequence;
pub mod timing;

pub use channel_kind::{ChannelKind, KindTag};
pub use clock_length::{ClockLength, NUM_CLOCKS, SWINGABLE_LIMIT};
pub use config::{
    clamp_trigger_length, default_random_trigger, ChannelConfig, OutputCapability,
    CHANNEL_CAPABILITIES, DEFAULT_EUCLIDEAN_STEPS, DEFAULT_SEQUENCE_LENGTH,
    DEFAULT_TRIGGER_PROBABILITY, FACTORY_LAYOUT, TRIGGER_GATE,
};
pub use sequence::{StepSequence, VoltageSequence, HALF_STEPS, MAX_STEPS};
pub use timing::{
    clamp_bpm, clamp_swing, is_bar_boundary, tick_period, wrap, wrap_add, wrap_sub, Tick,
    BAR_TICKS, NUM_CHANNELS, PPQN, PWM_EVENT_TICKS, TICK_LIMIT,
};
