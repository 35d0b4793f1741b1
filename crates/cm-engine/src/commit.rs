//! Staging link between the foreground and the tick handler.
//!
//! Each channel has a one-slot mailbox: the foreground pushes a complete
//! [`ChannelConfig`] and the tick handler pops it at the next bar boundary
//! (or on the next tick while stopped). The push is the ready flag; the
//! ring buffer publishes the slot contents before the index that makes it
//! visible, so the tick handler never sees a half-written configuration.
//!
//! Swing, transport and tempo are single values and live in a shared
//! [`ControlBlock`] of atomics.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use cm_ir::timing::{DEFAULT_BPM, DEFAULT_SWING};
use cm_ir::{clamp_bpm, clamp_swing, ChannelConfig, NUM_CHANNELS};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Values shared by both sides of the link.
#[derive(Debug)]
pub struct ControlBlock {
    running: AtomicBool,
    /// Incremented on every stop, so a stop followed by a start between
    /// two ticks is still seen by the tick handler.
    stops: AtomicU32,
    tempo: AtomicU8,
    swing: AtomicU8,
    swing_ready: AtomicBool,
    /// One bit per channel with a configuration in its mailbox.
    pending: AtomicU8,
}

impl ControlBlock {
    fn new(tempo: u8, swing: u8) -> Self {
        Self {
            running: AtomicBool::new(false),
            stops: AtomicU32::new(0),
            tempo: AtomicU8::new(clamp_bpm(tempo as i32)),
            swing: AtomicU8::new(clamp_swing(swing as i32)),
            swing_ready: AtomicBool::new(false),
            pending: AtomicU8::new(0),
        }
    }

    /// Bitmask of channels whose staged configuration is not yet committed.
    pub fn pending_mask(&self) -> u8 {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Number of stops requested since the link was created.
    pub fn stop_count(&self) -> u32 {
        self.stops.load(Ordering::Acquire)
    }

    pub fn tempo(&self) -> u8 {
        self.tempo.load(Ordering::Acquire)
    }

    /// Most recently staged swing amount, committed or not.
    pub fn swing(&self) -> u8 {
        self.swing.load(Ordering::Acquire)
    }
}

impl Default for ControlBlock {
    fn default() -> Self {
        Self::new(DEFAULT_BPM, DEFAULT_SWING)
    }
}

/// Why a configuration could not be staged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageError {
    /// Channel index past the last output.
    NoSuchChannel(usize),
    /// The previous configuration for this channel has not been committed yet.
    Pending(usize),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::NoSuchChannel(ch) => write!(f, "no such channel: {}", ch),
            StageError::Pending(ch) => write!(f, "channel {} already has a staged configuration", ch),
        }
    }
}

/// Foreground end of the link.
pub struct StageSender {
    control: Arc<ControlBlock>,
    slots: Vec<HeapProd<ChannelConfig>>,
}

/// Tick-handler end of the link.
pub struct StageReceiver {
    control: Arc<ControlBlock>,
    slots: Vec<HeapCons<ChannelConfig>>,
}

fn channel_bit(channel: usize) -> u8 {
    1 << (channel % NUM_CHANNELS)
}

/// Create a connected sender/receiver pair with the given initial tempo and swing.
pub fn link(tempo: u8, swing: u8) -> (StageSender, StageReceiver) {
    let control = Arc::new(ControlBlock::new(tempo, swing));
    let mut producers = Vec::with_capacity(NUM_CHANNELS);
    let mut consumers = Vec::with_capacity(NUM_CHANNELS);
    for _ in 0..NUM_CHANNELS {
        let (prod, cons) = HeapRb::<ChannelConfig>::new(1).split();
        producers.push(prod);
        consumers.push(cons);
    }
    (
        StageSender { control: control.clone(), slots: producers },
        StageReceiver { control, slots: consumers },
    )
}

impl StageSender {
    /// Publish a complete configuration for `channel`.
    pub fn publish_config(&mut self, channel: usize, config: ChannelConfig) -> Result<(), StageError> {
        let slot = self.slots.get_mut(channel).ok_or(StageError::NoSuchChannel(channel))?;
        if self.control.pending_mask() & channel_bit(channel) != 0 {
            return Err(StageError::Pending(channel));
        }
        // Mark before pushing so the receiver's clear always lands after the mark.
        self.control.pending.fetch_or(channel_bit(channel), Ordering::AcqRel);
        if slot.try_push(config).is_err() {
            self.control.pending.fetch_and(!channel_bit(channel), Ordering::AcqRel);
            return Err(StageError::Pending(channel));
        }
        Ok(())
    }

    /// Whether `channel` has a configuration waiting for a bar boundary.
    pub fn is_pending(&self, channel: usize) -> bool {
        channel < NUM_CHANNELS && self.control.pending_mask() & channel_bit(channel) != 0
    }

    /// Stage a new swing amount. A later call before the commit replaces it.
    pub fn stage_swing(&self, amount: u8) {
        self.control.swing.store(clamp_swing(amount as i32), Ordering::Relaxed);
        self.control.swing_ready.store(true, Ordering::Release);
    }

    pub fn swing_pending(&self) -> bool {
        self.control.swing_ready.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        if !running {
            self.control.stops.fetch_add(1, Ordering::AcqRel);
        }
        self.control.running.store(running, Ordering::Release);
    }

    /// Store a new tempo, clamped. Returns the stored value.
    pub fn set_tempo(&self, bpm: i32) -> u8 {
        let bpm = clamp_bpm(bpm);
        self.control.tempo.store(bpm, Ordering::Release);
        bpm
    }

    pub fn tempo(&self) -> u8 {
        self.control.tempo()
    }

    pub fn control(&self) -> Arc<ControlBlock> {
        self.control.clone()
    }
}

impl StageReceiver {
    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    pub fn stop_count(&self) -> u32 {
        self.control.stop_count()
    }

    /// Take the staged configuration for `channel`, if any.
    pub fn take_config(&mut self, channel: usize) -> Option<ChannelConfig> {
        let config = self.slots.get_mut(channel)?.try_pop()?;
        self.control.pending.fetch_and(!channel_bit(channel), Ordering::Release);
        Some(config)
    }

    /// Take the staged swing amount, if one was published.
    pub fn take_swing(&self) -> Option<u8> {
        if self.control.swing_ready.swap(false, Ordering::AcqRel) {
            Some(self.control.swing.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    /// Swing amount last staged, for initialising the engine.
    pub fn swing(&self) -> u8 {
        self.control.swing()
    }

    pub fn control(&self) -> Arc<ControlBlock> {
        self.control.clone()
    }
}
