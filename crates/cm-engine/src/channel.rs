//! Per-output channel state machine.
//!
//! A channel holds at most one pending event. Each event, when it fires,
//! updates the output level and schedules the next one, so a channel is a
//! single timeline advanced one hop at a time.

use cm_ir::{wrap_add, ChannelConfig, ChannelKind, StepSequence, Tick, VoltageSequence, PWM_EVENT_TICKS};
use fastrand::Rng;

use crate::generators::{euclidean, random_level, roll, with_generated_pattern};
use crate::swing::{apply_swing, SwingTable};
use crate::waveform::{ramp_level, sine_level};

/// What happens when a pending event fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    GateOpen,
    GateClose,
    PwmTick,
}

/// The single scheduled event of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingEvent {
    pub time: Tick,
    pub kind: EventKind,
}

/// Levels driven onto one output jack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputLevel {
    pub gate: bool,
    pub pwm: u8,
}

/// Observable state, derived from the pending event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    WaitingGateOpen,
    WaitingGateClose,
    WaitingPwmTick,
}

/// Gate timing derived from the clock and gate lengths.
///
/// `high` is how long the gate stays open; the rest of the period is low.
/// The gate is always shorter than the period so every cycle has a close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateTiming {
    pub period: u32,
    pub high: u32,
}

impl GateTiming {
    pub fn derive(config: &ChannelConfig) -> Self {
        let period = config.clock.ticks().max(2);
        let mut high = config.gate.ticks().min(period);
        if high >= period {
            high = period - 1;
        }
        Self { period, high: high.max(1) }
    }

    pub fn low(&self) -> u32 {
        self.period - self.high
    }
}

/// Live per-kind state: patterns plus their cursors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Program {
    Clock,
    Euclidean { pattern: StepSequence, length: u8, cursor: u8 },
    RandomTrigger { probability: u8, length: u8, pattern: StepSequence, cursor: u8 },
    Ramp { falling: bool },
    Sine,
    Voltage { length: u8, levels: VoltageSequence, cursor: u8, level: u8 },
}

impl Program {
    fn from_kind(kind: ChannelKind) -> Self {
        let mut program = match kind {
            ChannelKind::Clock => Self::Clock,
            ChannelKind::Euclidean { steps, length } => Self::Euclidean {
                pattern: euclidean(steps, length),
                length: length.max(1),
                cursor: 0,
            },
            ChannelKind::RandomTrigger { probability, length, pattern } => Self::RandomTrigger {
                probability,
                length,
                pattern: pattern.unwrap_or_default(),
                cursor: 0,
            },
            ChannelKind::RampUp => Self::Ramp { falling: false },
            ChannelKind::RampDown => Self::Ramp { falling: true },
            ChannelKind::Sine => Self::Sine,
            ChannelKind::Voltage { length, levels } => Self::Voltage {
                length,
                levels: levels.unwrap_or_default(),
                cursor: 0,
                level: 0,
            },
        };
        program.rewind();
        program
    }

    /// Return cursors to the start of the sequence.
    fn rewind(&mut self) {
        match self {
            // Euclidean patterns play from the high bit down.
            Self::Euclidean { length, cursor, .. } => *cursor = *length - 1,
            Self::RandomTrigger { cursor, .. } => *cursor = 0,
            Self::Voltage { cursor, level, .. } => {
                *cursor = 0;
                *level = 0;
            }
            _ => {}
        }
    }

    fn is_waveform(&self) -> bool {
        matches!(self, Self::Ramp { .. } | Self::Sine | Self::Voltage { .. })
    }

    /// Whether the next gate-open actually raises the gate. Advances the cursor.
    fn gate_eligible(&mut self, rng: &mut Rng) -> bool {
        match self {
            Self::Clock => true,
            Self::Euclidean { pattern, length, cursor } => {
                let hit = pattern.is_active(*cursor);
                *cursor = if *cursor == 0 { *length - 1 } else { *cursor - 1 };
                hit
            }
            Self::RandomTrigger { probability, length, pattern, cursor } => {
                if *length == 0 {
                    return roll(rng, *probability);
                }
                let hit = pattern.is_active(*cursor);
                *cursor = (*cursor + 1) % *length;
                hit
            }
            _ => false,
        }
    }

    /// PWM level `elapsed` ticks into the current cycle.
    fn shape(&self, elapsed: u32, span: u32) -> u8 {
        match *self {
            Self::Ramp { falling } => ramp_level(elapsed, span, falling),
            Self::Sine => sine_level(elapsed.min(span), span),
            Self::Voltage { level, .. } => level,
            _ => 0,
        }
    }

    /// Start a new PWM cycle: voltage channels step to their next level.
    fn cycle_restart(&mut self, rng: &mut Rng) {
        if let Self::Voltage { length, levels, cursor, level } = self {
            if *length == 0 {
                *level = random_level(rng);
            } else {
                *level = levels.level(*cursor);
                *cursor = (*cursor + 1) % *length;
            }
        }
    }
}

/// One output channel: configuration, derived timing and its event timeline.
#[derive(Clone, Debug)]
pub struct Channel {
    config: ChannelConfig,
    program: Program,
    timing: GateTiming,
    level: OutputLevel,
    next: Option<PendingEvent>,
    /// Whether the pending gate-open raises the gate.
    open_eligible: bool,
    /// Set when the next swung open comes early.
    swing_delayed: bool,
    pwm_elapsed: u32,
    /// Low time following the current open, after any swing shortening.
    low_pending: u32,
}

impl Channel {
    /// A channel running `config`, idle until [`Channel::reset`].
    pub fn new(config: ChannelConfig, rng: &mut Rng) -> Self {
        let mut channel = Self {
            config,
            program: Program::Clock,
            timing: GateTiming { period: 2, high: 1 },
            level: OutputLevel::default(),
            next: None,
            open_eligible: false,
            swing_delayed: false,
            pwm_elapsed: 0,
            low_pending: 1,
        };
        channel.apply_config(config, rng);
        channel
    }

    /// Replace the configuration and re-derive timing and pattern data.
    ///
    /// Does not touch the timeline; callers follow up with [`Channel::reset`].
    pub fn apply_config(&mut self, config: ChannelConfig, rng: &mut Rng) {
        let config = with_generated_pattern(rng, config.normalized());
        self.config = config;
        self.program = Program::from_kind(config.kind);
        self.timing = GateTiming::derive(&config);
        self.low_pending = self.timing.low();
    }

    /// Restart the timeline from `now`: gate closed, first event at the start delay.
    pub fn reset(&mut self, now: Tick, rng: &mut Rng) {
        self.program.rewind();
        self.level = OutputLevel::default();
        self.swing_delayed = false;
        self.pwm_elapsed = 0;
        self.low_pending = self.timing.low();

        let start = wrap_add(now, self.config.start_delay.ticks());
        if self.program.is_waveform() {
            self.open_eligible = false;
            self.program.cycle_restart(rng);
            self.next = Some(PendingEvent { time: start, kind: EventKind::PwmTick });
        } else {
            self.open_eligible = self.program.gate_eligible(rng);
            self.next = Some(PendingEvent { time: start, kind: EventKind::GateOpen });
        }
    }

    /// Halt the timeline: gate closed, nothing pending.
    pub fn idle(&mut self) {
        self.level = OutputLevel::default();
        self.next = None;
    }

    /// Fire the pending event if it is due at `now`. Returns whether one fired.
    pub fn dispatch(&mut self, now: Tick, swing: &SwingTable, rng: &mut Rng) -> bool {
        let Some(event) = self.next else {
            return false;
        };
        if event.time != now {
            return false;
        }
        match event.kind {
            EventKind::GateOpen => self.open_gate(now, swing),
            EventKind::GateClose => self.close_gate(now, swing, rng),
            EventKind::PwmTick => self.pwm_tick(now, rng),
        }
        true
    }

    fn swing_offset(&self, swing: &SwingTable) -> Option<u32> {
        self.config.clock.swing_bucket().map(|bucket| swing.offset(bucket))
    }

    fn open_gate(&mut self, now: Tick, swing: &SwingTable) {
        self.level = OutputLevel { gate: self.open_eligible, pwm: 0 };

        let mut high = self.timing.high;
        if let Some(offset) = self.swing_offset(swing) {
            // The next open is pulled `offset` early; close strictly before it.
            if self.swing_delayed && offset > 0 {
                let room = self.timing.period.saturating_sub(offset + 1).max(1);
                high = high.min(room);
            }
        }
        self.low_pending = self.timing.period - high;
        self.next = Some(PendingEvent { time: wrap_add(now, high), kind: EventKind::GateClose });
    }

    fn close_gate(&mut self, now: Tick, swing: &SwingTable, rng: &mut Rng) {
        self.level = OutputLevel { gate: false, pwm: 0 };

        let mut time = wrap_add(now, self.low_pending);
        if let Some(offset) = self.swing_offset(swing) {
            time = apply_swing(time, offset, &mut self.swing_delayed);
        }
        self.open_eligible = self.program.gate_eligible(rng);
        self.next = Some(PendingEvent { time, kind: EventKind::GateOpen });
    }

    fn pwm_tick(&mut self, now: Tick, rng: &mut Rng) {
        self.level.pwm = self.program.shape(self.pwm_elapsed, self.config.gate.ticks());
        self.pwm_elapsed += PWM_EVENT_TICKS;
        if self.pwm_elapsed >= self.timing.period {
            self.pwm_elapsed = 0;
            self.program.cycle_restart(rng);
        }
        self.next = Some(PendingEvent { time: wrap_add(now, PWM_EVENT_TICKS), kind: EventKind::PwmTick });
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn timing(&self) -> GateTiming {
        self.timing
    }

    pub fn level(&self) -> OutputLevel {
        self.level
    }

    pub fn next_event(&self) -> Option<PendingEvent> {
        self.next
    }

    pub fn state(&self) -> ChannelState {
        match self.next.map(|e| e.kind) {
            None => ChannelState::Idle,
            Some(EventKind::GateOpen) => ChannelState::WaitingGateOpen,
            Some(EventKind::GateClose) => ChannelState::WaitingGateClose,
            Some(EventKind::PwmTick) => ChannelState::WaitingPwmTick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_ir::{ClockLength, TICK_LIMIT};

    fn run(channel: &mut Channel, swing: &SwingTable, ticks: u32) -> Vec<(Tick, OutputLevel)> {
        let mut rng = Rng::with_seed(1);
        let mut last = channel.level();
        let mut out = Vec::new();
        for now in 0..ticks {
            channel.dispatch(wrap_add(0, now), swing, &mut rng);
            if channel.level() != last {
                last = channel.level();
                out.push((now, last));
            }
        }
        out
    }

    fn gate_opens(trace: &[(Tick, OutputLevel)]) -> Vec<Tick> {
        trace.iter().filter(|(_, l)| l.gate).map(|(t, _)| *t).collect()
    }

    fn fresh(config: ChannelConfig) -> Channel {
        let mut rng = Rng::with_seed(1);
        let mut channel = Channel::new(config, &mut rng);
        channel.reset(0, &mut rng);
        channel
    }

    #[test]
    fn timing_keeps_a_low_phase() {
        let t = GateTiming::derive(&ChannelConfig::clock(ClockLength::N4, ClockLength::N8));
        assert_eq!((t.period, t.high, t.low()), (192, 96, 96));
        let t = GateTiming::derive(&ChannelConfig::clock(ClockLength::N8, ClockLength::N4));
        assert_eq!((t.high, t.low()), (95, 1));
    }

    #[test]
    fn quarter_clock_opens_and_closes_on_grid() {
        let mut ch = fresh(ChannelConfig::clock(ClockLength::N4, ClockLength::N8));
        let trace = run(&mut ch, &SwingTable::new(0), 400);
        let times: Vec<Tick> = trace.iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![0, 96, 192, 288, 384]);
        assert!(trace[0].1.gate);
        assert!(!trace[1].1.gate);
    }

    #[test]
    fn start_delay_shifts_first_open() {
        let cfg = ChannelConfig::clock(ClockLength::N4, ClockLength::N8).delayed(ClockLength::N8);
        let mut ch = fresh(cfg);
        assert_eq!(ch.next_event(), Some(PendingEvent { time: 96, kind: EventKind::GateOpen }));
        assert_eq!(gate_opens(&run(&mut ch, &SwingTable::new(0), 400)), vec![96, 288]);
    }

    #[test]
    fn euclidean_plays_high_bit_first() {
        let cfg = ChannelConfig::with_kind(ChannelKind::Euclidean { steps: 5, length: 8 }, ClockLength::N16)
            .normalized();
        let mut ch = fresh(cfg);
        let opens = gate_opens(&run(&mut ch, &SwingTable::new(0), 48 * 8));
        // x.x.xx.x
        assert_eq!(opens, vec![0, 96, 192, 240, 336]);
    }

    #[test]
    fn waveform_channels_tick_every_six() {
        let cfg = ChannelConfig::with_kind(ChannelKind::RampUp, ClockLength::N4).normalized();
        let mut ch = fresh(cfg);
        assert_eq!(ch.state(), ChannelState::WaitingPwmTick);
        let mut rng = Rng::with_seed(1);
        let swing = SwingTable::new(0);
        let mut levels = Vec::new();
        for now in (0..192).step_by(PWM_EVENT_TICKS as usize) {
            assert!(ch.dispatch(now, &swing, &mut rng));
            levels.push(ch.level().pwm);
        }
        assert_eq!(levels[0], 0);
        assert!(levels.windows(2).all(|w| w[0] <= w[1]));
        // next cycle restarts from zero
        ch.dispatch(192, &swing, &mut rng);
        assert_eq!(ch.level().pwm, 0);
    }

    #[test]
    fn voltage_steps_each_clock() {
        let cfg = ChannelConfig::with_kind(
            ChannelKind::Voltage { length: 2, levels: Some(VoltageSequence::from_word(0x0000_A050)) },
            ClockLength::N16,
        );
        let mut ch = fresh(cfg);
        let mut rng = Rng::with_seed(1);
        let swing = SwingTable::new(0);
        ch.dispatch(0, &swing, &mut rng);
        assert_eq!(ch.level().pwm, 0x50);
        for now in (6..48).step_by(6) {
            ch.dispatch(now, &swing, &mut rng);
        }
        ch.dispatch(48, &swing, &mut rng);
        assert_eq!(ch.level().pwm, VoltageSequence::from_word(0x0000_A050).level(1));
    }

    #[test]
    fn free_running_voltage_draws_each_cycle() {
        let cfg = ChannelConfig::with_kind(ChannelKind::Voltage { length: 0, levels: None }, ClockLength::N16);
        let mut ch = fresh(cfg);
        let mut rng = Rng::with_seed(8);
        let swing = SwingTable::new(0);
        let mut drawn = Vec::new();
        for now in (0..48 * 16).step_by(PWM_EVENT_TICKS as usize) {
            ch.dispatch(now, &swing, &mut rng);
            if now % 48 == 0 {
                drawn.push(ch.level().pwm);
            }
        }
        assert_eq!(drawn.len(), 16);
        assert!(drawn.iter().all(|&level| level >= 1));
        assert!(drawn.iter().any(|&level| level != drawn[0]), "levels never changed: {:?}", drawn);
    }

    #[test]
    fn swing_alternates_late_and_early() {
        let mut ch = fresh(ChannelConfig::clock(ClockLength::N16, ClockLength::N32));
        let opens = gate_opens(&run(&mut ch, &SwingTable::new(30), 48 * 4 + 1));
        assert_eq!(opens, vec![0, 78, 96, 174, 192]);
    }

    #[test]
    fn swung_gate_closes_before_early_open() {
        let mut ch = fresh(ChannelConfig::clock(ClockLength::N16, ClockLength::N16));
        let trace = run(&mut ch, &SwingTable::new(30), 48 * 4);
        let mut open = false;
        for (_, level) in &trace {
            assert_ne!(open, level.gate, "gate must alternate open/close");
            open = level.gate;
        }
    }

    #[test]
    fn long_clocks_ignore_swing() {
        let mut ch = fresh(ChannelConfig::clock(ClockLength::N4, ClockLength::N8));
        assert_eq!(gate_opens(&run(&mut ch, &SwingTable::new(30), 400)), vec![0, 192, 384]);
    }

    #[test]
    fn events_wrap_at_tick_limit() {
        let mut rng = Rng::with_seed(1);
        let mut ch = Channel::new(ChannelConfig::clock(ClockLength::N4, ClockLength::N8), &mut rng);
        ch.reset(TICK_LIMIT - 10, &mut rng);
        ch.dispatch(TICK_LIMIT - 10, &SwingTable::new(0), &mut rng);
        assert_eq!(ch.next_event().map(|e| e.time), Some(86));
    }

    #[test]
    fn idle_channel_never_fires() {
        let mut ch = fresh(ChannelConfig::default());
        ch.idle();
        assert_eq!(ch.state(), ChannelState::Idle);
        assert!(run(&mut ch, &SwingTable::new(0), 400).is_empty());
    }
}
