//! Channel configuration and per-channel output capabilities.

use crate::channel_kind::{ChannelKind, KindTag};
use crate::clock_length::ClockLength;
use crate::sequence::MAX_STEPS;
use crate::timing::NUM_CHANNELS;

/// Gate length used by trigger kinds (Euclidean and random triggers).
pub const TRIGGER_GATE: ClockLength = ClockLength::N128;

pub const DEFAULT_SEQUENCE_LENGTH: u8 = 8;
pub const DEFAULT_EUCLIDEAN_STEPS: u8 = 5;
pub const DEFAULT_TRIGGER_PROBABILITY: u8 = 50;

/// Everything the user can edit on one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelConfig {
    pub kind: ChannelKind,
    pub clock: ClockLength,
    pub gate: ClockLength,
    pub start_delay: ClockLength,
}

impl ChannelConfig {
    /// A plain clock with the given period and gate length.
    pub const fn clock(clock: ClockLength, gate: ClockLength) -> Self {
        Self { kind: ChannelKind::Clock, clock, gate, start_delay: ClockLength::None }
    }

    /// A channel of `kind` clocked at `clock`, gate length equal to the clock.
    pub const fn with_kind(kind: ChannelKind, clock: ClockLength) -> Self {
        Self { kind, clock, gate: clock, start_delay: ClockLength::None }
    }

    pub const fn delayed(mut self, start_delay: ClockLength) -> Self {
        self.start_delay = start_delay;
        self
    }

    pub const fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    /// Bring every field into its valid range.
    ///
    /// Trigger kinds get the fixed trigger gate, voltage channels follow
    /// their clock and never start delayed.
    pub fn normalized(self) -> Self {
        let clock = clamp_length(self.clock);
        let mut gate = clamp_length(self.gate);
        let mut start_delay = self.start_delay;

        let kind = match self.kind {
            ChannelKind::Euclidean { steps, length } => {
                gate = TRIGGER_GATE;
                let length = length.clamp(1, MAX_STEPS);
                ChannelKind::Euclidean { steps: steps.clamp(1, length), length }
            }
            ChannelKind::RandomTrigger { probability, length, pattern } => {
                gate = TRIGGER_GATE;
                ChannelKind::RandomTrigger {
                    probability: probability.min(100),
                    length: clamp_trigger_length(length),
                    pattern,
                }
            }
            ChannelKind::Voltage { length, levels } => {
                gate = clock;
                start_delay = ClockLength::None;
                ChannelKind::Voltage { length: length.min(MAX_STEPS), levels }
            }
            other => other,
        };

        Self { kind, clock, gate, start_delay }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::clock(ClockLength::N4, ClockLength::N32)
    }
}

/// Clock and gate lengths are never `None`.
fn clamp_length(length: ClockLength) -> ClockLength {
    length.max(ClockLength::N256)
}

/// Trigger sequences are either live (0) or at least two steps long.
pub fn clamp_trigger_length(length: u8) -> u8 {
    match length {
        0 => 0,
        1 => 2,
        n => n.min(MAX_STEPS),
    }
}

/// Which output hardware a channel drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputCapability {
    /// Digital gate only.
    GateOnly,
    /// Digital gate plus a PWM-filtered analog path.
    GateAndPwm,
}

/// Output hardware per channel: the first four jacks are gate-only.
pub const CHANNEL_CAPABILITIES: [OutputCapability; NUM_CHANNELS] = [
    OutputCapability::GateOnly,
    OutputCapability::GateOnly,
    OutputCapability::GateOnly,
    OutputCapability::GateOnly,
    OutputCapability::GateAndPwm,
    OutputCapability::GateAndPwm,
    OutputCapability::GateAndPwm,
    OutputCapability::GateAndPwm,
];

impl OutputCapability {
    /// Capability of channel `index`; unknown channels are treated as gate-only.
    pub fn of(index: usize) -> Self {
        CHANNEL_CAPABILITIES.get(index).copied().unwrap_or(Self::GateOnly)
    }

    pub fn supports(self, tag: KindTag) -> bool {
        match self {
            Self::GateOnly => !tag.is_waveform(),
            Self::GateAndPwm => true,
        }
    }

    /// Highest kind in cycling order this output can run.
    pub fn highest_kind(self) -> KindTag {
        match self {
            Self::GateOnly => KindTag::RandomTrigger,
            Self::GateAndPwm => KindTag::Voltage,
        }
    }

    /// Clamp a requested kind to one this output can run.
    pub fn clamp_kind(self, tag: KindTag) -> KindTag {
        if self.supports(tag) {
            tag
        } else {
            self.highest_kind()
        }
    }
}

/// Factory layout of the eight channels.
///
/// Random-trigger and voltage channels carry no pattern here; the engine
/// rolls them from its generators when building defaults.
pub const FACTORY_LAYOUT: [ChannelConfig; NUM_CHANNELS] = [
    ChannelConfig::clock(ClockLength::N4, ClockLength::N8),
    ChannelConfig::clock(ClockLength::N4, ClockLength::N8).delayed(ClockLength::N8),
    ChannelConfig::clock(ClockLength::N8, ClockLength::N16),
    ChannelConfig::clock(ClockLength::N16, ClockLength::N128),
    ChannelConfig {
        kind: ChannelKind::Euclidean { steps: 5, length: 8 },
        clock: ClockLength::N8,
        gate: TRIGGER_GATE,
        start_delay: ClockLength::None,
    },
    ChannelConfig {
        kind: ChannelKind::Euclidean { steps: 5, length: 11 },
        clock: ClockLength::N16,
        gate: TRIGGER_GATE,
        start_delay: ClockLength::None,
    },
    ChannelConfig::with_kind(
        ChannelKind::Voltage { length: 4, levels: None },
        ClockLength::N1,
    ),
    ChannelConfig::with_kind(ChannelKind::Sine, ClockLength::X2),
];

/// An empty random-trigger kind with default parameters.
pub const fn default_random_trigger() -> ChannelKind {
    ChannelKind::RandomTrigger {
        probability: DEFAULT_TRIGGER_PROBABILITY,
        length: DEFAULT_SEQUENCE_LENGTH,
        pattern: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_kinds_get_trigger_gate() {
        let cfg = ChannelConfig::with_kind(ChannelKind::Euclidean { steps: 3, length: 8 }, ClockLength::N8)
            .normalized();
        assert_eq!(cfg.gate, TRIGGER_GATE);
    }

    #[test]
    fn voltage_follows_clock_without_delay() {
        let cfg = ChannelConfig {
            kind: ChannelKind::Voltage { length: 40, levels: None },
            clock: ClockLength::N2,
            gate: ClockLength::N16,
            start_delay: ClockLength::N8,
        }
        .normalized();
        assert_eq!(cfg.gate, ClockLength::N2);
        assert_eq!(cfg.start_delay, ClockLength::None);
        assert_eq!(cfg.kind.sequence_length(), Some(MAX_STEPS));
    }

    #[test]
    fn out_of_range_parameters_clamp() {
        let cfg = ChannelConfig::with_kind(
            ChannelKind::RandomTrigger { probability: 180, length: 1, pattern: None },
            ClockLength::None,
        )
        .normalized();
        assert_eq!(cfg.clock, ClockLength::N256);
        match cfg.kind {
            ChannelKind::RandomTrigger { probability, length, .. } => {
                assert_eq!(probability, 100);
                assert_eq!(length, 2);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn euclidean_zero_steps_clamps_to_one() {
        let cfg = ChannelConfig::with_kind(ChannelKind::Euclidean { steps: 0, length: 0 }, ClockLength::N8)
            .normalized();
        assert_eq!(cfg.kind, ChannelKind::Euclidean { steps: 1, length: 1 });
    }

    #[test]
    fn euclidean_steps_never_exceed_length() {
        let cfg = ChannelConfig::with_kind(ChannelKind::Euclidean { steps: 12, length: 8 }, ClockLength::N8)
            .normalized();
        assert_eq!(cfg.kind, ChannelKind::Euclidean { steps: 8, length: 8 });
    }

    #[test]
    fn gate_only_channels_refuse_waveforms() {
        assert_eq!(OutputCapability::of(0).clamp_kind(KindTag::Sine), KindTag::RandomTrigger);
        assert_eq!(OutputCapability::of(2).clamp_kind(KindTag::Euclidean), KindTag::Euclidean);
        assert_eq!(OutputCapability::of(7).clamp_kind(KindTag::Voltage), KindTag::Voltage);
        assert_eq!(OutputCapability::of(42), OutputCapability::GateOnly);
    }

    #[test]
    fn factory_layout_is_normalized() {
        for (i, cfg) in FACTORY_LAYOUT.iter().enumerate() {
            assert_eq!(cfg.normalized(), *cfg, "channel {} not normalized", i);
            assert!(OutputCapability::of(i).supports(cfg.tag()));
        }
    }
}
