//! Channel behaviour modes.

use crate::sequence::{StepSequence, VoltageSequence};

/// What a channel does, with exactly the parameters that mode needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Plain gated clock.
    Clock,
    /// `steps` hits spread evenly over `length` steps.
    Euclidean { steps: u8, length: u8 },
    /// Probabilistic triggers. With `length == 0` every gate is a fresh
    /// roll; otherwise `pattern` is replayed over `length` steps. `None`
    /// until the pattern has been rolled.
    RandomTrigger { probability: u8, length: u8, pattern: Option<StepSequence> },
    /// Rising ramp over the gate length.
    RampUp,
    /// Falling ramp over the gate length.
    RampDown,
    /// One sine cycle over the gate length.
    Sine,
    /// Stepped random voltage. With `length == 0` each step draws a fresh
    /// level. `None` until the levels have been drawn.
    Voltage { length: u8, levels: Option<VoltageSequence> },
}

impl ChannelKind {
    pub const fn tag(&self) -> KindTag {
        match self {
            Self::Clock => KindTag::Clock,
            Self::Euclidean { .. } => KindTag::Euclidean,
            Self::RandomTrigger { .. } => KindTag::RandomTrigger,
            Self::RampUp => KindTag::RampUp,
            Self::RampDown => KindTag::RampDown,
            Self::Sine => KindTag::Sine,
            Self::Voltage { .. } => KindTag::Voltage,
        }
    }

    /// Whether this kind drives the PWM output instead of the gate.
    pub const fn is_waveform(&self) -> bool {
        self.tag().is_waveform()
    }

    /// Sequence length, for kinds that have one.
    pub const fn sequence_length(&self) -> Option<u8> {
        match self {
            Self::Euclidean { length, .. }
            | Self::RandomTrigger { length, .. }
            | Self::Voltage { length, .. } => Some(*length),
            _ => None,
        }
    }
}

/// Discriminant of [`ChannelKind`], ordered as the user cycles through them.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KindTag {
    Clock = 1,
    Euclidean,
    RandomTrigger,
    RampUp,
    RampDown,
    Sine,
    Voltage,
}

impl KindTag {
    pub const ALL: [KindTag; 7] = [
        Self::Clock,
        Self::Euclidean,
        Self::RandomTrigger,
        Self::RampUp,
        Self::RampDown,
        Self::Sine,
        Self::Voltage,
    ];

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Look up a kind by index, clamping into the valid range.
    pub fn clamped(index: i32) -> Self {
        let first = Self::Clock.index() as i32;
        let last = Self::Voltage.index() as i32;
        Self::ALL[(index.clamp(first, last) - first) as usize]
    }

    pub const fn is_waveform(self) -> bool {
        matches!(self, Self::RampUp | Self::RampDown | Self::Sine | Self::Voltage)
    }

    /// Four-column label for list views.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Clock => "Gate",
            Self::Euclidean => "Eucl",
            Self::RandomTrigger => "Trig",
            Self::RampUp => "SawR",
            Self::RampDown => "SawF",
            Self::Sine => "Sine",
            Self::Voltage => "Volt",
        }
    }

    pub const fn long_label(self) -> &'static str {
        match self {
            Self::Clock => "Gate",
            Self::Euclidean => "Euclidean",
            Self::RandomTrigger => "Triggers",
            Self::RampUp => "Saw/rise",
            Self::RampDown => "Saw\\fall",
            Self::Sine => "Sine",
            Self::Voltage => "Voltages",
        }
    }

    /// Parse a short label, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.label().eq_ignore_ascii_case(label.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_variants() {
        assert_eq!(ChannelKind::Clock.tag(), KindTag::Clock);
        assert_eq!(ChannelKind::Euclidean { steps: 3, length: 8 }.tag(), KindTag::Euclidean);
        assert!(ChannelKind::Sine.is_waveform());
        assert!(!ChannelKind::Clock.is_waveform());
    }

    #[test]
    fn clamped_never_leaves_range() {
        assert_eq!(KindTag::clamped(0), KindTag::Clock);
        assert_eq!(KindTag::clamped(8), KindTag::Voltage);
        assert_eq!(KindTag::clamped(3), KindTag::RandomTrigger);
    }

    #[test]
    fn labels_parse() {
        assert_eq!(KindTag::from_label("eucl"), Some(KindTag::Euclidean));
        assert_eq!(KindTag::from_label("VOLT"), Some(KindTag::Voltage));
        assert_eq!(KindTag::from_label("nope"), None);
    }

    #[test]
    fn sequence_length_only_for_sequenced_kinds() {
        assert_eq!(ChannelKind::Clock.sequence_length(), None);
        assert_eq!(ChannelKind::Euclidean { steps: 5, length: 11 }.sequence_length(), Some(11));
    }
}
