//! Sequence generators backing Euclidean, random-trigger and voltage channels.

use cm_ir::{
    ChannelConfig, ChannelKind, StepSequence, VoltageSequence, FACTORY_LAYOUT, HALF_STEPS,
    MAX_STEPS, NUM_CHANNELS,
};
use fastrand::Rng;

/// Spread `steps` hits over `length` steps (Bresenham spacing).
///
/// Hit `i` lands on bit `length - ceil(i * length / steps) - 1`, so the
/// first hit is always the highest step and the pattern is played high
/// bit first. Inputs are clamped to `1 <= steps <= length <= 32`.
pub fn euclidean(steps: u8, length: u8) -> StepSequence {
    let n = length.clamp(1, MAX_STEPS) as u32;
    let k = (steps as u32).clamp(1, n);
    let mut pattern = StepSequence::empty();
    for i in 0..k {
        // ceil(i * n / k) in integers
        let index = (i * n + k - 1) / k;
        pattern.set((n - index - 1) as u8, true);
    }
    pattern
}

/// One independent trigger roll at `probability` percent.
pub fn roll(rng: &mut Rng, probability: u8) -> bool {
    rng.u8(..100) < probability
}

/// Random trigger pattern of `length` steps.
///
/// Steps 0..16 and 16..32 are rolled as two independent halves so the
/// A and B halves of a 32-step pattern differ even at equal probability.
pub fn random_triggers(rng: &mut Rng, probability: u8, length: u8) -> StepSequence {
    let length = length.min(MAX_STEPS);
    let first = roll_half(rng, probability, length.min(HALF_STEPS));
    let second = roll_half(rng, probability, length.saturating_sub(HALF_STEPS));
    StepSequence::from_halves(first, second)
}

fn roll_half(rng: &mut Rng, probability: u8, steps: u8) -> u16 {
    let mut half = 0u16;
    for i in 0..steps {
        if roll(rng, probability) {
            half |= 1 << i;
        }
    }
    half
}

/// Random voltage word for a sequence of `length` levels.
///
/// A zero length means the channel free-runs on [`random_level`] instead,
/// so no word is drawn.
pub fn random_voltages(rng: &mut Rng, length: u8) -> VoltageSequence {
    if length == 0 {
        VoltageSequence::default()
    } else {
        VoltageSequence::from_word(rng.u32(..))
    }
}

/// A fresh free-running voltage level in `[1, 255]`.
pub fn random_level(rng: &mut Rng) -> u8 {
    rng.u8(1..=255)
}

/// Fill the pattern data a configuration needs but does not yet carry.
///
/// Random-trigger and voltage kinds with a non-zero length and no pattern
/// get a freshly rolled one. A pattern that is already present is kept,
/// even if it has no hits.
pub fn with_generated_pattern(rng: &mut Rng, config: ChannelConfig) -> ChannelConfig {
    let kind = match config.kind {
        ChannelKind::RandomTrigger { probability, length, pattern: None } if length > 0 => {
            ChannelKind::RandomTrigger {
                probability,
                length,
                pattern: Some(random_triggers(rng, probability, length)),
            }
        }
        ChannelKind::Voltage { length, levels: None } if length > 0 => {
            ChannelKind::Voltage { length, levels: Some(random_voltages(rng, length)) }
        }
        other => other,
    };
    ChannelConfig { kind, ..config }
}

/// The factory channel layout with its random patterns rolled from `rng`.
pub fn factory_channels(rng: &mut Rng) -> [ChannelConfig; NUM_CHANNELS] {
    FACTORY_LAYOUT.map(|config| with_generated_pattern(rng, config))
}
