//! Module-level configuration.

use cm_engine::factory_channels;
use cm_ir::timing::{DEFAULT_BPM, DEFAULT_SWING};
use cm_ir::{clamp_bpm, clamp_swing, ChannelConfig, OutputCapability, NUM_CHANNELS};
use fastrand::Rng;

use crate::edit::kind_with_tag;

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0x00C1_0C4D;

/// Everything needed to bring the module up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleConfig {
    pub tempo: u8,
    pub swing: u8,
    /// Seed for the engine's generators; equal seeds replay identically.
    pub seed: u64,
    pub channels: [ChannelConfig; NUM_CHANNELS],
}

impl ModuleConfig {
    /// Factory defaults with random patterns rolled from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            tempo: DEFAULT_BPM,
            swing: DEFAULT_SWING,
            seed,
            channels: factory_channels(&mut Rng::with_seed(seed)),
        }
    }

    /// Clamp tempo and swing, normalize every channel and enforce the
    /// capability of each output.
    pub fn normalized(mut self) -> Self {
        self.tempo = clamp_bpm(self.tempo as i32);
        self.swing = clamp_swing(self.swing as i32);
        for (index, channel) in self.channels.iter_mut().enumerate() {
            *channel = fit_to_output(index, *channel);
        }
        self
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

/// Normalize `config` and swap in a supported kind if output `index` cannot run it.
pub fn fit_to_output(index: usize, config: ChannelConfig) -> ChannelConfig {
    let capability = OutputCapability::of(index);
    let tag = config.tag();
    let config = if capability.supports(tag) {
        config
    } else {
        ChannelConfig { kind: kind_with_tag(capability.clamp_kind(tag)), ..config }
    };
    config.normalized()
}
