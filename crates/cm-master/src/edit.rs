//! Rotary-style editing of one channel.
//!
//! An editor copies a channel's live configuration into a draft, walks the
//! parameter rows one at a time and accepts `±1` nudges on the current
//! row. Every nudge rebuilds the preview, rolling fresh random patterns for
//! random-trigger and voltage channels.

use arrayvec::ArrayString;
use cm_engine::generators::{euclidean, random_triggers, random_voltages};
use cm_ir::{
    clamp_trigger_length, default_random_trigger, ChannelConfig, ChannelKind, ClockLength, KindTag,
    OutputCapability, StepSequence, VoltageSequence, DEFAULT_EUCLIDEAN_STEPS,
    DEFAULT_SEQUENCE_LENGTH, DEFAULT_TRIGGER_PROBABILITY, MAX_STEPS, TRIGGER_GATE,
};
use fastrand::Rng;

/// Probability change per nudge, in percent.
pub const PROBABILITY_STEP: i32 = 5;

/// A freshly selected kind with its default parameters.
pub fn kind_with_tag(tag: KindTag) -> ChannelKind {
    match tag {
        KindTag::Clock => ChannelKind::Clock,
        KindTag::Euclidean => ChannelKind::Euclidean {
            steps: DEFAULT_EUCLIDEAN_STEPS,
            length: DEFAULT_SEQUENCE_LENGTH,
        },
        KindTag::RandomTrigger => default_random_trigger(),
        KindTag::RampUp => ChannelKind::RampUp,
        KindTag::RampDown => ChannelKind::RampDown,
        KindTag::Sine => ChannelKind::Sine,
        KindTag::Voltage => ChannelKind::Voltage { length: DEFAULT_SEQUENCE_LENGTH, levels: None },
    }
}

/// Parameter rows, in the order the editor walks them.
///
/// What the last two rows edit depends on the kind; see [`ChannelEditor::row_label`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditRow {
    Kind,
    Clock,
    Primary,
    Secondary,
}

/// Every editable field, kept across kind changes so switching back and
/// forth does not lose values.
#[derive(Clone, Copy, Debug)]
struct Draft {
    tag: KindTag,
    clock: ClockLength,
    gate: ClockLength,
    start_delay: ClockLength,
    steps: u8,
    length: u8,
    probability: u8,
    pattern: Option<StepSequence>,
    levels: Option<VoltageSequence>,
}

impl Draft {
    fn from_config(config: &ChannelConfig) -> Self {
        let mut draft = Self {
            tag: config.tag(),
            clock: config.clock,
            gate: config.gate,
            start_delay: config.start_delay,
            steps: DEFAULT_EUCLIDEAN_STEPS,
            length: config.kind.sequence_length().unwrap_or(DEFAULT_SEQUENCE_LENGTH),
            probability: DEFAULT_TRIGGER_PROBABILITY,
            pattern: None,
            levels: None,
        };
        match config.kind {
            ChannelKind::Euclidean { steps, .. } => draft.steps = steps,
            ChannelKind::RandomTrigger { probability, pattern, .. } => {
                draft.probability = probability;
                draft.pattern = pattern;
            }
            ChannelKind::Voltage { levels, .. } => draft.levels = levels,
            _ => {}
        }
        draft
    }

    fn kind(&self) -> ChannelKind {
        match self.tag {
            KindTag::Euclidean => ChannelKind::Euclidean {
                steps: self.steps,
                length: self.length.max(1),
            },
            KindTag::RandomTrigger => ChannelKind::RandomTrigger {
                probability: self.probability,
                length: clamp_trigger_length(self.length),
                pattern: self.pattern,
            },
            KindTag::Voltage => ChannelKind::Voltage { length: self.length, levels: self.levels },
            tag => kind_with_tag(tag),
        }
    }

    fn config(&self) -> ChannelConfig {
        ChannelConfig {
            kind: self.kind(),
            clock: self.clock,
            gate: self.gate,
            start_delay: self.start_delay,
        }
        .normalized()
    }
}

/// Step `value` by `delta` within `[min, max]`.
fn step(value: u8, delta: i32, min: u8, max: u8) -> u8 {
    (value as i32 + delta).clamp(min as i32, max as i32) as u8
}

/// Trigger lengths run 0, 2, 3, ... 32; a single step is never used.
fn step_trigger_length(length: u8, delta: i32) -> u8 {
    let next = (length as i32 + delta).clamp(0, MAX_STEPS as i32);
    match next {
        1 if delta > 0 => 2,
        1 => 0,
        n => n as u8,
    }
}

fn step_clock(length: ClockLength, delta: i32, min: ClockLength) -> ClockLength {
    ClockLength::clamped(length.index() as i32 + delta, min, ClockLength::X16)
}

/// Interactive editor for one channel.
pub struct ChannelEditor {
    channel: usize,
    capability: OutputCapability,
    row: EditRow,
    draft: Draft,
    preview: ChannelConfig,
    rng: Rng,
}

impl ChannelEditor {
    /// Open an editor on `channel`, starting from its live `config`.
    pub fn new(channel: usize, config: &ChannelConfig, seed: u64) -> Self {
        let draft = Draft::from_config(config);
        Self {
            channel,
            capability: OutputCapability::of(channel),
            row: EditRow::Kind,
            draft,
            preview: draft.config(),
            rng: Rng::with_seed(seed),
        }
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn row(&self) -> EditRow {
        self.row
    }

    /// The configuration that would be committed right now.
    pub fn preview(&self) -> &ChannelConfig {
        &self.preview
    }

    /// Rows available for the draft's kind. Voltage channels have no
    /// secondary row since they carry no start delay.
    pub fn rows(&self) -> &'static [EditRow] {
        match self.draft.tag {
            KindTag::Voltage => &[EditRow::Kind, EditRow::Clock, EditRow::Primary],
            _ => &[EditRow::Kind, EditRow::Clock, EditRow::Primary, EditRow::Secondary],
        }
    }

    /// What the current row edits.
    pub fn row_label(&self) -> &'static str {
        match (self.row, self.draft.tag) {
            (EditRow::Kind, _) => "Type",
            (EditRow::Clock, _) => "Clock",
            (EditRow::Primary, KindTag::Euclidean | KindTag::Voltage) => "Length",
            (EditRow::Primary, KindTag::RandomTrigger) => "Prob",
            (EditRow::Primary, _) => "Gate",
            (EditRow::Secondary, KindTag::Euclidean) => "Steps",
            (EditRow::Secondary, KindTag::RandomTrigger) => "Length",
            (EditRow::Secondary, _) => "Delay",
        }
    }

    /// Move to the next row. Returns `true` once past the last row, meaning
    /// the edit is complete and ready to commit.
    pub fn advance(&mut self) -> bool {
        let rows = self.rows();
        match rows.iter().position(|r| *r == self.row) {
            Some(i) if i + 1 < rows.len() => {
                self.row = rows[i + 1];
                false
            }
            _ => true,
        }
    }

    /// Move to the previous row. Returns `true` when backing out of the
    /// first row, meaning the edit is cancelled.
    pub fn back(&mut self) -> bool {
        let rows = self.rows();
        match rows.iter().position(|r| *r == self.row) {
            Some(i) if i > 0 => {
                self.row = rows[i - 1];
                false
            }
            _ => true,
        }
    }

    /// Apply one rotary step to the current row and return the new preview.
    pub fn nudge(&mut self, delta: i32) -> &ChannelConfig {
        let d = &mut self.draft;
        match (self.row, d.tag) {
            (EditRow::Kind, _) => {
                let tag = KindTag::clamped(d.tag.index() as i32 + delta);
                d.tag = self.capability.clamp_kind(tag);
                if d.tag == KindTag::Voltage {
                    d.gate = d.clock;
                    d.length = d.length.min(MAX_STEPS);
                }
            }
            (EditRow::Clock, tag) => {
                d.clock = step_clock(d.clock, delta, ClockLength::N256);
                if tag == KindTag::Voltage {
                    d.gate = d.clock;
                }
            }
            (EditRow::Primary, KindTag::Euclidean) => d.length = step(d.length, delta, 1, MAX_STEPS),
            (EditRow::Primary, KindTag::RandomTrigger) => {
                d.probability = step(d.probability, delta * PROBABILITY_STEP, 0, 100);
            }
            (EditRow::Primary, KindTag::Voltage) => d.length = step(d.length, delta, 0, MAX_STEPS),
            (EditRow::Primary, _) => d.gate = step_clock(d.gate, delta, ClockLength::N256),
            (EditRow::Secondary, KindTag::Euclidean) => d.steps = step(d.steps, delta, 1, MAX_STEPS),
            (EditRow::Secondary, KindTag::RandomTrigger) => d.length = step_trigger_length(d.length, delta),
            (EditRow::Secondary, _) => d.start_delay = step_clock(d.start_delay, delta, ClockLength::None),
        }
        self.regenerate();
        &self.preview
    }

    /// Re-roll random patterns and rebuild the preview.
    fn regenerate(&mut self) {
        let d = &mut self.draft;
        match d.tag {
            KindTag::RandomTrigger => {
                let length = clamp_trigger_length(d.length);
                d.pattern = Some(random_triggers(&mut self.rng, d.probability, length));
            }
            KindTag::Voltage => d.levels = Some(random_voltages(&mut self.rng, d.length)),
            _ => {}
        }
        self.preview = d.config();
    }

    /// The step pattern the preview will play, if it has one.
    pub fn preview_pattern(&self) -> Option<StepSequence> {
        match self.preview.kind {
            ChannelKind::Euclidean { steps, length } => Some(euclidean(steps, length)),
            ChannelKind::RandomTrigger { pattern, .. } => pattern,
            _ => None,
        }
    }

    /// Pattern preview as text, `x` for a hit and `.` for a rest.
    pub fn preview_text(&self) -> Option<ArrayString<32>> {
        let length = self.preview.kind.sequence_length()?;
        let pattern = self.preview_pattern()?;
        Some(match self.preview.kind {
            ChannelKind::Euclidean { .. } => pattern.render_descending(length),
            _ => pattern.render(length),
        })
    }
}
