//! Fixed-length step and voltage sequences.

use arrayvec::ArrayString;

/// Upper bound on the number of steps in any sequence.
pub const MAX_STEPS: u8 = 32;

/// Steps held in each half of a [`StepSequence`].
pub const HALF_STEPS: u8 = 16;

/// Up to 32 on/off steps.
///
/// Step `i` lives at bit `i`. Trigger sequences are rolled as two
/// independent 16-step halves, exposed through [`StepSequence::first_half`]
/// and [`StepSequence::second_half`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StepSequence {
    bits: u32,
}

impl StepSequence {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Build from two 16-step halves (steps 0..16 and 16..32).
    pub const fn from_halves(first: u16, second: u16) -> Self {
        Self { bits: first as u32 | (second as u32) << HALF_STEPS }
    }

    pub const fn bits(self) -> u32 {
        self.bits
    }

    pub const fn first_half(self) -> u16 {
        self.bits as u16
    }

    pub const fn second_half(self) -> u16 {
        (self.bits >> HALF_STEPS) as u16
    }

    /// Whether step `index` is set. Steps past [`MAX_STEPS`] are never active.
    pub const fn is_active(self, index: u8) -> bool {
        index < MAX_STEPS && ((self.bits >> index) & 1) == 1
    }

    /// Set or clear step `index`. Out-of-range indices are ignored.
    pub fn set(&mut self, index: u8, active: bool) {
        if index >= MAX_STEPS {
            return;
        }
        if active {
            self.bits |= 1 << index;
        } else {
            self.bits &= !(1 << index);
        }
    }

    /// Number of active steps among the first `length` steps.
    pub fn count_active(self, length: u8) -> u32 {
        (0..length.min(MAX_STEPS)).filter(|&i| self.is_active(i)).count() as u32
    }

    /// Render the first `length` steps, step 0 first (`x` = active, `.` = rest).
    pub fn render(self, length: u8) -> ArrayString<32> {
        let mut out = ArrayString::new();
        for i in 0..length.min(MAX_STEPS) {
            out.push(if self.is_active(i) { 'x' } else { '.' });
        }
        out
    }

    /// Render the first `length` steps highest step first, the order
    /// Euclidean patterns are played in.
    pub fn render_descending(self, length: u8) -> ArrayString<32> {
        let mut out = ArrayString::new();
        for i in (0..length.min(MAX_STEPS)).rev() {
            out.push(if self.is_active(i) { 'x' } else { '.' });
        }
        out
    }
}

/// A random 32-bit word read back as 8-bit output levels.
///
/// Level `i` is the byte starting at bit `i`, rotating past bit 31, so a
/// sequence of any length up to 32 reads a full byte at every step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VoltageSequence {
    word: u32,
}

impl VoltageSequence {
    pub const fn from_word(word: u32) -> Self {
        Self { word }
    }

    pub const fn word(self) -> u32 {
        self.word
    }

    /// Output level at step `index`.
    pub const fn level(self, index: u8) -> u8 {
        self.word.rotate_right(index as u32 % 32) as u8
    }
}
