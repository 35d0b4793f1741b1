//! Musical note divisions used for clock, gate and delay lengths.

use crate::timing::PPQN;

/// Clock lengths below this index receive swing.
pub const SWINGABLE_LIMIT: u8 = 6;

/// Number of selectable (non-`None`) note divisions.
pub const NUM_CLOCKS: u8 = 21;

/// A note division, ordered from shortest to longest.
///
/// The discriminant is the table index shown to the user; `None` (0) is
/// only meaningful as "no start delay".
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClockLength {
    #[default]
    None = 0,
    N256,
    N128,
    N64,
    N32,
    N16,
    N16Dot,
    N8,
    N8Dot,
    N4,
    N4Dot,
    N2,
    N2Dot,
    N1,
    N1Dot,
    X2,
    X3,
    X4,
    X6,
    X8,
    X12,
    X16,
}

impl ClockLength {
    /// Every division in table order.
    pub const ALL: [ClockLength; NUM_CLOCKS as usize + 1] = [
        Self::None,
        Self::N256,
        Self::N128,
        Self::N64,
        Self::N32,
        Self::N16,
        Self::N16Dot,
        Self::N8,
        Self::N8Dot,
        Self::N4,
        Self::N4Dot,
        Self::N2,
        Self::N2Dot,
        Self::N1,
        Self::N1Dot,
        Self::X2,
        Self::X3,
        Self::X4,
        Self::X6,
        Self::X8,
        Self::X12,
        Self::X16,
    ];

    /// Table index of this division.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Look up a division by table index.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Look up a division by index, clamping into `[min, max]`.
    pub fn clamped(index: i32, min: ClockLength, max: ClockLength) -> Self {
        let i = index.clamp(min.index() as i32, max.index() as i32);
        Self::ALL[i as usize]
    }

    /// Duration in scheduler ticks.
    pub const fn ticks(self) -> u32 {
        match self {
            Self::None => 0,
            Self::N256 => PPQN >> 6,
            Self::N128 => PPQN >> 5,
            Self::N64 => PPQN >> 4,
            Self::N32 => PPQN >> 3,
            Self::N16 => PPQN >> 2,
            Self::N16Dot => (PPQN >> 2) + (PPQN >> 3),
            Self::N8 => PPQN >> 1,
            Self::N8Dot => (PPQN >> 1) + (PPQN >> 2),
            Self::N4 => PPQN,
            Self::N4Dot => PPQN + (PPQN >> 1),
            Self::N2 => PPQN << 1,
            Self::N2Dot => (PPQN << 1) + PPQN,
            Self::N1 => PPQN << 2,
            Self::N1Dot => (PPQN << 2) + (PPQN << 1),
            Self::X2 => PPQN << 3,
            Self::X3 => (PPQN << 3) + (PPQN << 2),
            Self::X4 => PPQN << 4,
            Self::X6 => (PPQN << 4) + (PPQN << 3),
            Self::X8 => PPQN << 5,
            Self::X12 => (PPQN << 5) + (PPQN << 4),
            Self::X16 => PPQN << 6,
        }
    }

    /// Swing table bucket for this clock length, if it is short enough to swing.
    pub const fn swing_bucket(self) -> Option<usize> {
        if self.index() < SWINGABLE_LIMIT {
            Some(self.index() as usize)
        } else {
            None
        }
    }

    pub const fn is_swingable(self) -> bool {
        self.swing_bucket().is_some()
    }

    /// Five-column label for list views.
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "     ",
            Self::N256 => " 256 ",
            Self::N128 => " 128 ",
            Self::N64 => "  64 ",
            Self::N32 => "  32 ",
            Self::N16 => "  16 ",
            Self::N16Dot => "  16.",
            Self::N8 => "   8 ",
            Self::N8Dot => "   8.",
            Self::N4 => "   4 ",
            Self::N4Dot => "   4.",
            Self::N2 => "   2 ",
            Self::N2Dot => "   2.",
            Self::N1 => "   1 ",
            Self::N1Dot => "  1x.",
            Self::X2 => "  2x ",
            Self::X3 => "  3x ",
            Self::X4 => "  4x ",
            Self::X6 => "  6x ",
            Self::X8 => "  8x ",
            Self::X12 => " 12x ",
            Self::X16 => " 16x ",
        }
    }

    /// Fraction label for settings views, e.g. `1/16.` or `4/1`.
    pub const fn long_label(self) -> &'static str {
        match self {
            Self::None => "-",
            Self::N256 => "1/256",
            Self::N128 => "1/128",
            Self::N64 => "1/64",
            Self::N32 => "1/32",
            Self::N16 => "1/16",
            Self::N16Dot => "1/16.",
            Self::N8 => "1/8",
            Self::N8Dot => "1/8.",
            Self::N4 => "1/4",
            Self::N4Dot => "1/4.",
            Self::N2 => "1/2",
            Self::N2Dot => "1/2.",
            Self::N1 => "1/1",
            Self::N1Dot => "1/1.",
            Self::X2 => "2/1",
            Self::X3 => "3/1",
            Self::X4 => "4/1",
            Self::X6 => "6/1",
            Self::X8 => "8/1",
            Self::X12 => "12/1",
            Self::X16 => "16/1",
        }
    }

    /// Parse a fraction label as produced by [`ClockLength::long_label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.long_label() == label.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_strictly_increasing() {
        for pair in ClockLength::ALL.windows(2) {
            assert!(pair[0].ticks() < pair[1].ticks(), "{:?} >= {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn quarter_note_is_ppqn() {
        assert_eq!(ClockLength::N4.ticks(), 192);
        assert_eq!(ClockLength::N8.ticks(), 96);
        assert_eq!(ClockLength::N1.ticks(), 768);
        assert_eq!(ClockLength::X16.ticks(), 16 * 768);
    }

    #[test]
    fn index_roundtrip() {
        for c in ClockLength::ALL {
            assert_eq!(ClockLength::from_index(c.index()), Some(c));
        }
        assert_eq!(ClockLength::from_index(NUM_CLOCKS + 1), None);
    }

    #[test]
    fn swing_buckets_cover_short_divisions() {
        assert_eq!(ClockLength::N16.swing_bucket(), Some(5));
        assert_eq!(ClockLength::N256.swing_bucket(), Some(1));
        assert_eq!(ClockLength::N16Dot.swing_bucket(), None);
        assert!(!ClockLength::N4.is_swingable());
    }

    #[test]
    fn clamped_respects_bounds() {
        assert_eq!(ClockLength::clamped(0, ClockLength::N256, ClockLength::X16), ClockLength::N256);
        assert_eq!(ClockLength::clamped(40, ClockLength::N256, ClockLength::X16), ClockLength::X16);
        assert_eq!(ClockLength::clamped(-1, ClockLength::None, ClockLength::X16), ClockLength::None);
    }

    #[test]
    fn labels_parse_back() {
        assert_eq!(ClockLength::from_label("1/16."), Some(ClockLength::N16Dot));
        assert_eq!(ClockLength::from_label("12/1"), Some(ClockLength::X12));
        assert_eq!(ClockLength::from_label("1/3"), None);
    }
}
