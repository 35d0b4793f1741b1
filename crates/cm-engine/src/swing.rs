//! Swing table and the alternating swing offset.

use cm_ir::{clamp_swing, wrap_add, wrap_sub, Tick, SWINGABLE_LIMIT};

/// Number of swing buckets, one per swingable clock length index.
pub const SWING_BUCKETS: usize = SWINGABLE_LIMIT as usize;

/// Tick offsets per swingable clock length, derived from the swing amount.
///
/// `offsets[i] = amount >> (5 - i)`, raised to at least 1 whenever swing
/// is on so even the shortest divisions move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwingTable {
    amount: u8,
    offsets: [u8; SWING_BUCKETS],
}

impl SwingTable {
    pub fn new(amount: u8) -> Self {
        let amount = clamp_swing(amount as i32);
        let mut offsets = [0u8; SWING_BUCKETS];
        for (i, offset) in offsets.iter_mut().enumerate() {
            *offset = amount >> (SWING_BUCKETS - 1 - i);
            if amount > 0 {
                *offset = (*offset).max(1);
            }
        }
        Self { amount, offsets }
    }

    pub fn amount(&self) -> u8 {
        self.amount
    }

    /// Offset in ticks for `bucket`; zero past the table.
    pub fn offset(&self, bucket: usize) -> u32 {
        self.offsets.get(bucket).copied().unwrap_or(0) as u32
    }

    pub fn offsets(&self) -> [u8; SWING_BUCKETS] {
        self.offsets
    }
}

/// Shift `base` by `offset`, alternating direction on every call.
///
/// `delayed` is the channel's swing phase: when set the beat is pulled
/// early, otherwise pushed late. The phase flips either way, so a pair
/// of swung beats keeps the overall tempo.
pub fn apply_swing(base: Tick, offset: u32, delayed: &mut bool) -> Tick {
    let time = if *delayed {
        wrap_sub(base, offset)
    } else {
        wrap_add(base, offset)
    };
    *delayed = !*delayed;
    time
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_ir::TICK_LIMIT;

    #[test]
    fn zero_swing_is_all_zero() {
        assert_eq!(SwingTable::new(0).offsets(), [0; SWING_BUCKETS]);
    }

    #[test]
    fn table_halves_per_bucket() {
        let table = SwingTable::new(30);
        assert_eq!(table.offsets(), [1, 1, 3, 7, 15, 30]);
    }

    #[test]
    fn small_swing_clamps_to_one() {
        assert_eq!(SwingTable::new(1).offsets(), [1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn amount_is_clamped() {
        assert_eq!(SwingTable::new(200).amount(), 30);
    }

    #[test]
    fn offset_past_table_is_zero() {
        assert_eq!(SwingTable::new(30).offset(9), 0);
    }

    #[test]
    fn swing_alternates_direction() {
        let mut delayed = false;
        assert_eq!(apply_swing(100, 5, &mut delayed), 105);
        assert!(delayed);
        assert_eq!(apply_swing(100, 5, &mut delayed), 95);
        assert!(!delayed);
    }

    #[test]
    fn swing_wraps_both_ways() {
        let mut delayed = false;
        assert_eq!(apply_swing(TICK_LIMIT - 2, 5, &mut delayed), 3);
        assert_eq!(apply_swing(2, 5, &mut delayed), TICK_LIMIT - 3);
    }
}
