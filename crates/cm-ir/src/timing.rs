//! Tick-space constants and wraparound arithmetic.
//!
//! Every timed decision in the module is expressed in scheduler ticks.
//! The tick counter wraps every [`BARS_PER_WRAP`] bars, so any time
//! computed as `now + offset` must be reduced with [`wrap_add`].

use core::time::Duration;

/// Pulses (ticks) per quarter note.
pub const PPQN: u32 = 192;

/// Ticks per bar (four quarter notes).
pub const BAR_TICKS: u32 = PPQN * 4;

/// Number of bars before the tick counter wraps to zero.
pub const BARS_PER_WRAP: u32 = 64;

/// Exclusive upper bound of the tick counter.
pub const TICK_LIMIT: u32 = BAR_TICKS * BARS_PER_WRAP;

/// Ticks between two PWM updates on waveform channels.
pub const PWM_EVENT_TICKS: u32 = 6;

/// Number of output channels on the module.
pub const NUM_CHANNELS: usize = 8;

pub const MIN_BPM: u8 = 30;
pub const MAX_BPM: u8 = 200;
pub const DEFAULT_BPM: u8 = 100;

pub const MAX_SWING: u8 = 30;
pub const DEFAULT_SWING: u8 = 0;

/// A position on the wrapping tick counter, always `< TICK_LIMIT`.
pub type Tick = u32;

/// Reduce an arbitrary tick value into `[0, TICK_LIMIT)`.
pub const fn wrap(t: u32) -> Tick {
    t % TICK_LIMIT
}

/// `now + offset`, reduced modulo [`TICK_LIMIT`].
pub const fn wrap_add(now: Tick, offset: u32) -> Tick {
    wrap(wrap(now) + wrap(offset))
}

/// `now - offset`, reduced modulo [`TICK_LIMIT`].
pub const fn wrap_sub(now: Tick, offset: u32) -> Tick {
    wrap(wrap(now) + TICK_LIMIT - wrap(offset))
}

/// Whether `t` is the first tick of a bar.
pub const fn is_bar_boundary(t: Tick) -> bool {
    t % BAR_TICKS == 0
}

/// Clamp a requested tempo into `[MIN_BPM, MAX_BPM]`.
pub fn clamp_bpm(bpm: i32) -> u8 {
    bpm.clamp(MIN_BPM as i32, MAX_BPM as i32) as u8
}

/// Clamp a requested swing amount into `[0, MAX_SWING]`.
pub fn clamp_swing(amount: i32) -> u8 {
    amount.clamp(0, MAX_SWING as i32) as u8
}

/// Period of one scheduler tick at the given tempo.
///
/// Computed in whole nanoseconds so the timer period is reproducible.
pub fn tick_period(bpm: u8) -> Duration {
    let bpm = clamp_bpm(bpm as i32) as u64;
    Duration::from_nanos(60_000_000_000 / (bpm * PPQN as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_64_bars() {
        assert_eq!(TICK_LIMIT, 49_152);
        assert_eq!(TICK_LIMIT % BAR_TICKS, 0);
    }

    #[test]
    fn wrap_is_in_range_and_idempotent() {
        for t in [0, 1, TICK_LIMIT - 1, TICK_LIMIT, TICK_LIMIT + 5, 3 * TICK_LIMIT + 17, u32::MAX] {
            let w = wrap(t);
            assert!(w < TICK_LIMIT, "wrap({}) = {}", t, w);
            assert_eq!(wrap(w), w);
        }
    }

    #[test]
    fn wrap_add_crosses_limit() {
        assert_eq!(wrap_add(TICK_LIMIT - 10, 96), 86);
        assert_eq!(wrap_add(5, 0), 5);
    }

    #[test]
    fn wrap_sub_borrows_from_limit() {
        assert_eq!(wrap_sub(3, 10), TICK_LIMIT - 7);
        assert_eq!(wrap_sub(100, 30), 70);
    }

    #[test]
    fn bar_boundaries() {
        assert!(is_bar_boundary(0));
        assert!(is_bar_boundary(BAR_TICKS * 3));
        assert!(!is_bar_boundary(BAR_TICKS + 1));
    }

    #[test]
    fn tempo_clamps() {
        assert_eq!(clamp_bpm(5), MIN_BPM);
        assert_eq!(clamp_bpm(999), MAX_BPM);
        assert_eq!(clamp_bpm(120), 120);
        assert_eq!(clamp_swing(-3), 0);
        assert_eq!(clamp_swing(31), MAX_SWING);
    }

    #[test]
    fn tick_period_at_120_bpm() {
        // 120 * 192 / 60 = 384 ticks per second
        assert_eq!(tick_period(120), Duration::from_nanos(2_604_166));
    }

    #[test]
    fn tick_period_clamps_tempo() {
        assert_eq!(tick_period(10), tick_period(MIN_BPM));
        assert_eq!(tick_period(255), tick_period(MAX_BPM));
    }
}
