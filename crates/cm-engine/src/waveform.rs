//! Waveform shaping for ramp and sine channels.

use core::f64::consts::PI;

/// Rising or falling ramp across `[0, span]`, held at the end level past `span`.
pub fn ramp_level(elapsed: u32, span: u32, falling: bool) -> u8 {
    let rising = if span == 0 {
        255
    } else {
        (elapsed.min(span) as u64 * 255 / span as u64) as u8
    };
    if falling {
        255 - rising
    } else {
        rising
    }
}

/// One raised-cosine cycle over `span` ticks, starting and ending at 0.
pub fn sine_level(elapsed: u32, span: u32) -> u8 {
    if span == 0 {
        return 0;
    }
    let phase = 2.0 * PI * elapsed as f64 / span as f64;
    let level = 255.0 * (1.0 - libm::cos(phase)) / 2.0;
    libm::round(level).clamp(0.0, 255.0) as u8
}
