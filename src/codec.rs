//! Interval codec for 16-bit compare-match timers with a fixed /1024 prescaler.
//!
//! One count lasts `PRESCALER / clock` seconds, so on a 16 MHz part the resolution is
//! 64 us and the longest period a 16-bit compare register holds is
//! `65535 * 64 us = 4.194 s`.

use crate::time::Hertz;

/// Fixed clock divider programmed into the timer.
pub const PRESCALER: u32 = 1024;

/// Shortest interval accepted, in ms.
pub const MIN_INTERVAL_MS: u32 = 1;

/// Compare register value together with the interval it really produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompareMatch {
    /// Value for the output compare register.
    pub counter: u16,
    /// The request after clamping to `[MIN_INTERVAL_MS, max_interval_ms(clock)]`.
    pub interval_ms: u32,
}

/// Longest interval the 16-bit counter can express at `clock`, in whole ms.
pub const fn max_interval_ms(clock: Hertz) -> u32 {
    if clock.0 == 0 {
        return MIN_INTERVAL_MS;
    }
    let max = u16::MAX as u64 * PRESCALER as u64 * 1_000 / clock.0 as u64;
    if max < MIN_INTERVAL_MS as u64 {
        MIN_INTERVAL_MS
    } else if max > u32::MAX as u64 {
        u32::MAX
    } else {
        max as u32
    }
}

/// Translates a millisecond request into a compare value.
///
/// `counter = round(ms / (PRESCALER / clock)) - 1`, the hardware counts zero too.
/// The counter never drops below 1.
pub fn encode(requested_ms: u32, clock: Hertz) -> CompareMatch {
    let interval_ms = requested_ms.clamp(MIN_INTERVAL_MS, max_interval_ms(clock));

    let per_ms = PRESCALER as u64 * 1_000;
    let ticks = (interval_ms as u64 * clock.0 as u64 + per_ms / 2) / per_ms;
    let counter = ticks.saturating_sub(1).clamp(1, u16::MAX as u64) as u16;

    CompareMatch { counter, interval_ms }
}
