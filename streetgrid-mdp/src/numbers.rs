//! Numeric conversion helpers centralizing the crate's lossy casts.

use num_traits::cast::cast;

/// Convert a count to f64, saturating at `f64::MAX` if the cast ever fails.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

/// Convert a count to an `i32` exponent for `powi`, clamping at `i32::MAX`.
#[must_use]
pub fn usize_to_exponent(value: usize) -> i32 {
    cast::<usize, i32>(value).unwrap_or(i32::MAX)
}

/// Reward paid for waiting `delay` steps.
#[must_use]
pub fn delay_reward(delay: usize) -> f64 {
    -usize_to_f64(delay)
}

/// Whether `value` is a usable probability.
#[must_use]
pub fn is_probability(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}
