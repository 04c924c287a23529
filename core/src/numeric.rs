//! Rounding and guarded-division helpers.
//!
//! RULE: every percentage the engine reports goes through `round2`.
//! `f64::round` rounds half away from zero, which is the rounding the
//! downstream reports are reconciled against.

/// Round to 2 decimal places, half away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Round to 4 decimal places, half away from zero.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// `num / den * 100`, or 0 when the denominator is not positive.
/// Unrounded.
pub fn pct(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den * 100.0
    } else {
        0.0
    }
}

/// Integer-count variant of [`pct`].
pub fn pct_of_counts(num: i64, den: i64) -> f64 {
    pct(num as f64, den as f64)
}
