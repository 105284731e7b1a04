#![forbid(unsafe_code)]

//! Easing curves.
//!
//! Every curve maps progress `t` in `[0.0, 1.0]` to an eased value in
//! `[0.0, 1.0]`. Inputs outside the range are clamped first, so callers can
//! feed raw `elapsed / duration` ratios without pre-checking.
//!
//! # Invariants
//!
//! 1. `f(0.0) == 0.0` and `f(1.0) == 1.0` for every curve.
//! 2. Every curve is monotonically non-decreasing on `[0, 1]`.

/// An easing curve.
pub type Easing = fn(f64) -> f64;

#[inline]
fn clamp01(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// Identity curve.
#[must_use]
pub fn linear(t: f64) -> f64 {
    clamp01(t)
}

/// Quadratic ease-out: fast start, gentle landing.
#[must_use]
pub fn ease_out(t: f64) -> f64 {
    let t = clamp01(t);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Cubic ease-out.
#[must_use]
pub fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - clamp01(t);
    1.0 - inv * inv * inv
}

/// Quadratic ease-in-out.
#[must_use]
pub fn ease_in_out(t: f64) -> f64 {
    let t = clamp01(t);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Linear interpolation between `from` and `to` at eased progress `t`.
#[inline]
#[must_use]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
