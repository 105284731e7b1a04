#![forbid(unsafe_code)]

//! Interval positioning: `[start, end)` instants to a horizontal pixel span.
//!
//! Positioning is a pure function of the interval, the window origin and
//! the [`Timescale`]. Nothing here is cached; callers re-position whenever
//! zoom (`pixels_per_day`) or scroll (origin) changes.
//!
//! ```text
//!   offset = day_span(origin, start) * pixels_per_day
//!   length = day_span(start, end)    * pixels_per_day - 2 * gutter
//!
//!   |<-------- offset -------->|gutter|<==== length ====>|gutter|
//! ```
//!
//! The gutter keeps back-to-back stays (checkout day == next check-in day)
//! from visually touching.

use std::fmt;

use bookboard_core::time::day_span;
use bookboard_core::{Interval, IntervalId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Default horizontal scale.
pub const DEFAULT_PIXELS_PER_DAY: f64 = 40.0;
/// Default inset on each side of a bar.
pub const DEFAULT_GUTTER_PX: f64 = 2.0;

/// Horizontal scale of the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timescale {
    /// Width of one day in pixels (zoom).
    pub pixels_per_day: f64,
    /// Inset applied to each side of a bar.
    pub gutter_px: f64,
}

impl Timescale {
    #[must_use]
    pub const fn new(pixels_per_day: f64, gutter_px: f64) -> Self {
        Self {
            pixels_per_day,
            gutter_px,
        }
    }

    /// Convert a pixel distance into a whole-day count, rounding to the
    /// nearest day.
    #[must_use]
    pub fn days_for_pixels(&self, px: f64) -> i64 {
        if !self.is_usable() {
            return 0;
        }
        (px / self.pixels_per_day).round() as i64
    }

    /// Whether this scale can position anything.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.pixels_per_day.is_finite()
            && self.pixels_per_day > 0.0
            && self.gutter_px.is_finite()
            && self.gutter_px >= 0.0
    }
}

impl Default for Timescale {
    fn default() -> Self {
        Self::new(DEFAULT_PIXELS_PER_DAY, DEFAULT_GUTTER_PX)
    }
}

/// Horizontal pixel span of a positioned interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    /// Distance from the window origin to the start day's edge.
    pub offset: f64,
    /// Drawn bar width (day width minus both gutters, never negative).
    pub length: f64,
    /// Gutter applied on each side.
    pub inset: f64,
}

impl Span {
    /// Left edge of the drawn bar.
    #[inline]
    #[must_use]
    pub fn left(&self) -> f64 {
        self.offset + self.inset
    }

    /// Right edge of the drawn bar.
    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left() + self.length
    }

    /// Amount by which two spans intersect (negative when apart).
    #[inline]
    #[must_use]
    pub fn intersection(&self, other: &Span) -> f64 {
        self.right().min(other.right()) - self.left().max(other.left())
    }

    /// Whether the spans intersect by more than `tolerance` pixels.
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Span, tolerance: f64) -> bool {
        self.intersection(other) > tolerance
    }
}

/// Why an interval could not be positioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    /// `end` falls on an earlier day than `start`.
    Inverted {
        id: IntervalId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// `start` and `end` fall on the same day.
    ZeroDuration { id: IntervalId },
    /// The timescale has a non-positive or non-finite day width.
    UnusableScale { id: IntervalId },
}

impl fmt::Display for IntervalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inverted { id, start, end } => {
                write!(f, "interval {id} ends ({end}) before it starts ({start})")
            }
            Self::ZeroDuration { id } => {
                write!(f, "interval {id} starts and ends on the same day")
            }
            Self::UnusableScale { id } => {
                write!(f, "interval {id} cannot be positioned on an unusable timescale")
            }
        }
    }
}

impl std::error::Error for IntervalError {}

/// Validate an interval's day range.
pub fn validate(interval: &Interval) -> Result<i64, IntervalError> {
    let days = day_span(interval.start, interval.end);
    match days {
        d if d < 0 => Err(IntervalError::Inverted {
            id: interval.id.clone(),
            start: interval.start,
            end: interval.end,
        }),
        0 => Err(IntervalError::ZeroDuration {
            id: interval.id.clone(),
        }),
        d => Ok(d),
    }
}

/// Position an interval relative to `origin` on `scale`.
///
/// # Errors
///
/// Returns [`IntervalError`] for inverted or zero-day intervals and for an
/// unusable scale. Such intervals must be left out of packing.
pub fn position(
    interval: &Interval,
    origin: NaiveDateTime,
    scale: &Timescale,
) -> Result<Span, IntervalError> {
    if !scale.is_usable() {
        return Err(IntervalError::UnusableScale {
            id: interval.id.clone(),
        });
    }
    let days = validate(interval)?;
    let offset = day_span(origin, interval.start) as f64 * scale.pixels_per_day;
    let length = (days as f64 * scale.pixels_per_day - 2.0 * scale.gutter_px).max(0.0);
    Ok(Span {
        offset,
        length,
        inset: scale.gutter_px,
    })
}
