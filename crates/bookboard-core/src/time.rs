#![forbid(unsafe_code)]

//! Date-only arithmetic over `chrono` instants.
//!
//! Reservations have day semantics: a stay runs from a check-in day to a
//! check-out day. Instants still carry a time-of-day because upstream data
//! does, so every computation first pins the time to noon via
//! [`normalize`]. Noon sits twelve hours away from either midnight, which
//! keeps day counts stable under timezone offsets and DST shifts.
//!
//! # Invariants
//!
//! 1. `normalize(normalize(t)) == normalize(t)`.
//! 2. `day_span(a, b)` only depends on the calendar dates of `a` and `b`.
//! 3. A [`TimeWindow`] maps to exactly one [`WindowKey`]; panning produces a
//!    different key, zoom never does.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// The reference time-of-day every instant is pinned to.
#[must_use]
pub fn noon() -> NaiveTime {
    NaiveTime::default() + TimeDelta::hours(12)
}

/// Pin an instant's time-of-day to noon, keeping its calendar date.
#[inline]
#[must_use]
pub fn normalize(instant: NaiveDateTime) -> NaiveDateTime {
    instant.date().and_time(noon())
}

/// Noon on the given calendar date.
#[inline]
#[must_use]
pub fn at_noon(date: NaiveDate) -> NaiveDateTime {
    date.and_time(noon())
}

/// Signed whole-day count from `from` to `to` after normalization.
#[inline]
#[must_use]
pub fn day_span(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    to.date().signed_duration_since(from.date()).num_days()
}

/// Move an instant by whole days, normalizing the result.
///
/// Returns `None` if the result would leave chrono's representable range.
#[must_use]
pub fn shift_days(instant: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    let delta = TimeDelta::try_days(days)?;
    normalize(instant).checked_add_signed(delta)
}

/// Cache key for a discretized visible window.
///
/// Only the origin day and the day count participate, so two windows that
/// cover the same days share cached geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowKey {
    /// Origin as days since the common era.
    pub origin_day: i32,
    /// Number of visible days.
    pub days: u32,
}

/// The visible slice of the timeline, in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// First visible day (pixel offset zero).
    pub origin: NaiveDate,
    /// Number of visible days (at least one).
    pub days: u32,
}

impl TimeWindow {
    /// Create a window; a zero day count is clamped to one.
    #[must_use]
    pub fn new(origin: NaiveDate, days: u32) -> Self {
        Self {
            origin,
            days: days.max(1),
        }
    }

    /// The cache key for this window.
    #[inline]
    #[must_use]
    pub fn key(&self) -> WindowKey {
        WindowKey {
            origin_day: self.origin.num_days_from_ce(),
            days: self.days,
        }
    }

    /// Noon on the origin day, the zero point for pixel offsets.
    #[inline]
    #[must_use]
    pub fn origin_instant(&self) -> NaiveDateTime {
        at_noon(self.origin)
    }

    /// First day after the window (exclusive bound).
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.origin
            .checked_add_signed(TimeDelta::days(i64::from(self.days)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Whether `day` is one of the visible days.
    #[must_use]
    pub fn contains_day(&self, day: NaiveDate) -> bool {
        day >= self.origin && day < self.end()
    }

    /// Whether a `[start, end)` stay touches any visible day.
    ///
    /// A degenerate stay (end on or before start) counts as visible when
    /// either endpoint falls on a visible day, so packing can reject and
    /// report it instead of it vanishing here.
    #[must_use]
    pub fn intersects(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        if end.date() <= start.date() {
            return self.contains_day(start.date()) || self.contains_day(end.date());
        }
        start.date() < self.end() && end.date() > self.origin
    }

    /// The same window moved by whole days.
    #[must_use]
    pub fn panned(&self, days: i64) -> Self {
        let origin = TimeDelta::try_days(days)
            .and_then(|delta| self.origin.checked_add_signed(delta))
            .unwrap_or(self.origin);
        Self { origin, ..*self }
    }
}
