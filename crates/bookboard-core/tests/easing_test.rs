//! Integration tests for easing curves and date normalization.

use bookboard_core::animation::*;
use bookboard_core::time::{day_span, normalize, shift_days};
use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;

#[test]
fn easing_functions_are_monotonic() {
    for easing in [linear, ease_out, ease_out_cubic, ease_in_out] {
        let mut prev = 0.0f64;
        for i in 0..=100 {
            let t = f64::from(i) / 100.0;
            let v = easing(t);
            assert!(v >= prev - 1e-9, "easing should be monotonic at t={t}");
            prev = v;
        }
    }
}

fn instant(day: i64, secs: u32) -> NaiveDateTime {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let date = base + chrono::TimeDelta::days(day);
    date.and_hms_opt(secs / 3600, (secs / 60) % 60, secs % 60).unwrap()
}

proptest! {
    #[test]
    fn day_span_is_time_of_day_invariant(
        a in 0i64..2000,
        b in 0i64..2000,
        sa in 0u32..86_400,
        sb in 0u32..86_400,
    ) {
        prop_assert_eq!(day_span(instant(a, sa), instant(b, sb)), b - a);
    }

    #[test]
    fn shift_then_span_round_trips(day in 0i64..2000, secs in 0u32..86_400, delta in -400i64..400) {
        let start = instant(day, secs);
        let shifted = shift_days(start, delta).unwrap();
        prop_assert_eq!(day_span(start, shifted), delta);
        prop_assert_eq!(normalize(shifted), shifted);
    }
}
