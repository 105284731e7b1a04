#![forbid(unsafe_code)]

//! Over-capacity check for a lane.
//!
//! Counts how many stays cover the busiest single day and compares that to
//! the lane's declared capacity. This is a reporting aid only; packing
//! places every interval regardless.

use bookboard_core::{Interval, Lane};

/// Outcome of comparing a lane's peak occupancy to its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityStatus {
    /// The lane declares no capacity.
    Unbounded { peak: u32 },
    Within { peak: u32, capacity: u32 },
    Over { peak: u32, capacity: u32 },
}

impl CapacityStatus {
    #[must_use]
    pub fn peak(&self) -> u32 {
        match *self {
            Self::Unbounded { peak } | Self::Within { peak, .. } | Self::Over { peak, .. } => peak,
        }
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        matches!(self, Self::Over { .. })
    }
}

/// Largest number of intervals covering any single day.
///
/// Stays are `[start, end)` by date, so a checkout and a check-in on the
/// same day do not count as overlapping. Intervals without a positive day
/// range are ignored.
#[must_use]
pub fn peak_occupancy<'a>(intervals: impl IntoIterator<Item = &'a Interval>) -> u32 {
    // (day, +1 on arrival / -1 on departure); departures sort first.
    let mut edges: Vec<(chrono::NaiveDate, i32)> = Vec::new();
    for iv in intervals {
        if iv.days() < 1 {
            continue;
        }
        edges.push((iv.start.date(), 1));
        edges.push((iv.end.date(), -1));
    }
    edges.sort_unstable();

    let mut current: i32 = 0;
    let mut peak: i32 = 0;
    for (_, delta) in edges {
        current += delta;
        peak = peak.max(current);
    }
    peak.max(0) as u32
}

/// Compare a lane's peak occupancy to its declared capacity.
#[must_use]
pub fn capacity_report<'a>(
    lane: &Lane,
    intervals: impl IntoIterator<Item = &'a Interval>,
) -> CapacityStatus {
    let peak = peak_occupancy(intervals);
    match lane.capacity {
        None => CapacityStatus::Unbounded { peak },
        Some(capacity) if peak > capacity => {
            tracing::debug!(
                target: "bookboard.layout",
                lane = %lane.id,
                peak,
                capacity,
                "lane over capacity"
            );
            CapacityStatus::Over { peak, capacity }
        }
        Some(capacity) => CapacityStatus::Within { peak, capacity },
    }
}
