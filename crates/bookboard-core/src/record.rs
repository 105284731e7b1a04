#![forbid(unsafe_code)]

//! Committed record shapes: lanes, intervals, placements.
//!
//! An [`Interval`] holds only what the record store owns. Stack levels and
//! the speculative flag are derived per packing and live on the layout
//! crate's output types, never here.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::ids::{IntervalId, LaneId};
use crate::time::{at_noon, day_span, normalize};

/// A lane (hotel room row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: LaneId,
    #[serde(default)]
    pub label: String,
    /// Ceiling for the over-capacity check. Packing ignores it.
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl Lane {
    #[must_use]
    pub fn new(id: impl Into<LaneId>) -> Self {
        let id = id.into();
        Self {
            label: id.to_string(),
            id,
            capacity: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// Where an interval sits: its lane and its `[start, end)` instants.
///
/// This is the unit that drags speculate on, commits write, and rollbacks
/// restore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub lane: LaneId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Placement {
    #[must_use]
    pub fn new(lane: impl Into<LaneId>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            lane: lane.into(),
            start,
            end,
        }
    }

    /// A placement from check-in and check-out dates (both pinned to noon).
    #[must_use]
    pub fn from_dates(lane: impl Into<LaneId>, start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(lane, at_noon(start), at_noon(end))
    }

    /// Whole days covered after normalization.
    #[must_use]
    pub fn days(&self) -> i64 {
        day_span(self.start, self.end)
    }

    /// Whether the placement has a positive whole-day duration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.days() >= 1
    }

    /// Same placement with both instants pinned to noon.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            lane: self.lane.clone(),
            start: normalize(self.start),
            end: normalize(self.end),
        }
    }

    /// Equality at day granularity: same lane, same start and end dates.
    #[must_use]
    pub fn same_days(&self, other: &Self) -> bool {
        self.lane == other.lane
            && self.start.date() == other.start.date()
            && self.end.date() == other.end.date()
    }
}

/// A committed reservation record assigned to a lane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub id: IntervalId,
    #[serde(rename = "lane_id")]
    pub lane: LaneId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    #[must_use]
    pub fn new(
        id: impl Into<IntervalId>,
        lane: impl Into<LaneId>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            lane: lane.into(),
            start,
            end,
        }
    }

    /// An interval from check-in and check-out dates (both pinned to noon).
    #[must_use]
    pub fn from_dates(
        id: impl Into<IntervalId>,
        lane: impl Into<LaneId>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self::new(id, lane, at_noon(start), at_noon(end))
    }

    /// Current placement of this record.
    #[must_use]
    pub fn placement(&self) -> Placement {
        Placement {
            lane: self.lane.clone(),
            start: self.start,
            end: self.end,
        }
    }

    /// Overwrite lane and dates from a placement.
    pub fn apply(&mut self, placement: &Placement) {
        self.lane = placement.lane.clone();
        self.start = placement.start;
        self.end = placement.end;
    }

    /// The same record moved to another placement.
    #[must_use]
    pub fn placed_at(&self, placement: &Placement) -> Self {
        let mut moved = self.clone();
        moved.apply(placement);
        moved
    }

    /// Whole days covered after normalization.
    #[must_use]
    pub fn days(&self) -> i64 {
        day_span(self.start, self.end)
    }
}
