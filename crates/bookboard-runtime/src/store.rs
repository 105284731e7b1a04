#![forbid(unsafe_code)]

//! Committed record access.
//!
//! [`RecordStore`] is the only source of truth for committed lanes and
//! intervals. The board reads through it every frame and writes through it
//! only from the commit path; drag previews never touch it.
//!
//! [`MemoryStore`] is an owned, `Vec`-backed implementation. Iteration order
//! is insertion order, which keeps packing ties deterministic.

use std::fmt;

use bookboard_core::{Interval, IntervalId, Lane, LaneId, Placement, TimeWindow};

/// Why a store write was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    UnknownInterval(IntervalId),
    UnknownLane(LaneId),
    /// The placement does not cover at least one whole day.
    InvalidPlacement { id: IntervalId, days: i64 },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownInterval(id) => write!(f, "unknown interval {id}"),
            Self::UnknownLane(lane) => write!(f, "unknown lane {lane}"),
            Self::InvalidPlacement { id, days } => {
                write!(f, "placement for interval {id} spans {days} day(s); at least 1 required")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Read/write access to committed records.
pub trait RecordStore {
    /// Every committed interval.
    fn list_intervals(&self) -> Vec<Interval>;

    /// Every lane, in display order.
    fn list_lanes(&self) -> Vec<Lane>;

    fn interval(&self, id: &IntervalId) -> Option<Interval>;

    /// Committed intervals in `lane` that touch `window`.
    fn intervals_in_lane(&self, lane: &LaneId, window: &TimeWindow) -> Vec<Interval> {
        self.list_intervals()
            .into_iter()
            .filter(|iv| &iv.lane == lane && window.intersects(iv.start, iv.end))
            .collect()
    }

    /// Move an interval to `placement`.
    ///
    /// # Errors
    ///
    /// Fails for an unknown interval or lane, or a placement shorter than
    /// one day. The record is untouched on error.
    fn apply(&mut self, id: &IntervalId, placement: &Placement) -> Result<(), StoreError>;

    /// Insert an interval, or replace the one with the same id.
    ///
    /// Returns the previous record, whose lane may need invalidating too.
    fn upsert_interval(&mut self, interval: Interval) -> Option<Interval>;

    fn remove_interval(&mut self, id: &IntervalId) -> Option<Interval>;
}

/// In-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    lanes: Vec<Lane>,
    intervals: Vec<Interval>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from lanes and intervals as loaded from a feed.
    #[must_use]
    pub fn from_records(
        lanes: impl IntoIterator<Item = Lane>,
        intervals: impl IntoIterator<Item = Interval>,
    ) -> Self {
        let mut store = Self::new();
        for lane in lanes {
            store.upsert_lane(lane);
        }
        for interval in intervals {
            store.upsert_interval(interval);
        }
        store
    }

    /// Insert a lane, or replace the lane with the same id in place.
    pub fn upsert_lane(&mut self, lane: Lane) -> Option<Lane> {
        match self.lanes.iter_mut().find(|l| l.id == lane.id) {
            Some(slot) => Some(std::mem::replace(slot, lane)),
            None => {
                self.lanes.push(lane);
                None
            }
        }
    }

    /// Remove a lane together with the intervals assigned to it.
    pub fn remove_lane(&mut self, id: &LaneId) -> Option<(Lane, Vec<Interval>)> {
        let index = self.lanes.iter().position(|l| &l.id == id)?;
        let lane = self.lanes.remove(index);
        let (gone, kept): (Vec<_>, Vec<_>) =
            self.intervals.drain(..).partition(|iv| &iv.lane == id);
        self.intervals = kept;
        Some((lane, gone))
    }

    #[must_use]
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    #[must_use]
    pub fn lane(&self, id: &LaneId) -> Option<&Lane> {
        self.lanes.iter().find(|l| &l.id == id)
    }
}

impl RecordStore for MemoryStore {
    fn list_intervals(&self) -> Vec<Interval> {
        self.intervals.clone()
    }

    fn list_lanes(&self) -> Vec<Lane> {
        self.lanes.clone()
    }

    fn interval(&self, id: &IntervalId) -> Option<Interval> {
        self.intervals.iter().find(|iv| &iv.id == id).cloned()
    }

    fn intervals_in_lane(&self, lane: &LaneId, window: &TimeWindow) -> Vec<Interval> {
        self.intervals
            .iter()
            .filter(|iv| &iv.lane == lane && window.intersects(iv.start, iv.end))
            .cloned()
            .collect()
    }

    fn apply(&mut self, id: &IntervalId, placement: &Placement) -> Result<(), StoreError> {
        if self.lane(&placement.lane).is_none() {
            return Err(StoreError::UnknownLane(placement.lane.clone()));
        }
        if !placement.is_valid() {
            return Err(StoreError::InvalidPlacement {
                id: id.clone(),
                days: placement.days(),
            });
        }
        let record = self
            .intervals
            .iter_mut()
            .find(|iv| &iv.id == id)
            .ok_or_else(|| StoreError::UnknownInterval(id.clone()))?;
        record.apply(placement);
        Ok(())
    }

    fn upsert_interval(&mut self, interval: Interval) -> Option<Interval> {
        match self.intervals.iter_mut().find(|iv| iv.id == interval.id) {
            Some(slot) => Some(std::mem::replace(slot, interval)),
            None => {
                self.intervals.push(interval);
                None
            }
        }
    }

    fn remove_interval(&mut self, id: &IntervalId) -> Option<Interval> {
        let index = self.intervals.iter().position(|iv| &iv.id == id)?;
        Some(self.intervals.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::from_records(
            [Lane::new("101"), Lane::new("102")],
            [
                Interval::from_dates("a", 101_u32, d(2), d(4)),
                Interval::from_dates("b", "101", d(10), d(12)),
                Interval::from_dates("c", "102", d(3), d(5)),
            ],
        )
    }

    #[test]
    fn lane_lookup_is_identity_tolerant() {
        let s = store();
        let window = TimeWindow::new(d(1), 7);
        let ids: Vec<_> = s
            .intervals_in_lane(&LaneId::from(101_u64), &window)
            .into_iter()
            .map(|iv| iv.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a".to_string()]);
    }

    #[test]
    fn window_filter_is_half_open() {
        let s = store();
        // "b" checks in on the 10th: a window ending on the 10th excludes it.
        let window = TimeWindow::new(d(4), 6);
        assert!(s.intervals_in_lane(&"101".into(), &window).is_empty());
        let window = TimeWindow::new(d(4), 7);
        assert_eq!(s.intervals_in_lane(&"101".into(), &window).len(), 1);
    }

    #[test]
    fn apply_moves_record() {
        let mut s = store();
        let target = Placement::from_dates("102", d(6), d(9));
        s.apply(&"a".into(), &target).unwrap();
        assert_eq!(s.interval(&"a".into()).unwrap().placement(), target);
    }

    #[test]
    fn apply_rejects_bad_targets_without_mutation() {
        let mut s = store();
        let before = s.interval(&"a".into()).unwrap();

        let unknown_lane = Placement::from_dates("999", d(6), d(9));
        assert_eq!(
            s.apply(&"a".into(), &unknown_lane),
            Err(StoreError::UnknownLane("999".into()))
        );
        let zero = Placement::from_dates("101", d(6), d(6));
        assert!(matches!(
            s.apply(&"a".into(), &zero),
            Err(StoreError::InvalidPlacement { days: 0, .. })
        ));
        let missing = Placement::from_dates("101", d(6), d(8));
        assert_eq!(
            s.apply(&"zz".into(), &missing),
            Err(StoreError::UnknownInterval("zz".into()))
        );
        assert_eq!(s.interval(&"a".into()).unwrap(), before);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut s = store();
        let previous = s.upsert_interval(Interval::from_dates("a", "102", d(1), d(2)));
        assert_eq!(previous.unwrap().lane, LaneId::from("101"));
        assert_eq!(s.intervals()[0].lane, LaneId::from("102"));
        assert_eq!(s.intervals().len(), 3);
    }

    #[test]
    fn remove_lane_takes_its_intervals() {
        let mut s = store();
        let (lane, gone) = s.remove_lane(&"101".into()).unwrap();
        assert_eq!(lane.id, LaneId::from("101"));
        assert_eq!(gone.len(), 2);
        assert_eq!(s.intervals().len(), 1);
        assert!(s.remove_lane(&"101".into()).is_none());
    }

    #[test]
    fn error_display() {
        let err = StoreError::UnknownLane("7".into());
        assert_eq!(err.to_string(), "unknown lane 7");
    }
}
