#![forbid(unsafe_code)]

//! Lane stacking: assign each positioned interval a vertical stack level.
//!
//! Greedy first-fit over intervals sorted by offset. Two intervals may share
//! a level only when their drawn spans intersect by at most
//! `overlap_tolerance_px`; the slack absorbs sub-pixel rounding so touching
//! bars don't force an extra level.
//!
//! # Invariants
//!
//! 1. Below the level ceiling, no two intervals on the same level overlap
//!    by more than the tolerance.
//! 2. Levels used equal the largest set of mutually-overlapping intervals
//!    (interval graphs colour optimally under first-fit by left edge).
//! 3. Identical input in identical order yields identical levels; ties on
//!    offset keep input order.
//!
//! # Failure Modes
//!
//! - More overlapping intervals than `level_ceiling`: the excess is placed
//!   on the ceiling level and the result is flagged `saturated`. Packing
//!   never fails and never loops unboundedly.
//! - Invalid intervals (end on or before start): excluded from the result,
//!   listed in `rejected`, logged at `warn`.

use std::sync::Arc;

use bookboard_core::{Interval, IntervalId, TimeWindow};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::position::{Span, Timescale, position};

/// Default overlap slack in pixels.
pub const DEFAULT_OVERLAP_TOLERANCE_PX: f64 = 1.0;
/// Default highest level the packer searches before force-placing.
pub const DEFAULT_LEVEL_CEILING: u32 = 16;

/// Vertical metrics and packing thresholds for one lane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingConfig {
    /// Intersections up to this many pixels don't count as overlap.
    pub overlap_tolerance_px: f64,
    /// Levels `0..level_ceiling` are searched; overflow lands on the ceiling.
    pub level_ceiling: u32,
    /// Padding split evenly above the first and below the last level.
    pub base_padding: f64,
    /// Height of one bar.
    pub bar_unit: f64,
    /// Vertical gap following each bar.
    pub inter_bar_gap: f64,
    /// Minimum lane height, also used for empty lanes.
    pub floor_height: f64,
}

impl PackingConfig {
    /// Height needed to show `levels` stacked bars, before the floor.
    #[inline]
    #[must_use]
    pub fn stacked_height(&self, levels: u32) -> f64 {
        self.base_padding + f64::from(levels) * (self.bar_unit + self.inter_bar_gap)
    }

    /// Lane height for a packing whose highest level is `max_level`.
    #[must_use]
    pub fn target_height(&self, max_level: u32, is_empty: bool) -> f64 {
        if is_empty {
            return self.floor_height;
        }
        self.stacked_height(max_level.saturating_add(1))
            .max(self.floor_height)
    }

    /// Vertical offset of a level's bar from the lane top.
    #[inline]
    #[must_use]
    pub fn bar_offset(&self, level: u32) -> f64 {
        self.base_padding / 2.0 + f64::from(level) * (self.bar_unit + self.inter_bar_gap)
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        let base_padding = 6.0;
        let bar_unit = 18.0;
        let inter_bar_gap = 4.0;
        Self {
            overlap_tolerance_px: DEFAULT_OVERLAP_TOLERANCE_PX,
            level_ceiling: DEFAULT_LEVEL_CEILING,
            base_padding,
            bar_unit,
            inter_bar_gap,
            floor_height: base_padding + bar_unit + inter_bar_gap,
        }
    }
}

/// An interval with its pixel span, ready for packing.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedInterval {
    pub id: IntervalId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub span: Span,
    /// Preview-only; never committed, never persisted.
    pub is_speculative: bool,
}

/// A packed interval annotated with its stack level.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedInterval {
    pub id: IntervalId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub span: Span,
    pub stack_level: u32,
    pub is_speculative: bool,
}

/// Packing of one lane for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct PackingResult {
    /// Intervals sorted by offset, each with its level.
    pub ordered_intervals: Vec<PlacedInterval>,
    /// Highest level assigned (0 when empty).
    pub max_stack_level: u32,
    /// Lane height this packing asks for.
    pub target_height: f64,
    /// Whether the level ceiling forced any placement (overbooked lane).
    pub saturated: bool,
    /// Intervals left out because their range was invalid.
    pub rejected: Vec<IntervalId>,
}

impl PackingResult {
    /// An empty lane.
    #[must_use]
    pub fn empty(config: &PackingConfig) -> Self {
        Self {
            ordered_intervals: Vec::new(),
            max_stack_level: 0,
            target_height: config.target_height(0, true),
            saturated: false,
            rejected: Vec::new(),
        }
    }

    /// Number of levels in use.
    #[must_use]
    pub fn levels_used(&self) -> u32 {
        if self.ordered_intervals.is_empty() {
            0
        } else {
            self.max_stack_level + 1
        }
    }

    /// Look up a packed interval.
    #[must_use]
    pub fn get(&self, id: &IntervalId) -> Option<&PlacedInterval> {
        self.ordered_intervals.iter().find(|p| &p.id == id)
    }

    /// Stack level of an interval, if it is in this packing.
    #[must_use]
    pub fn level_of(&self, id: &IntervalId) -> Option<u32> {
        self.get(id).map(|p| p.stack_level)
    }

    #[must_use]
    pub fn contains(&self, id: &IntervalId) -> bool {
        self.get(id).is_some()
    }

    /// The preview interval, if any.
    #[must_use]
    pub fn speculative(&self) -> Option<&PlacedInterval> {
        self.ordered_intervals.iter().find(|p| p.is_speculative)
    }
}

/// Pack positioned intervals into stack levels.
#[must_use]
pub fn pack(intervals: Vec<PositionedInterval>, config: &PackingConfig) -> PackingResult {
    if intervals.is_empty() {
        return PackingResult::empty(config);
    }

    let mut sorted = intervals;
    // Stable: equal offsets keep input order.
    sorted.sort_by(|a, b| a.span.offset.total_cmp(&b.span.offset));

    // Furthest right edge placed so far on each level. Since intervals arrive
    // in left-edge order, checking against this reach is equivalent to
    // checking every interval already on the level.
    let mut reach: Vec<f64> = Vec::new();
    let mut saturated = false;
    let mut max_stack_level = 0;
    let mut ordered_intervals = Vec::with_capacity(sorted.len());

    for item in sorted {
        let left = item.span.left();
        let right = item.span.right();
        let free = (0..config.level_ceiling as usize).find(|&level| match reach.get(level) {
            None => true,
            Some(&edge) => right.min(edge) - left <= config.overlap_tolerance_px,
        });

        let stack_level = match free {
            Some(level) => {
                if level == reach.len() {
                    reach.push(right);
                } else {
                    reach[level] = reach[level].max(right);
                }
                level as u32
            }
            None => {
                saturated = true;
                config.level_ceiling
            }
        };

        max_stack_level = max_stack_level.max(stack_level);
        ordered_intervals.push(PlacedInterval {
            id: item.id,
            start: item.start,
            end: item.end,
            span: item.span,
            stack_level,
            is_speculative: item.is_speculative,
        });
    }

    if saturated {
        tracing::warn!(
            target: "bookboard.layout",
            intervals = ordered_intervals.len(),
            level_ceiling = config.level_ceiling,
            "lane saturated; overflow placed on ceiling level"
        );
    }

    PackingResult {
        target_height: config.target_height(max_stack_level, false),
        ordered_intervals,
        max_stack_level,
        saturated,
        rejected: Vec::new(),
    }
}

/// Position and pack one lane.
///
/// `committed` is the lane's record set for the window; `speculative` is an
/// optional preview interval injected after them (so it loses offset ties).
/// Invalid intervals are logged and reported in `rejected`.
#[must_use]
pub fn pack_lane<'a>(
    committed: impl IntoIterator<Item = &'a Interval>,
    speculative: Option<&Interval>,
    window: &TimeWindow,
    scale: &Timescale,
    config: &PackingConfig,
) -> PackingResult {
    let origin = window.origin_instant();
    let mut positioned = Vec::new();
    let mut rejected = Vec::new();

    let tagged = committed
        .into_iter()
        .map(|iv| (iv, false))
        .chain(speculative.map(|iv| (iv, true)));

    for (interval, is_speculative) in tagged {
        match position(interval, origin, scale) {
            Ok(span) => positioned.push(PositionedInterval {
                id: interval.id.clone(),
                start: interval.start,
                end: interval.end,
                span,
                is_speculative,
            }),
            Err(err) => {
                tracing::warn!(
                    target: "bookboard.layout",
                    interval = %interval.id,
                    lane = %interval.lane,
                    error = %err,
                    "interval excluded from packing"
                );
                rejected.push(interval.id.clone());
            }
        }
    }

    let mut result = pack(positioned, config);
    result.rejected = rejected;
    result
}

/// Shared packing handle, as stored in the cache and handed to renderers.
pub type SharedPacking = Arc<PackingResult>;
