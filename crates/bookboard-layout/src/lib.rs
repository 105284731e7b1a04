#![forbid(unsafe_code)]

//! Positioning, stacking, caching and height smoothing for lanes.
//!
//! The pipeline for one lane and one visible window:
//!
//! ```text
//!   intervals --position--> spans --pack--> PackingResult --cache-->
//!   target_height --LaneHeightResolver--> displayed height
//! ```
//!
//! Positioning and packing are pure. [`StackingCache`] memoizes committed
//! packings per `(lane, window)`; drag previews call [`pack_lane`] directly
//! and never touch it. [`LaneHeightResolver`] is the only stateful piece
//! that depends on time.

pub mod cache;
pub mod capacity;
pub mod height;
pub mod pack;
pub mod position;

pub use cache::{StackingCache, StackingCacheKey, StackingCacheStats};
pub use capacity::{CapacityStatus, capacity_report, peak_occupancy};
pub use height::{HeightAnimationConfig, LaneHeightResolver};
pub use pack::{
    PackingConfig, PackingResult, PlacedInterval, PositionedInterval, SharedPacking, pack,
    pack_lane,
};
pub use position::{IntervalError, Span, Timescale, position};
