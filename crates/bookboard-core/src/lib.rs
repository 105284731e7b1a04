#![forbid(unsafe_code)]

//! Core: identifiers, date normalization, pixel geometry and pointer events.
//!
//! # Role in bookboard
//! `bookboard-core` is the vocabulary layer. It owns the identity types that
//! every other crate keys on, the date arithmetic that keeps day counts
//! immune to time-of-day noise, and the normalized pointer stream that the
//! drag engine consumes.
//!
//! # Primary responsibilities
//! - **Ids**: [`LaneId`](ids::LaneId) and [`IntervalId`](ids::IntervalId)
//!   with one canonical string form, whatever type the data source used.
//! - **Time**: noon normalization, whole-day deltas, and the discretized
//!   visible [`TimeWindow`](time::TimeWindow).
//! - **Records**: committed [`Interval`](record::Interval),
//!   [`Lane`](record::Lane) and [`Placement`](record::Placement) shapes.
//! - **Geometry**: [`PixelRect`](geometry::PixelRect) for hit regions.
//! - **Events**: [`PointerEvent`](event::PointerEvent) with
//!   `down | move | up | cancel` phases.
//! - **Animation**: easing curves used by lane-height smoothing.
//!
//! # How it fits in the system
//! `bookboard-layout` turns records into packed lanes using these types, and
//! `bookboard-runtime` drives drags and commits on top of both.

pub mod animation;
pub mod event;
pub mod geometry;
pub mod ids;
pub mod record;
pub mod time;

pub use event::{CancelReason, PointerEvent, PointerPhase, PointerPosition};
pub use geometry::PixelRect;
pub use ids::{IntervalId, LaneId};
pub use record::{Interval, Lane, Placement};
pub use time::{TimeWindow, WindowKey};
