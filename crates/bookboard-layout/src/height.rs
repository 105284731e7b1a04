#![forbid(unsafe_code)]

//! Lane height smoothing.
//!
//! Packing yields a target height per lane; [`LaneHeightResolver`] eases the
//! rendered height toward it over a fixed duration, so the rows beneath a
//! lane slide instead of jumping when a drag adds or removes a level.
//!
//! # Invariants
//!
//! 1. At most one tween per lane. A target more than `epsilon_px` away from
//!    the current aim restarts the tween from the height currently on
//!    screen, never from the previous target. Smaller changes move the end
//!    point and keep the original deadline.
//! 2. Once a tween completes (or the gap drops below `epsilon_px`) the lane
//!    reports exactly its target and the tween is removed.
//! 3. `animate = false` snaps to the target and clears any tween.
//!
//! Time is injected (`now`), never read from a clock here, so frames are
//! reproducible in tests.

use std::time::Duration;

use bookboard_core::LaneId;
use bookboard_core::animation::{Easing, ease_out_cubic, lerp};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use web_time::Instant;

/// Default tween duration.
pub const DEFAULT_HEIGHT_DURATION: Duration = Duration::from_millis(220);
/// Default gap below which a tween is considered settled.
pub const DEFAULT_HEIGHT_EPSILON_PX: f64 = 0.5;

/// Height animation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightAnimationConfig {
    /// Tween length in milliseconds.
    pub duration_ms: u64,
    /// Gap (px) below which the tween snaps to its target.
    pub epsilon_px: f64,
}

impl HeightAnimationConfig {
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for HeightAnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_HEIGHT_DURATION.as_millis() as u64,
            epsilon_px: DEFAULT_HEIGHT_EPSILON_PX,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HeightTween {
    from: f64,
    to: f64,
    started: Instant,
}

#[derive(Debug, Clone, Copy)]
struct LaneHeight {
    /// Last height handed out for this lane.
    shown: f64,
    tween: Option<HeightTween>,
}

/// Per-lane displayed-height state.
#[derive(Debug)]
pub struct LaneHeightResolver {
    lanes: FxHashMap<LaneId, LaneHeight>,
    config: HeightAnimationConfig,
    easing: Easing,
}

impl LaneHeightResolver {
    #[must_use]
    pub fn new(config: HeightAnimationConfig) -> Self {
        Self {
            lanes: FxHashMap::default(),
            config,
            easing: ease_out_cubic,
        }
    }

    /// Replace the easing curve (defaults to ease-out cubic).
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    #[must_use]
    pub fn config(&self) -> &HeightAnimationConfig {
        &self.config
    }

    /// Height to render for `lane` at `now`, given its packing `target`.
    ///
    /// The first time a lane is seen it takes its target immediately.
    pub fn resolve(&mut self, lane: &LaneId, target: f64, animate: bool, now: Instant) -> f64 {
        let config = self.config;
        let easing = self.easing;

        let Some(state) = self.lanes.get_mut(lane) else {
            self.lanes.insert(
                lane.clone(),
                LaneHeight {
                    shown: target,
                    tween: None,
                },
            );
            return target;
        };

        if !animate || config.duration_ms == 0 {
            state.shown = target;
            state.tween = None;
            return target;
        }

        // Retarget from what is on screen right now.
        let aimed_at = state.tween.map_or(state.shown, |t| t.to);
        if (aimed_at - target).abs() > config.epsilon_px {
            if (state.shown - target).abs() < config.epsilon_px {
                state.shown = target;
                state.tween = None;
                return target;
            }
            state.tween = Some(HeightTween {
                from: state.shown,
                to: target,
                started: now,
            });
        } else if let Some(tween) = state.tween.as_mut() {
            tween.to = target;
        }

        let Some(tween) = state.tween else {
            state.shown = target;
            return target;
        };

        let elapsed = now.saturating_duration_since(tween.started);
        let progress = (elapsed.as_secs_f64() / config.duration().as_secs_f64()).min(1.0);
        let value = lerp(tween.from, tween.to, easing(progress));

        if progress >= 1.0 || (value - tween.to).abs() < config.epsilon_px {
            state.shown = tween.to;
            state.tween = None;
        } else {
            state.shown = value;
        }
        state.shown
    }

    /// Last height handed out for `lane`, if it has been resolved before.
    #[must_use]
    pub fn current(&self, lane: &LaneId) -> Option<f64> {
        self.lanes.get(lane).map(|s| s.shown)
    }

    #[must_use]
    pub fn is_animating(&self, lane: &LaneId) -> bool {
        self.lanes.get(lane).is_some_and(|s| s.tween.is_some())
    }

    /// Whether any lane still has a tween in flight.
    #[must_use]
    pub fn any_animating(&self) -> bool {
        self.lanes.values().any(|s| s.tween.is_some())
    }

    /// Drop all state for a lane (lane removed from the board).
    pub fn forget(&mut self, lane: &LaneId) {
        self.lanes.remove(lane);
    }

    /// Drop all state.
    pub fn clear(&mut self) {
        self.lanes.clear();
    }
}

impl Default for LaneHeightResolver {
    fn default() -> Self {
        Self::new(HeightAnimationConfig::default())
    }
}
