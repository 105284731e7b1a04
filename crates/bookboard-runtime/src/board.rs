#![forbid(unsafe_code)]

//! Frame-driven board: the owner that wires store, cache, heights, drag and
//! commits together.
//!
//! The host feeds normalized pointer events to [`Board::handle_pointer`]
//! and calls [`Board::frame`] once per render. Pointer coordinates share the
//! frame's space: `x` is pixels from the window origin day, `y` is pixels
//! from the top of the first lane.
//!
//! # Frame
//!
//! For each lane, top to bottom:
//!
//! 1. If the active drag affects the lane, pack a fresh preview
//!    (dragged interval removed, speculative one injected). Otherwise take
//!    the committed packing from the [`StackingCache`].
//! 2. Resolve the displayed height against the packing's target.
//! 3. Stack the lane below the previous one and lay out its bars.
//!
//! Rows and bar bounds from the last frame drive hit-testing and lane
//! resolution for the next pointer events.
//!
//! # Invariants
//!
//! 1. Every path that writes a record invalidates each lane it touched.
//! 2. Preview packings are never stored in the cache.
//! 3. Zoom clears the cache and the next frame snaps heights.

use std::sync::Arc;

use bookboard_core::{
    CancelReason, Interval, IntervalId, LaneId, PixelRect, PointerEvent, PointerPhase,
    TimeWindow,
};
use bookboard_layout::{
    CapacityStatus, LaneHeightResolver, SharedPacking, StackingCache, StackingCacheStats,
    capacity_report, pack_lane,
};
use web_time::Instant;

use crate::commit::{CommitNotice, CommitOutcome, CommitReconciler, SettleOutcome};
use crate::config::{BoardConfig, ConfigError};
use crate::drag::{
    DragEffect, DragMode, DragNoopReason, DragReflowEngine, GhostBar, LaneRow, LaneRows,
};
use crate::persist::{PersistOutcome, PersistTicket, PersistenceClient};
use crate::store::RecordStore;

/// One bar as laid out in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BarFrame {
    pub id: IntervalId,
    pub rect: PixelRect,
    pub stack_level: u32,
    /// The snapped drop slot of a dragged interval.
    pub is_speculative: bool,
}

/// One lane as laid out in a frame.
#[derive(Debug, Clone)]
pub struct LaneFrame {
    pub lane: LaneId,
    pub top: f64,
    /// Displayed (possibly mid-animation) height.
    pub height: f64,
    /// Height the packing asks for.
    pub target_height: f64,
    pub packing: SharedPacking,
    /// Whether `packing` is a drag preview.
    pub preview: bool,
    pub bars: Vec<BarFrame>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct BoardFrame {
    pub lanes: Vec<LaneFrame>,
    pub ghost: Option<GhostBar>,
    /// Heights still easing; request another frame.
    pub animating: bool,
    pub total_height: f64,
}

impl BoardFrame {
    #[must_use]
    pub fn lane(&self, lane: &LaneId) -> Option<&LaneFrame> {
        self.lanes.iter().find(|l| &l.lane == lane)
    }
}

/// A bar under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct HitTarget {
    pub id: IntervalId,
    pub lane: LaneId,
    pub rect: PixelRect,
    /// Mode a drag started here would use.
    pub mode: DragMode,
}

/// What a pointer event did.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerResponse {
    pub effect: DragEffect,
    /// Present when the event ended a drag with a drop.
    pub commit: Option<CommitOutcome>,
}

impl PointerResponse {
    fn effect(effect: DragEffect) -> Self {
        Self {
            effect,
            commit: None,
        }
    }
}

#[derive(Debug, Clone)]
struct LaidOutBar {
    id: IntervalId,
    lane: LaneId,
    rect: PixelRect,
}

/// The interactive board.
#[derive(Debug)]
pub struct Board<S, P> {
    store: S,
    client: P,
    config: BoardConfig,
    window: TimeWindow,
    cache: StackingCache,
    heights: LaneHeightResolver,
    engine: DragReflowEngine,
    reconciler: CommitReconciler,
    rows: LaneRows,
    bars: Vec<LaidOutBar>,
    snap_next_frame: bool,
}

impl<S, P> Board<S, P>
where
    S: RecordStore,
    P: PersistenceClient,
{
    /// Build a board over `store`, persisting through `client`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when `config` is out of range.
    pub fn new(
        store: S,
        client: P,
        config: BoardConfig,
        window: TimeWindow,
    ) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        Ok(Self {
            store,
            client,
            cache: StackingCache::new(config.cache_capacity),
            heights: LaneHeightResolver::new(config.animation),
            engine: DragReflowEngine::new(config.drag),
            reconciler: CommitReconciler::new(),
            rows: LaneRows::default(),
            bars: Vec::new(),
            snap_next_frame: false,
            config,
            window,
        })
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn client(&self) -> &P {
        &self.client
    }

    /// Mutable access to the persistence client (for hosts draining a
    /// queue-backed client).
    pub fn client_mut(&mut self) -> &mut P {
        &mut self.client
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[must_use]
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    #[must_use]
    pub fn engine(&self) -> &DragReflowEngine {
        &self.engine
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.engine.is_active()
    }

    #[must_use]
    pub fn cache_stats(&self) -> StackingCacheStats {
        self.cache.stats()
    }

    /// Whether a committed packing is cached for `lane` in the current window.
    #[must_use]
    pub fn is_cached(&self, lane: impl Into<LaneId>) -> bool {
        self.cache.contains(lane, self.window.key())
    }

    /// Tickets whose persistence outcome is still outstanding.
    #[must_use]
    pub fn pending_commits(&self) -> Vec<PersistTicket> {
        self.reconciler.pending()
    }

    /// Scroll. The window is part of the cache key, so nothing is invalidated.
    pub fn set_window(&mut self, window: TimeWindow) {
        self.window = window;
    }

    /// Zoom. Clears every cached packing and snaps heights on the next
    /// frame. An active drag is cancelled, since its pixel offsets no longer
    /// map to the same days. Non-positive or non-finite scales are ignored.
    pub fn set_pixels_per_day(&mut self, pixels_per_day: f64) -> Option<DragEffect> {
        if !pixels_per_day.is_finite() || pixels_per_day <= 0.0 {
            tracing::warn!(target: "bookboard.layout", pixels_per_day, "ignoring unusable zoom");
            return None;
        }
        let cancelled = self
            .engine
            .is_active()
            .then(|| self.cancel_drag(CancelReason::Programmatic));
        self.config.timescale.pixels_per_day = pixels_per_day;
        self.cache.invalidate_all();
        self.snap_next_frame = true;
        cancelled
    }

    /// Drop cached packing for `lane`. Call after any external change to
    /// that lane's records.
    pub fn invalidate_lane(&mut self, lane: impl Into<LaneId>) -> usize {
        self.cache.invalidate(lane)
    }

    /// Insert or replace a record, invalidating its old and new lanes.
    ///
    /// An active drag on the same record is cancelled first.
    pub fn upsert_interval(&mut self, interval: Interval) -> Option<Interval> {
        self.cancel_drag_on(&interval.id);
        let lane = interval.lane.clone();
        let previous = self.store.upsert_interval(interval);
        self.cache.invalidate(&lane);
        if let Some(prev) = previous.as_ref().filter(|p| p.lane != lane) {
            self.cache.invalidate(&prev.lane);
        }
        previous
    }

    /// Delete a record, invalidating its lane.
    pub fn remove_interval(&mut self, id: &IntervalId) -> Option<Interval> {
        self.cancel_drag_on(id);
        let removed = self.store.remove_interval(id)?;
        self.cache.invalidate(&removed.lane);
        Some(removed)
    }

    /// Peak occupancy of `lane` in the current window against its capacity.
    #[must_use]
    pub fn capacity_report(&self, lane: &LaneId) -> Option<CapacityStatus> {
        let record = self.store.list_lanes().into_iter().find(|l| &l.id == lane)?;
        let intervals = self.store.intervals_in_lane(lane, &self.window);
        Some(capacity_report(&record, &intervals))
    }

    /// Report the persistence outcome for a pending commit.
    pub fn settle(&mut self, ticket: PersistTicket, outcome: PersistOutcome) -> SettleOutcome {
        self.reconciler
            .settle(&mut self.store, &mut self.cache, ticket, outcome)
    }

    /// Take queued persistence-failure notices.
    pub fn drain_notices(&mut self) -> Vec<CommitNotice> {
        self.reconciler.drain_notices()
    }

    /// The topmost bar under `(x, y)`, using last frame's layout. Bars are
    /// widened by the resize-edge margin so edges are easy to grab.
    #[must_use]
    pub fn hit_test(&self, x: f64, y: f64) -> Option<HitTarget> {
        let edge = self.config.drag.edge_threshold_px;
        self.bars
            .iter()
            .rev()
            .find(|bar| bar.rect.inflate(edge, 0.0).contains(x, y))
            .map(|bar| HitTarget {
                id: bar.id.clone(),
                lane: bar.lane.clone(),
                rect: bar.rect,
                mode: DragMode::from_pointer(x, &bar.rect, edge),
            })
    }

    /// Route one normalized pointer event.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> PointerResponse {
        let position = event.position;
        let scale = self.config.timescale;
        match event.phase {
            PointerPhase::Down => {
                if self.engine.is_active() {
                    return PointerResponse::effect(DragEffect::noop(
                        DragNoopReason::ActiveDragAlreadyInProgress,
                    ));
                }
                let hit = self
                    .hit_test(position.x, position.y)
                    .and_then(|hit| self.store.interval(&hit.id).map(|iv| (hit, iv)));
                let Some((hit, interval)) = hit else {
                    return PointerResponse::effect(DragEffect::noop(
                        DragNoopReason::NoIntervalUnderPointer,
                    ));
                };
                PointerResponse::effect(self.engine.begin(&interval, hit.rect, position, &scale))
            }
            PointerPhase::Move => {
                PointerResponse::effect(self.engine.pointer_move(position, &self.rows, &scale))
            }
            PointerPhase::Up => {
                let effect = self.engine.pointer_up(position, &self.rows, &scale);
                let commit = match &effect {
                    DragEffect::Committed {
                        id, speculative, ..
                    } => Some(self.reconciler.commit(
                        &mut self.store,
                        &mut self.cache,
                        &mut self.client,
                        id,
                        speculative,
                    )),
                    _ => None,
                };
                PointerResponse { effect, commit }
            }
            PointerPhase::Cancel(reason) => PointerResponse::effect(self.cancel_drag(reason)),
        }
    }

    /// Lay out every lane for this frame.
    pub fn frame(&mut self, now: Instant) -> BoardFrame {
        let animate = !std::mem::take(&mut self.snap_next_frame);
        let window = self.window;
        let key = window.key();
        let scale = self.config.timescale;
        let packing_config = self.config.packing;

        let mut lanes = Vec::new();
        let mut rows = Vec::new();
        let mut bars = Vec::new();
        let mut top = 0.0;

        for lane in self.store.list_lanes() {
            let affected = self
                .engine
                .session()
                .is_some_and(|session| session.affects(&lane.id));

            let (packing, preview) = if affected {
                let committed = self.store.intervals_in_lane(&lane.id, &window);
                let fresh = self
                    .engine
                    .preview(&lane.id, &committed, &window, &scale, &packing_config)
                    .map(Arc::new);
                match fresh {
                    Some(packing) => (packing, true),
                    None => (self.committed_packing(&lane.id), false),
                }
            } else {
                (self.committed_packing(&lane.id), false)
            };

            let target_height = packing.target_height;
            let height = self.heights.resolve(&lane.id, target_height, animate, now);

            let lane_bars: Vec<BarFrame> = packing
                .ordered_intervals
                .iter()
                .map(|placed| BarFrame {
                    id: placed.id.clone(),
                    rect: PixelRect::new(
                        placed.span.left(),
                        top + packing_config.bar_offset(placed.stack_level),
                        placed.span.length,
                        packing_config.bar_unit,
                    ),
                    stack_level: placed.stack_level,
                    is_speculative: placed.is_speculative,
                })
                .collect();

            bars.extend(lane_bars.iter().filter(|b| !b.is_speculative).map(|b| LaidOutBar {
                id: b.id.clone(),
                lane: lane.id.clone(),
                rect: b.rect,
            }));
            rows.push(LaneRow {
                lane: lane.id.clone(),
                top,
                height,
            });
            lanes.push(LaneFrame {
                lane: lane.id,
                top,
                height,
                target_height,
                packing,
                preview,
                bars: lane_bars,
            });
            top += height;
        }

        self.rows = LaneRows::new(rows);
        self.bars = bars;

        BoardFrame {
            lanes,
            ghost: self.engine.ghost(),
            animating: self.heights.any_animating(),
            total_height: top,
        }
    }

    fn committed_packing(&mut self, lane: &LaneId) -> SharedPacking {
        let window = self.window;
        let scale = self.config.timescale;
        let packing_config = self.config.packing;
        let store = &self.store;
        self.cache.get_or_compute(lane, window.key(), || {
            pack_lane(
                &store.intervals_in_lane(lane, &window),
                None,
                &window,
                &scale,
                &packing_config,
            )
        })
    }

    fn cancel_drag(&mut self, reason: CancelReason) -> DragEffect {
        let effect = self.engine.cancel(reason);
        if let DragEffect::Cancelled { affected, .. } = &effect {
            for lane in affected {
                self.cache.invalidate(lane);
            }
        }
        effect
    }

    fn cancel_drag_on(&mut self, id: &IntervalId) {
        let dragging_it = self
            .engine
            .session()
            .is_some_and(|session| &session.dragged == id);
        if dragging_it {
            self.cancel_drag(CancelReason::Programmatic);
        }
    }
}
