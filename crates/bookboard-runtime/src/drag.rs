#![forbid(unsafe_code)]

//! Drag reflow: speculative placement while a bar is dragged.
//!
//! [`DragReflowEngine`] owns at most one [`DragSession`]. It turns pointer
//! motion into a speculative [`Placement`] for the dragged interval and
//! builds preview packings for the lanes the drag affects. It never writes
//! to the record store; on release it hands the final placement back as a
//! [`DragEffect::Committed`] for the commit path.
//!
//! ```text
//! Idle --down--> Active --move--> Active
//!                  |  \--up-----> Committed --> Idle
//!                  \----cancel--> Cancelled --> Idle
//! ```
//!
//! # Invariants
//!
//! 1. At most one session. A pointer-down while active is a
//!    [`DragNoopReason::ActiveDragAlreadyInProgress`] no-op.
//! 2. The day delta is derived from the total pointer offset since
//!    pointer-down, never accumulated per event, so repeated moves to the
//!    same position are idempotent and cannot drift.
//! 3. The speculative placement always spans at least one whole day. A
//!    resize that would go shorter is clamped to exactly one day, so a
//!    pointer that overshoots in a single event still lands on the floor.
//! 4. The logical placement snaps to whole days; the ghost rectangle
//!    follows the pointer continuously.
//!
//! # Failure Modes
//!
//! - Move/up/cancel without a session: `Noop { IdleWithoutActiveDrag }`.
//! - Date overflow while shifting: the step is ignored and the previous
//!   speculative placement stays.

use bookboard_core::time::shift_days;
use bookboard_core::{
    CancelReason, Interval, IntervalId, LaneId, PixelRect, Placement, PointerPosition, TimeWindow,
};
use bookboard_layout::{PackingConfig, PackingResult, Timescale, pack_lane};
use serde::{Deserialize, Serialize};

/// Default width of the resize grip at each bar edge.
pub const DEFAULT_EDGE_THRESHOLD_PX: f64 = 6.0;
/// Default distance the pointer must travel past a lane before switching.
pub const DEFAULT_LANE_HYSTERESIS_PX: f64 = 8.0;

/// Drag tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Pointer-down within this many pixels of a bar edge starts a resize.
    /// Hit regions are inflated horizontally by the same amount.
    pub edge_threshold_px: f64,
    /// The pointer must leave the current lane's rows by this much before
    /// the speculative lane changes.
    pub lane_hysteresis_px: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            edge_threshold_px: DEFAULT_EDGE_THRESHOLD_PX,
            lane_hysteresis_px: DEFAULT_LANE_HYSTERESIS_PX,
        }
    }
}

/// What the drag changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragMode {
    /// Shift start and end together; may change lane.
    Move,
    /// Move only the start; lane fixed.
    ResizeStart,
    /// Move only the end; lane fixed.
    ResizeEnd,
}

impl DragMode {
    /// Pick a mode from where the pointer landed on a bar.
    ///
    /// Within `edge` pixels of either edge (inside or outside the bar) is a
    /// resize; the nearer edge wins when a narrow bar puts both in reach.
    #[must_use]
    pub fn from_pointer(x: f64, bar: &PixelRect, edge: f64) -> Self {
        let to_start = (x - bar.left()).abs();
        let to_end = (bar.right() - x).abs();
        if to_start <= edge && to_start <= to_end {
            Self::ResizeStart
        } else if to_end <= edge {
            Self::ResizeEnd
        } else {
            Self::Move
        }
    }
}

/// Vertical extent of one lane in the last laid-out frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneRow {
    pub lane: LaneId,
    pub top: f64,
    pub height: f64,
}

impl LaneRow {
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Lane rows top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneRows {
    rows: Vec<LaneRow>,
}

impl LaneRows {
    #[must_use]
    pub fn new(rows: Vec<LaneRow>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[LaneRow] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, lane: &LaneId) -> Option<&LaneRow> {
        self.rows.iter().find(|r| &r.lane == lane)
    }

    /// Lane under `y`, clamped to the first and last rows.
    #[must_use]
    pub fn lane_at(&self, y: f64) -> Option<&LaneId> {
        let first = self.rows.first()?;
        if y < first.top {
            return Some(&first.lane);
        }
        self.rows
            .iter()
            .find(|r| y < r.bottom())
            .or(self.rows.last())
            .map(|r| &r.lane)
    }
}

/// State of one active drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub dragged: IntervalId,
    pub mode: DragMode,
    /// Placement at pointer-down; the rollback target.
    pub original: Placement,
    /// Current snapped placement.
    pub speculative: Placement,
    pub origin_pointer: PointerPosition,
    pub current_pointer: PointerPosition,
    /// Bar bounds at pointer-down.
    pub origin_rect: PixelRect,
    /// Narrowest the ghost may draw (one day).
    pub min_ghost_width: f64,
}

impl DragSession {
    /// Lanes whose packing must be previewed: the origin lane, plus the
    /// speculative lane when it differs.
    #[must_use]
    pub fn affected_lanes(&self) -> Vec<LaneId> {
        let mut lanes = vec![self.original.lane.clone()];
        if self.speculative.lane != self.original.lane {
            lanes.push(self.speculative.lane.clone());
        }
        lanes
    }

    #[must_use]
    pub fn affects(&self, lane: &LaneId) -> bool {
        &self.original.lane == lane || &self.speculative.lane == lane
    }

    /// The dragged record at its speculative placement.
    #[must_use]
    pub fn speculative_interval(&self) -> Interval {
        Interval {
            id: self.dragged.clone(),
            lane: self.speculative.lane.clone(),
            start: self.speculative.start,
            end: self.speculative.end,
        }
    }

    /// Ghost bounds following the raw pointer offset.
    #[must_use]
    pub fn ghost_rect(&self) -> PixelRect {
        let dx = self.current_pointer.x - self.origin_pointer.x;
        let dy = self.current_pointer.y - self.origin_pointer.y;
        let r = self.origin_rect;
        match self.mode {
            DragMode::Move => PixelRect::new(r.x + dx, r.y + dy, r.width, r.height),
            DragMode::ResizeStart => {
                let width = (r.width - dx).max(self.min_ghost_width);
                PixelRect::new(r.right() - width, r.y, width, r.height)
            }
            DragMode::ResizeEnd => {
                let width = (r.width + dx).max(self.min_ghost_width);
                PixelRect::new(r.x, r.y, width, r.height)
            }
        }
    }
}

/// The floating preview bar.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostBar {
    pub id: IntervalId,
    /// Pointer-tracking bounds (not snapped).
    pub rect: PixelRect,
    /// Snapped placement the drop would commit.
    pub placement: Placement,
    pub mode: DragMode,
}

/// Engine state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Active(DragSession),
}

/// Why an input was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    IdleWithoutActiveDrag,
    ActiveDragAlreadyInProgress,
    NoIntervalUnderPointer,
    /// Same day delta and lane as before.
    Unchanged,
    /// The resize is pinned at the one-day floor (or the step overflowed);
    /// the speculative placement is already as short as it can get.
    DurationFloor,
}

/// Result of one engine step.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEffect {
    Started {
        id: IntervalId,
        mode: DragMode,
        original: Placement,
    },
    Updated {
        id: IntervalId,
        speculative: Placement,
        lane_changed: bool,
    },
    /// Drop: hand to the commit path.
    Committed {
        id: IntervalId,
        original: Placement,
        speculative: Placement,
    },
    /// Speculative state discarded. `affected` lanes must be invalidated.
    Cancelled {
        id: IntervalId,
        reason: CancelReason,
        affected: Vec<LaneId>,
    },
    Noop {
        reason: DragNoopReason,
    },
}

impl DragEffect {
    #[must_use]
    pub const fn noop(reason: DragNoopReason) -> Self {
        Self::Noop { reason }
    }
}

/// Single-pointer drag controller.
#[derive(Debug, Clone, Default)]
pub struct DragReflowEngine {
    state: DragState,
    config: DragConfig,
}

impl DragReflowEngine {
    #[must_use]
    pub fn new(config: DragConfig) -> Self {
        Self {
            state: DragState::Idle,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Active(session) => Some(session),
            DragState::Idle => None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session().is_some()
    }

    /// Lanes currently shown with preview packing (empty when idle).
    #[must_use]
    pub fn affected_lanes(&self) -> Vec<LaneId> {
        self.session()
            .map(DragSession::affected_lanes)
            .unwrap_or_default()
    }

    /// Start a drag on `interval`, whose bar was drawn at `bar`.
    pub fn begin(
        &mut self,
        interval: &Interval,
        bar: PixelRect,
        pointer: PointerPosition,
        scale: &Timescale,
    ) -> DragEffect {
        if self.is_active() {
            return DragEffect::noop(DragNoopReason::ActiveDragAlreadyInProgress);
        }

        let mode = DragMode::from_pointer(pointer.x, &bar, self.config.edge_threshold_px);
        let original = interval.placement().normalized();
        let min_ghost_width = (scale.pixels_per_day - 2.0 * scale.gutter_px).max(0.0);

        tracing::debug!(
            target: "bookboard.drag",
            interval = %interval.id,
            lane = %original.lane,
            ?mode,
            "drag started"
        );

        self.state = DragState::Active(DragSession {
            dragged: interval.id.clone(),
            mode,
            original: original.clone(),
            speculative: original.clone(),
            origin_pointer: pointer,
            current_pointer: pointer,
            origin_rect: bar,
            min_ghost_width,
        });

        DragEffect::Started {
            id: interval.id.clone(),
            mode,
            original,
        }
    }

    /// Track the pointer: recompute the snapped placement and lane.
    pub fn pointer_move(
        &mut self,
        pointer: PointerPosition,
        rows: &LaneRows,
        scale: &Timescale,
    ) -> DragEffect {
        let hysteresis = self.config.lane_hysteresis_px;
        let DragState::Active(session) = &mut self.state else {
            return DragEffect::noop(DragNoopReason::IdleWithoutActiveDrag);
        };
        session.current_pointer = pointer;

        let days = scale.days_for_pixels(pointer.x - session.origin_pointer.x);
        let Some((dated, clamped)) = shifted(&session.original, session.mode, days) else {
            return DragEffect::noop(DragNoopReason::DurationFloor);
        };

        let lane = match session.mode {
            DragMode::Move => resolve_lane(&session.speculative.lane, pointer.y, rows, hysteresis),
            DragMode::ResizeStart | DragMode::ResizeEnd => session.original.lane.clone(),
        };
        let next = Placement {
            lane,
            start: dated.start,
            end: dated.end,
        };

        if next == session.speculative {
            let reason = if clamped {
                DragNoopReason::DurationFloor
            } else {
                DragNoopReason::Unchanged
            };
            return DragEffect::noop(reason);
        }

        let lane_changed = next.lane != session.speculative.lane;
        if lane_changed {
            tracing::debug!(
                target: "bookboard.drag",
                interval = %session.dragged,
                from = %session.speculative.lane,
                to = %next.lane,
                "drag switched lane"
            );
        }
        session.speculative = next.clone();

        DragEffect::Updated {
            id: session.dragged.clone(),
            speculative: next,
            lane_changed,
        }
    }

    /// Drop: apply the final pointer position, then end the session.
    pub fn pointer_up(
        &mut self,
        pointer: PointerPosition,
        rows: &LaneRows,
        scale: &Timescale,
    ) -> DragEffect {
        if !self.is_active() {
            return DragEffect::noop(DragNoopReason::IdleWithoutActiveDrag);
        }
        self.pointer_move(pointer, rows, scale);

        let DragState::Active(session) = std::mem::take(&mut self.state) else {
            return DragEffect::noop(DragNoopReason::IdleWithoutActiveDrag);
        };
        tracing::debug!(
            target: "bookboard.drag",
            interval = %session.dragged,
            lane = %session.speculative.lane,
            "drag released"
        );
        DragEffect::Committed {
            id: session.dragged,
            original: session.original,
            speculative: session.speculative,
        }
    }

    /// Abandon the drag. Safe at any point while active.
    pub fn cancel(&mut self, reason: CancelReason) -> DragEffect {
        let DragState::Active(session) = std::mem::take(&mut self.state) else {
            return DragEffect::noop(DragNoopReason::IdleWithoutActiveDrag);
        };
        tracing::debug!(
            target: "bookboard.drag",
            interval = %session.dragged,
            ?reason,
            "drag cancelled"
        );
        DragEffect::Cancelled {
            affected: session.affected_lanes(),
            id: session.dragged,
            reason,
        }
    }

    /// The pointer-tracking ghost, while active.
    #[must_use]
    pub fn ghost(&self) -> Option<GhostBar> {
        self.session().map(|s| GhostBar {
            id: s.dragged.clone(),
            rect: s.ghost_rect(),
            placement: s.speculative.clone(),
            mode: s.mode,
        })
    }

    /// Preview packing for `lane`, or `None` when the drag doesn't affect it.
    ///
    /// `committed` is the lane's committed record set. The dragged interval
    /// is removed from it, and injected at its speculative placement when
    /// `lane` is the speculative lane. The result is always freshly computed.
    #[must_use]
    pub fn preview<'a>(
        &self,
        lane: &LaneId,
        committed: impl IntoIterator<Item = &'a Interval>,
        window: &TimeWindow,
        scale: &Timescale,
        config: &PackingConfig,
    ) -> Option<PackingResult> {
        let session = self.session()?;
        if !session.affects(lane) {
            return None;
        }
        let ghost = (&session.speculative.lane == lane).then(|| session.speculative_interval());
        let rest = committed
            .into_iter()
            .filter(|iv| iv.id != session.dragged);
        Some(pack_lane(rest, ghost.as_ref(), window, scale, config))
    }
}

/// Start/end after applying `days` to `original` per `mode`, with resizes
/// clamped to one day. The flag reports whether the clamp kicked in. `None`
/// on date overflow or an original that is already invalid.
fn shifted(original: &Placement, mode: DragMode, days: i64) -> Option<(Placement, bool)> {
    let (start, end, clamped) = match mode {
        DragMode::Move => (
            shift_days(original.start, days)?,
            shift_days(original.end, days)?,
            false,
        ),
        DragMode::ResizeStart => {
            let start = shift_days(original.start, days)?;
            let latest = shift_days(original.end, -1)?;
            (start.min(latest), original.end, start > latest)
        }
        DragMode::ResizeEnd => {
            let end = shift_days(original.end, days)?;
            let earliest = shift_days(original.start, 1)?;
            (original.start, end.max(earliest), end < earliest)
        }
    };
    let candidate = Placement {
        lane: original.lane.clone(),
        start,
        end,
    };
    candidate.is_valid().then_some((candidate, clamped))
}

/// Lane for pointer height `y`, staying on `current` until the pointer is
/// more than `hysteresis` pixels outside its row.
fn resolve_lane(current: &LaneId, y: f64, rows: &LaneRows, hysteresis: f64) -> LaneId {
    if let Some(row) = rows.row(current) {
        if y >= row.top - hysteresis && y < row.bottom() + hysteresis {
            return current.clone();
        }
    }
    rows.lane_at(y).cloned().unwrap_or_else(|| current.clone())
}
