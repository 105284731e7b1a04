#![forbid(unsafe_code)]

//! Normalized pointer events.
//!
//! Raw mouse, touch and pinch input is translated outside the engine into a
//! single stream of [`PointerEvent`]s in board pixel coordinates. The drag
//! engine only ever sees this stream.

/// Pointer position in board pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Why an in-flight interaction was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// User pressed Escape.
    Escape,
    /// The pointer left capture unexpectedly (window blur, touch cancel).
    CaptureLost,
    /// Host code cancelled the drag.
    Programmatic,
}

/// Phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel(CancelReason),
}

/// A single normalized pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: PointerPosition,
    pub phase: PointerPhase,
}

impl PointerEvent {
    #[must_use]
    pub const fn new(x: f64, y: f64, phase: PointerPhase) -> Self {
        Self {
            position: PointerPosition::new(x, y),
            phase,
        }
    }

    #[must_use]
    pub const fn down(x: f64, y: f64) -> Self {
        Self::new(x, y, PointerPhase::Down)
    }

    #[must_use]
    pub const fn moved(x: f64, y: f64) -> Self {
        Self::new(x, y, PointerPhase::Move)
    }

    #[must_use]
    pub const fn up(x: f64, y: f64) -> Self {
        Self::new(x, y, PointerPhase::Up)
    }

    #[must_use]
    pub const fn cancel(reason: CancelReason) -> Self {
        Self::new(0.0, 0.0, PointerPhase::Cancel(reason))
    }
}
