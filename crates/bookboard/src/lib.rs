#![forbid(unsafe_code)]

//! Bookboard public facade.
//!
//! Re-exports the types a host needs to put a reservation board on screen:
//! records and ids, the [`Board`] orchestrator, its configuration, and the
//! persistence boundary. The layout internals stay reachable through
//! [`layout`] for hosts that pack lanes themselves.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use bookboard_core::{
    CancelReason, Interval, IntervalId, Lane, LaneId, PixelRect, Placement, PointerEvent,
    PointerPhase, PointerPosition, TimeWindow,
};

// --- Layout re-exports -----------------------------------------------------

pub use bookboard_layout::{
    CapacityStatus, HeightAnimationConfig, PackingConfig, PackingResult, PlacedInterval,
    StackingCacheStats, Timescale,
};

// --- Runtime re-exports ----------------------------------------------------

pub use bookboard_runtime::{
    BarFrame, Board, BoardConfig, BoardFrame, CommitNotice, CommitOutcome, ConfigError,
    DragConfig, DragEffect, DragMode, GhostBar, HitTarget, LaneFrame, MemoryStore, Outbox,
    PersistDispatch, PersistOutcome, PersistTicket, PersistUpdate, PersistenceClient,
    PointerResponse, RecordStore, SettleOutcome, StoreError, interpret_response,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for bookboard hosts.
#[derive(Debug)]
pub enum Error {
    /// Configuration failed to load or validate.
    Config(ConfigError),
    /// The record store refused a change.
    Store(StoreError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Standard result type for bookboard APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// A board over the in-memory store whose persistence requests queue in an
/// [`Outbox`] for the host to send.
pub type MemoryBoard = Board<MemoryStore, Outbox>;

/// Build a [`MemoryBoard`] from loaded records.
///
/// # Errors
///
/// Returns [`Error::Config`] when `config` fails validation.
pub fn memory_board(
    lanes: impl IntoIterator<Item = Lane>,
    intervals: impl IntoIterator<Item = Interval>,
    config: BoardConfig,
    window: TimeWindow,
) -> Result<MemoryBoard> {
    let store = MemoryStore::from_records(lanes, intervals);
    Ok(Board::new(store, Outbox::new(), config, window)?)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Board, BoardConfig, BoardFrame, CancelReason, DragEffect, Error, Interval, IntervalId,
        Lane, LaneId, MemoryBoard, PersistOutcome, PersistTicket, Placement, PointerEvent,
        RecordStore, Result, TimeWindow, memory_board,
    };

    pub use crate::{core, layout, runtime};
}

pub use bookboard_core as core;
pub use bookboard_layout as layout;
pub use bookboard_runtime as runtime;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn memory_board_renders_loaded_records() {
        let mut board = memory_board(
            [Lane::new(101_u32), Lane::new(102_u32)],
            [Interval::from_dates(7_u64, 101_u32, d(3), d(5))],
            BoardConfig::default(),
            TimeWindow::new(d(1), 14),
        )
        .unwrap();
        let frame = board.frame(web_time::Instant::now());
        assert_eq!(frame.lanes.len(), 2);
        assert!(frame.lanes[0].packing.contains(&IntervalId::from("7")));
    }

    #[test]
    fn bad_config_surfaces_as_config_error() {
        let config = BoardConfig {
            cache_capacity: 0,
            ..BoardConfig::default()
        };
        let err = memory_board(
            Vec::<Lane>::new(),
            Vec::<Interval>::new(),
            config,
            TimeWindow::new(d(1), 7),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
