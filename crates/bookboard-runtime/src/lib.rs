#![forbid(unsafe_code)]

//! Runtime: drag reflow, optimistic commits, and the frame-driven board.
//!
//! # Role in bookboard
//! `bookboard-runtime` is where time and input enter. It owns the only
//! mutable state in the system: the drag session, the in-flight commits,
//! and the per-lane height tweens, all behind [`Board`].
//!
//! # Primary responsibilities
//! - **Store**: [`RecordStore`] as the injected source of committed records.
//! - **Drag**: [`DragReflowEngine`] turns pointer motion into speculative
//!   placements and preview packings.
//! - **Commit**: [`CommitReconciler`] applies drops optimistically and rolls
//!   them back when persistence fails.
//! - **Persistence**: [`PersistenceClient`] and the date-only wire payload.
//! - **Config**: [`BoardConfig`] loaded by the host and injected.
//!
//! # Data flow
//! ```text
//! pointer -> Board::handle_pointer -> DragReflowEngine
//!                                       | up
//!                                       v
//!                               CommitReconciler -> RecordStore
//!                                       |               \-> StackingCache::invalidate
//!                                       \-> PersistenceClient ... Board::settle
//! Board::frame -> cache or preview packing -> LaneHeightResolver -> BoardFrame
//! ```

pub mod board;
pub mod commit;
pub mod config;
pub mod drag;
pub mod persist;
pub mod store;

pub use board::{BarFrame, Board, BoardFrame, HitTarget, LaneFrame, PointerResponse};
pub use commit::{CommitNotice, CommitOutcome, CommitReconciler, SettleOutcome};
pub use config::{BoardConfig, ConfigError};
pub use drag::{
    DragConfig, DragEffect, DragMode, DragNoopReason, DragReflowEngine, DragSession, DragState,
    GhostBar, LaneRow, LaneRows,
};
pub use persist::{
    Outbox, PersistDispatch, PersistOutcome, PersistTicket, PersistUpdate, PersistenceClient,
    interpret_response,
};
pub use store::{MemoryStore, RecordStore, StoreError};
