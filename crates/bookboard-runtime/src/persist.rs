#![forbid(unsafe_code)]

//! Persistence boundary for committed moves.
//!
//! The commit path hands every applied change to a [`PersistenceClient`]
//! exactly once, tagged with a [`PersistTicket`]. Clients that can answer
//! immediately return [`PersistDispatch::Resolved`]; clients backed by a
//! network round-trip return [`PersistDispatch::Pending`] and the host
//! reports the result later through `Board::settle`.
//!
//! # Wire shape
//!
//! ```json
//! {
//!   "id": "5531",
//!   "lane_id": "204",
//!   "start": "2024-03-15",
//!   "end": "2024-03-17",
//!   "previous": { "lane_id": "101", "start": "2024-03-10", "end": "2024-03-12" }
//! }
//! ```
//!
//! Dates are date-only; the time-of-day normalization is a local concern.

use std::fmt;

use bookboard_core::{IntervalId, LaneId, Placement};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Correlates a persistence request with its eventual outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersistTicket(pub u64);

impl fmt::Display for PersistTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lane and dates before the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousPlacement {
    pub lane_id: LaneId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Request body for one committed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistUpdate {
    pub id: IntervalId,
    pub lane_id: LaneId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub previous: PreviousPlacement,
}

impl PersistUpdate {
    #[must_use]
    pub fn new(id: &IntervalId, previous: &Placement, next: &Placement) -> Self {
        Self {
            id: id.clone(),
            lane_id: next.lane.clone(),
            start: next.start.date(),
            end: next.end.date(),
            previous: PreviousPlacement {
                lane_id: previous.lane.clone(),
                start: previous.start.date(),
                end: previous.end.date(),
            },
        }
    }

    /// Serialize as the JSON request body.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Final result of one persistence request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Success,
    Failure { message: String },
}

impl PersistOutcome {
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// What a client did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistDispatch {
    /// In flight; the outcome arrives later via `settle`.
    Pending,
    /// Answered inline.
    Resolved(PersistOutcome),
}

/// Sink for committed moves.
pub trait PersistenceClient {
    fn persist(&mut self, ticket: PersistTicket, update: &PersistUpdate) -> PersistDispatch;
}

impl<F> PersistenceClient for F
where
    F: FnMut(PersistTicket, &PersistUpdate) -> PersistDispatch,
{
    fn persist(&mut self, ticket: PersistTicket, update: &PersistUpdate) -> PersistDispatch {
        self(ticket, update)
    }
}

/// Client that queues every request for the host to send.
///
/// Every request is `Pending`; the host drains [`Outbox::take`], performs the
/// round-trip however it likes, and settles each ticket.
#[derive(Debug, Default)]
pub struct Outbox {
    queued: Vec<(PersistTicket, PersistUpdate)>,
}

impl Outbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued request, oldest first.
    pub fn take(&mut self) -> Vec<(PersistTicket, PersistUpdate)> {
        std::mem::take(&mut self.queued)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

impl PersistenceClient for Outbox {
    fn persist(&mut self, ticket: PersistTicket, update: &PersistUpdate) -> PersistDispatch {
        self.queued.push((ticket, update.clone()));
        PersistDispatch::Pending
    }
}

/// Optional fields a server may return in its response body.
#[derive(Debug, Deserialize)]
struct ResponseBody {
    success: Option<bool>,
    message: Option<String>,
    error: Option<String>,
}

/// Interpret an HTTP-style response to a persistence request.
///
/// A non-2xx status is a failure. A JSON body with `"success": false` is a
/// failure even on 2xx. Anything else, including an empty or non-JSON body,
/// is success.
#[must_use]
pub fn interpret_response(status: u16, body: &str) -> PersistOutcome {
    let parsed = serde_json::from_str::<ResponseBody>(body).ok();
    let detail = parsed
        .as_ref()
        .and_then(|b| b.message.clone().or_else(|| b.error.clone()));

    if !(200..300).contains(&status) {
        let message = match detail {
            Some(detail) => format!("server responded {status}: {detail}"),
            None => format!("server responded {status}"),
        };
        return PersistOutcome::Failure { message };
    }

    match parsed {
        Some(ResponseBody {
            success: Some(false),
            ..
        }) => PersistOutcome::Failure {
            message: detail.unwrap_or_else(|| "server reported failure".to_string()),
        },
        _ => PersistOutcome::Success,
    }
}
