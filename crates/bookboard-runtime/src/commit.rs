#![forbid(unsafe_code)]

//! Optimistic commit with snapshot rollback.
//!
//! [`CommitReconciler::commit`] writes a dropped placement into the record
//! store immediately, invalidates the touched lanes, and asks the
//! persistence client to save it. When persistence later fails,
//! [`CommitReconciler::settle`] restores the snapshot, invalidates the same
//! lanes again, and queues a [`CommitNotice`] for the host to show.
//!
//! # Invariants
//!
//! 1. A commit whose lane and dates equal the snapshot at day granularity
//!    is skipped; nothing is written or persisted.
//! 2. Every write (apply or restore) is followed by invalidation of both
//!    the old and the new lane.
//! 3. A rollback only restores when the record still holds the placement
//!    this commit applied. If something else moved it since, the newer
//!    state is kept and the notice says so.
//! 4. Later in-flight commits of the same record that started from a failed
//!    commit's placement take over its snapshot, so a chain of failures
//!    unwinds to the last placement that was not rejected.
//!
//! # Failure Modes
//!
//! - Unknown interval or a store refusal: nothing is applied, nothing is
//!   persisted, and the outcome carries the reason.
//! - `settle` with an unknown or already-settled ticket: ignored.

use bookboard_core::{IntervalId, LaneId, Placement};
use bookboard_layout::StackingCache;
use rustc_hash::FxHashMap;

use crate::persist::{PersistDispatch, PersistOutcome, PersistTicket, PersistUpdate, PersistenceClient};
use crate::store::{RecordStore, StoreError};

/// A change that was applied locally and is awaiting persistence.
#[derive(Debug, Clone, PartialEq)]
struct InFlight {
    id: IntervalId,
    snapshot: Placement,
    applied: Placement,
}

/// User-visible failure report, drained by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitNotice {
    pub ticket: PersistTicket,
    pub id: IntervalId,
    pub message: String,
    /// Whether the pre-drag placement was put back.
    pub restored: bool,
}

/// Result of [`CommitReconciler::commit`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Same lane and days as before; nothing persisted.
    Unchanged,
    /// Applied locally, persistence in flight.
    Pending { ticket: PersistTicket },
    /// Applied and persisted inline.
    Confirmed { ticket: PersistTicket },
    /// Applied, persistence failed inline, and the snapshot was handled.
    RolledBack {
        ticket: PersistTicket,
        restored: bool,
    },
    /// Nothing applied.
    Rejected(StoreError),
}

/// Result of [`CommitReconciler::settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    Confirmed { id: IntervalId },
    RolledBack { id: IntervalId, restored: bool },
    UnknownTicket,
}

/// Applies drops to the store and reconciles persistence results.
#[derive(Debug, Default)]
pub struct CommitReconciler {
    next_ticket: u64,
    in_flight: FxHashMap<PersistTicket, InFlight>,
    notices: Vec<CommitNotice>,
}

impl CommitReconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `id` to `target` optimistically and request persistence.
    pub fn commit<S, P>(
        &mut self,
        store: &mut S,
        cache: &mut StackingCache,
        client: &mut P,
        id: &IntervalId,
        target: &Placement,
    ) -> CommitOutcome
    where
        S: RecordStore + ?Sized,
        P: PersistenceClient + ?Sized,
    {
        let _span = tracing::debug_span!(
            target: "bookboard.commit",
            "commit",
            interval = %id,
            lane = %target.lane,
        )
        .entered();

        let Some(record) = store.interval(id) else {
            tracing::warn!(target: "bookboard.commit", interval = %id, "commit for unknown interval");
            return CommitOutcome::Rejected(StoreError::UnknownInterval(id.clone()));
        };
        let snapshot = record.placement();
        let target = target.normalized();

        if snapshot.same_days(&target) {
            tracing::debug!(target: "bookboard.commit", interval = %id, "commit unchanged; skipped");
            return CommitOutcome::Unchanged;
        }

        if let Err(err) = store.apply(id, &target) {
            tracing::warn!(
                target: "bookboard.commit",
                interval = %id,
                error = %err,
                "commit refused by store"
            );
            return CommitOutcome::Rejected(err);
        }
        invalidate_pair(cache, &snapshot.lane, &target.lane);

        self.next_ticket += 1;
        let ticket = PersistTicket(self.next_ticket);
        let update = PersistUpdate::new(id, &snapshot, &target);

        tracing::info!(
            target: "bookboard.commit",
            interval = %id,
            %ticket,
            from_lane = %snapshot.lane,
            to_lane = %target.lane,
            start = %target.start.date(),
            end = %target.end.date(),
            "commit applied"
        );

        self.in_flight.insert(
            ticket,
            InFlight {
                id: id.clone(),
                snapshot,
                applied: target,
            },
        );

        match client.persist(ticket, &update) {
            PersistDispatch::Pending => CommitOutcome::Pending { ticket },
            PersistDispatch::Resolved(outcome) => match self.settle(store, cache, ticket, outcome) {
                SettleOutcome::RolledBack { restored, .. } => {
                    CommitOutcome::RolledBack { ticket, restored }
                }
                SettleOutcome::Confirmed { .. } | SettleOutcome::UnknownTicket => {
                    CommitOutcome::Confirmed { ticket }
                }
            },
        }
    }

    /// Report the persistence outcome for `ticket`.
    pub fn settle<S>(
        &mut self,
        store: &mut S,
        cache: &mut StackingCache,
        ticket: PersistTicket,
        outcome: PersistOutcome,
    ) -> SettleOutcome
    where
        S: RecordStore + ?Sized,
    {
        let Some(flight) = self.in_flight.remove(&ticket) else {
            tracing::debug!(target: "bookboard.commit", %ticket, "settle for unknown ticket ignored");
            return SettleOutcome::UnknownTicket;
        };

        let message = match outcome {
            PersistOutcome::Success => {
                tracing::debug!(target: "bookboard.commit", %ticket, interval = %flight.id, "commit persisted");
                return SettleOutcome::Confirmed { id: flight.id };
            }
            PersistOutcome::Failure { message } => message,
        };

        let current = store.interval(&flight.id).map(|iv| iv.placement());
        let restored = current.as_ref() == Some(&flight.applied)
            && store.apply(&flight.id, &flight.snapshot).is_ok();
        invalidate_pair(cache, &flight.snapshot.lane, &flight.applied.lane);

        for (later, chained) in self.in_flight.iter_mut() {
            let follows = *later > ticket && chained.id == flight.id;
            if follows && chained.snapshot == flight.applied {
                chained.snapshot = flight.snapshot.clone();
            }
        }

        if restored {
            tracing::warn!(
                target: "bookboard.commit",
                %ticket,
                interval = %flight.id,
                lane = %flight.snapshot.lane,
                error = %message,
                "persistence failed; rolled back"
            );
        } else {
            tracing::warn!(
                target: "bookboard.commit",
                %ticket,
                interval = %flight.id,
                error = %message,
                "persistence failed; record changed since commit, kept newer state"
            );
        }

        self.notices.push(CommitNotice {
            ticket,
            id: flight.id.clone(),
            message,
            restored,
        });
        SettleOutcome::RolledBack {
            id: flight.id,
            restored,
        }
    }

    /// Take queued failure notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<CommitNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Tickets still awaiting an outcome.
    #[must_use]
    pub fn pending(&self) -> Vec<PersistTicket> {
        let mut tickets: Vec<_> = self.in_flight.keys().copied().collect();
        tickets.sort_unstable();
        tickets
    }

    #[must_use]
    pub fn is_pending(&self, ticket: PersistTicket) -> bool {
        self.in_flight.contains_key(&ticket)
    }
}

fn invalidate_pair(cache: &mut StackingCache, a: &LaneId, b: &LaneId) {
    cache.invalidate(a);
    if a != b {
        cache.invalidate(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::Outbox;
    use crate::store::MemoryStore;
    use bookboard_core::{Interval, Lane, TimeWindow};
    use bookboard_layout::{PackingConfig, PackingResult};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, day).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::from_records(
            [Lane::new("A"), Lane::new("B")],
            [Interval::from_dates("x", "A", d(10), d(12))],
        )
    }

    fn warm(cache: &mut StackingCache) {
        let key = TimeWindow::new(d(1), 30).key();
        for lane in ["A", "B"] {
            cache.get_or_compute(lane, key, || PackingResult::empty(&PackingConfig::default()));
        }
    }

    fn placement(s: &MemoryStore) -> Placement {
        s.interval(&"x".into()).unwrap().placement()
    }

    #[test]
    fn pending_commit_applies_and_invalidates() {
        let mut s = store();
        let mut cache = StackingCache::new(8);
        warm(&mut cache);
        let mut outbox = Outbox::new();
        let mut reconciler = CommitReconciler::new();

        let target = Placement::from_dates("B", d(15), d(17));
        let outcome = reconciler.commit(&mut s, &mut cache, &mut outbox, &"x".into(), &target);

        assert_eq!(outcome, CommitOutcome::Pending { ticket: PersistTicket(1) });
        assert_eq!(placement(&s), target);
        assert!(cache.is_empty());
        assert_eq!(outbox.len(), 1);
        assert!(reconciler.is_pending(PersistTicket(1)));
    }

    #[test]
    fn unchanged_commit_is_skipped() {
        let mut s = store();
        let mut cache = StackingCache::new(8);
        warm(&mut cache);
        let mut outbox = Outbox::new();
        let mut reconciler = CommitReconciler::new();

        let same = Placement::new(
            "A",
            d(10).and_hms_opt(9, 0, 0).unwrap(),
            d(12).and_hms_opt(18, 0, 0).unwrap(),
        );
        let outcome = reconciler.commit(&mut s, &mut cache, &mut outbox, &"x".into(), &same);
        assert_eq!(outcome, CommitOutcome::Unchanged);
        assert!(outbox.is_empty());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failure_restores_snapshot() {
        let mut s = store();
        let mut cache = StackingCache::new(8);
        let mut outbox = Outbox::new();
        let mut reconciler = CommitReconciler::new();
        let original = placement(&s);

        let target = Placement::from_dates("B", d(15), d(17));
        let CommitOutcome::Pending { ticket } =
            reconciler.commit(&mut s, &mut cache, &mut outbox, &"x".into(), &target)
        else {
            panic!("expected pending");
        };

        warm(&mut cache);
        let settled = reconciler.settle(&mut s, &mut cache, ticket, PersistOutcome::failure("503"));
        assert_eq!(
            settled,
            SettleOutcome::RolledBack {
                id: "x".into(),
                restored: true
            }
        );
        assert_eq!(placement(&s), original);
        assert!(cache.is_empty());

        let notices = reconciler.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "503");
        assert!(reconciler.drain_notices().is_empty());
    }

    #[test]
    fn inline_success_confirms() {
        let mut s = store();
        let mut cache = StackingCache::new(8);
        let mut reconciler = CommitReconciler::new();
        let mut client =
            |_: PersistTicket, _: &PersistUpdate| PersistDispatch::Resolved(PersistOutcome::Success);

        let target = Placement::from_dates("A", d(11), d(13));
        let outcome = reconciler.commit(&mut s, &mut cache, &mut client, &"x".into(), &target);
        assert_eq!(outcome, CommitOutcome::Confirmed { ticket: PersistTicket(1) });
        assert_eq!(placement(&s), target);
        assert!(reconciler.pending().is_empty());
    }

    #[test]
    fn inline_failure_rolls_back() {
        let mut s = store();
        let mut cache = StackingCache::new(8);
        let mut reconciler = CommitReconciler::new();
        let mut client = |_: PersistTicket, _: &PersistUpdate| {
            PersistDispatch::Resolved(PersistOutcome::failure("offline"))
        };
        let original = placement(&s);

        let outcome = reconciler.commit(
            &mut s,
            &mut cache,
            &mut client,
            &"x".into(),
            &Placement::from_dates("B", d(1), d(2)),
        );
        assert_eq!(
            outcome,
            CommitOutcome::RolledBack {
                ticket: PersistTicket(1),
                restored: true
            }
        );
        assert_eq!(placement(&s), original);
    }

    #[test]
    fn rollback_keeps_newer_state() {
        let mut s = store();
        let mut cache = StackingCache::new(8);
        let mut outbox = Outbox::new();
        let mut reconciler = CommitReconciler::new();

        let first = Placement::from_dates("B", d(15), d(17));
        let second = Placement::from_dates("B", d(20), d(22));
        reconciler.commit(&mut s, &mut cache, &mut outbox, &"x".into(), &first);
        reconciler.commit(&mut s, &mut cache, &mut outbox, &"x".into(), &second);

        let settled = reconciler.settle(
            &mut s,
            &mut cache,
            PersistTicket(1),
            PersistOutcome::failure("conflict"),
        );
        assert_eq!(
            settled,
            SettleOutcome::RolledBack {
                id: "x".into(),
                restored: false
            }
        );
        assert_eq!(placement(&s), second);
        assert!(!reconciler.drain_notices()[0].restored);
    }

    #[test]
    fn chained_failures_unwind_to_first_snapshot() {
        let mut s = MemoryStore::from_records(
            [Lane::new("A"), Lane::new("B"), Lane::new("C")],
            [Interval::from_dates("x", "A", d(10), d(12))],
        );
        let mut cache = StackingCache::new(8);
        let mut outbox = Outbox::new();
        let mut reconciler = CommitReconciler::new();
        let original = placement(&s);

        let first = Placement::from_dates("B", d(15), d(17));
        let second = Placement::from_dates("C", d(20), d(22));
        reconciler.commit(&mut s, &mut cache, &mut outbox, &"x".into(), &first);
        reconciler.commit(&mut s, &mut cache, &mut outbox, &"x".into(), &second);

        reconciler.settle(
            &mut s,
            &mut cache,
            PersistTicket(1),
            PersistOutcome::failure("conflict"),
        );
        assert_eq!(placement(&s), second);

        let settled =
            reconciler.settle(
            &mut s,
            &mut cache,
            PersistTicket(2),
            PersistOutcome::failure("conflict"),
        );
        assert_eq!(
            settled,
            SettleOutcome::RolledBack {
                id: "x".into(),
                restored: true
            }
        );
        assert_eq!(placement(&s), original);
        assert!(reconciler.pending().is_empty());
    }

    #[test]
    fn chained_failures_in_reverse_order_unwind_too() {
        let mut s = MemoryStore::from_records(
            [Lane::new("A"), Lane::new("B"), Lane::new("C")],
            [Interval::from_dates("x", "A", d(10), d(12))],
        );
        let mut cache = StackingCache::new(8);
        let mut outbox = Outbox::new();
        let mut reconciler = CommitReconciler::new();
        let original = placement(&s);

        let first = Placement::from_dates("B", d(15), d(17));
        reconciler.commit(&mut s, &mut cache, &mut outbox, &"x".into(), &first);
        reconciler.commit(
            &mut s,
            &mut cache,
            &mut outbox,
            &"x".into(),
            &Placement::from_dates("C", d(20), d(22)),
        );

        reconciler.settle(
            &mut s,
            &mut cache,
            PersistTicket(2),
            PersistOutcome::failure("conflict"),
        );
        assert_eq!(placement(&s), first);
        reconciler.settle(
            &mut s,
            &mut cache,
            PersistTicket(1),
            PersistOutcome::failure("conflict"),
        );
        assert_eq!(placement(&s), original);
    }

    #[test]
    fn confirmed_first_commit_keeps_chain_target() {
        let mut s = store();
        let mut cache = StackingCache::new(8);
        let mut outbox = Outbox::new();
        let mut reconciler = CommitReconciler::new();

        let first = Placement::from_dates("B", d(15), d(17));
        reconciler.commit(&mut s, &mut cache, &mut outbox, &"x".into(), &first);
        reconciler.commit(
            &mut s,
            &mut cache,
            &mut outbox,
            &"x".into(),
            &Placement::from_dates("B", d(20), d(22)),
        );

        reconciler.settle(&mut s, &mut cache, PersistTicket(1), PersistOutcome::Success);
        reconciler.settle(
            &mut s,
            &mut cache,
            PersistTicket(2),
            PersistOutcome::failure("conflict"),
        );
        assert_eq!(placement(&s), first);
    }

    #[test]
    fn rejected_commit_changes_nothing() {
        let mut s = store();
        let mut cache = StackingCache::new(8);
        warm(&mut cache);
        let mut outbox = Outbox::new();
        let mut reconciler = CommitReconciler::new();

        let outcome = reconciler.commit(
            &mut s,
            &mut cache,
            &mut outbox,
            &"x".into(),
            &Placement::from_dates("Z", d(1), d(3)),
        );
        assert_eq!(outcome, CommitOutcome::Rejected(StoreError::UnknownLane("Z".into())));
        assert_eq!(cache.len(), 2);
        assert!(outbox.is_empty());

        let missing = reconciler.commit(
            &mut s,
            &mut cache,
            &mut outbox,
            &"nope".into(),
            &Placement::from_dates("A", d(1), d(3)),
        );
        assert!(matches!(missing, CommitOutcome::Rejected(StoreError::UnknownInterval(_))));
    }

    #[test]
    fn settle_twice_is_ignored() {
        let mut s = store();
        let mut cache = StackingCache::new(8);
        let mut outbox = Outbox::new();
        let mut reconciler = CommitReconciler::new();
        reconciler.commit(
            &mut s,
            &mut cache,
            &mut outbox,
            &"x".into(),
            &Placement::from_dates("B", d(3), d(4)),
        );
        let ticket = PersistTicket(1);
        assert_eq!(
            reconciler.settle(&mut s, &mut cache, ticket, PersistOutcome::Success),
            SettleOutcome::Confirmed { id: "x".into() }
        );
        assert_eq!(
            reconciler.settle(&mut s, &mut cache, ticket, PersistOutcome::failure("late")),
            SettleOutcome::UnknownTicket
        );
        assert_eq!(placement(&s).lane, LaneId::from("B"));
    }
}
