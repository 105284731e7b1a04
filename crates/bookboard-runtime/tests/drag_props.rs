//! Property tests for drag sessions: the one-day floor and lane stability.

use bookboard_core::{Interval, Lane, PixelRect, PointerPosition, TimeWindow};
use bookboard_layout::{StackingCache, Timescale};
use bookboard_runtime::{
    CommitOutcome, CommitReconciler, DragConfig, DragEffect, DragMode, DragReflowEngine, LaneRow,
    LaneRows, MemoryStore, PersistDispatch, PersistOutcome, PersistTicket, PersistUpdate,
    RecordStore,
};
use chrono::NaiveDate;
use proptest::prelude::*;

const PPD: f64 = 40.0;
const GUTTER: f64 = 2.0;

fn origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn rows() -> LaneRows {
    LaneRows::new(vec![
        LaneRow {
            lane: "A".into(),
            top: 0.0,
            height: 28.0,
        },
        LaneRow {
            lane: "B".into(),
            top: 28.0,
            height: 50.0,
        },
    ])
}

fn bar_for(start_day: i64, days: i64) -> PixelRect {
    PixelRect::new(
        start_day as f64 * PPD + GUTTER,
        3.0,
        days as f64 * PPD - 2.0 * GUTTER,
        18.0,
    )
}

fn grab_point(bar: &PixelRect, mode: DragMode) -> PointerPosition {
    let x = match mode {
        DragMode::ResizeStart => bar.left() + 1.0,
        DragMode::ResizeEnd => bar.right() - 1.0,
        DragMode::Move => bar.left() + bar.width / 2.0,
    };
    PointerPosition::new(x, 10.0)
}

fn mode_strategy() -> impl Strategy<Value = DragMode> {
    prop_oneof![
        Just(DragMode::Move),
        Just(DragMode::ResizeStart),
        Just(DragMode::ResizeEnd),
    ]
}

proptest! {
    #[test]
    fn speculative_and_committed_keep_one_night(
        start_day in 0_i64..20,
        days in 1_i64..8,
        mode in mode_strategy(),
        moves in prop::collection::vec((-600.0_f64..600.0, -10.0_f64..90.0), 1..24),
    ) {
        let scale = Timescale::new(PPD, GUTTER);
        let start = origin() + chrono::Days::new(start_day as u64);
        let end = start + chrono::Days::new(days as u64);
        let interval = Interval::from_dates("x", "A", start, end);
        let bar = bar_for(start_day, days);
        let grab = grab_point(&bar, mode);

        let mut engine = DragReflowEngine::new(DragConfig::default());
        let started = engine.begin(&interval, bar, grab, &scale);
        let is_started = matches!(started, DragEffect::Started { mode: m, .. } if m == mode);
        prop_assert!(is_started);

        let rows = rows();
        for (dx, y) in &moves {
            let effect = engine.pointer_move(PointerPosition::new(grab.x + dx, *y), &rows, &scale);
            let session = engine.session().unwrap();
            prop_assert!(session.speculative.days() >= 1);
            if let DragEffect::Updated { speculative, .. } = effect {
                prop_assert!(speculative.is_valid());
            }
            if mode != DragMode::Move {
                prop_assert_eq!(&session.speculative.lane, &interval.lane);
            }
            let ghost = engine.ghost().unwrap();
            prop_assert!(ghost.rect.width >= PPD - 2.0 * GUTTER - 1e-9);
        }

        let (last_dx, last_y) = moves[moves.len() - 1];
        let DragEffect::Committed { id, speculative, .. } =
            engine.pointer_up(PointerPosition::new(grab.x + last_dx, last_y), &rows, &scale)
        else {
            panic!("drop did not commit");
        };
        prop_assert!(speculative.is_valid());
        prop_assert!(!engine.is_active());

        let mut store = MemoryStore::from_records([Lane::new("A"), Lane::new("B")], [interval.clone()]);
        let mut cache = StackingCache::default();
        let mut client = |_: PersistTicket, _: &PersistUpdate| PersistDispatch::Resolved(PersistOutcome::Success);
        let outcome = CommitReconciler::new().commit(&mut store, &mut cache, &mut client, &id, &speculative);
        let is_settled = matches!(outcome, CommitOutcome::Unchanged | CommitOutcome::Confirmed { .. });
        prop_assert!(is_settled);

        let stored = store.interval(&id).unwrap();
        prop_assert!(stored.days() >= 1);
        let window = TimeWindow::new(origin() - chrono::Days::new(30), 120);
        prop_assert_eq!(store.intervals_in_lane(&stored.lane, &window).len(), 1);
    }

    #[test]
    fn repeating_a_move_is_a_noop(
        dx in -400.0_f64..400.0,
        y in 0.0_f64..78.0,
    ) {
        let scale = Timescale::new(PPD, GUTTER);
        let interval = Interval::from_dates("x", "A", origin() + chrono::Days::new(10), origin() + chrono::Days::new(13));
        let bar = bar_for(10, 3);
        let grab = grab_point(&bar, DragMode::Move);
        let mut engine = DragReflowEngine::new(DragConfig::default());
        engine.begin(&interval, bar, grab, &scale);

        let rows = rows();
        let pointer = PointerPosition::new(grab.x + dx, y);
        engine.pointer_move(pointer, &rows, &scale);
        let first = engine.session().unwrap().clone();
        let again = engine.pointer_move(pointer, &rows, &scale);
        let is_noop = matches!(again, DragEffect::Noop { .. });
        prop_assert!(is_noop);
        prop_assert_eq!(engine.session().unwrap(), &first);
    }
}
