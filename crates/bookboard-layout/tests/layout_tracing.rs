//! Log-event checks for the layout crate.

use std::sync::{Arc, Mutex};

use bookboard_core::{Interval, TimeWindow};
use bookboard_layout::{PackingConfig, StackingCache, Timescale, pack_lane};
use chrono::NaiveDate;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: Vec<(String, String)>,
}

impl CapturedEvent {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0,
        });
    }
}

fn with_captured_events<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
}

#[test]
fn invalid_interval_is_logged_at_warn() {
    let lane = [
        Interval::from_dates("ok", "r1", d(2), d(4)),
        Interval::from_dates("inverted", "r1", d(9), d(3)),
    ];
    let events = with_captured_events(|| {
        let result = pack_lane(
            &lane,
            None,
            &TimeWindow::new(d(1), 14),
            &Timescale::default(),
            &PackingConfig::default(),
        );
        assert_eq!(result.rejected.len(), 1);
    });

    let warn = events
        .iter()
        .find(|e| e.level == tracing::Level::WARN)
        .expect("rejected interval should warn");
    assert_eq!(warn.target, "bookboard.layout");
    assert_eq!(warn.field("interval"), Some("inverted"));
}

#[test]
fn saturation_is_logged_at_warn() {
    let lane: Vec<Interval> = (0..4)
        .map(|i| Interval::from_dates(format!("x{i}"), "r1", d(2), d(6)))
        .collect();
    let config = PackingConfig {
        level_ceiling: 1,
        ..PackingConfig::default()
    };
    let events = with_captured_events(|| {
        let result = pack_lane(
            &lane,
            None,
            &TimeWindow::new(d(1), 14),
            &Timescale::default(),
            &config,
        );
        assert!(result.saturated);
    });
    assert!(
        events
            .iter()
            .any(|e| e.level == tracing::Level::WARN && e.field("level_ceiling") == Some("1"))
    );
}

#[test]
fn lane_invalidation_is_logged_at_debug() {
    let window = TimeWindow::new(d(1), 14);
    let mut cache = StackingCache::new(4);
    cache.get_or_compute("r1", window.key(), || {
        bookboard_layout::PackingResult::empty(&PackingConfig::default())
    });

    let events = with_captured_events(|| {
        assert_eq!(cache.invalidate("r1"), 1);
    });
    let debug = events
        .iter()
        .find(|e| e.level == tracing::Level::DEBUG)
        .expect("invalidation should log");
    assert_eq!(debug.field("lane"), Some("r1"));
    assert_eq!(debug.field("removed"), Some("1"));
}
