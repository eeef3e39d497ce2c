//! End-to-end alert flow: snapshots in the store, change detection,
//! threshold evaluation and notification delivery.

mod common;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use parking_lot::Mutex;

use oi_monitor::clock;
use oi_monitor::services::alerting::{AlertEngine, AlertEvent, AlertLevel, AlertOutcome};
use oi_monitor::services::change_detector::{ChangeDetector, ChangeField};
use oi_monitor::services::store::OiStore;
use oi_monitor::services::telegram::Notifier;

fn minutes_ago(minutes: i64) -> DateTime<FixedOffset> {
    clock::now_utc8() - Duration::minutes(minutes)
}

async fn test_store() -> OiStore {
    OiStore::new(common::setup_test_db().await)
}

/// Records delivered alerts instead of hitting the Telegram API.
struct RecordingNotifier {
    delivered: Mutex<Vec<AlertEvent>>,
    succeed: bool,
}

impl RecordingNotifier {
    fn new(succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            delivered: Mutex::new(Vec::new()),
            succeed,
        })
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, alert: &AlertEvent) -> bool {
        self.delivered.lock().push(alert.clone());
        self.succeed
    }
}

#[tokio::test]
async fn test_worked_example_dispatches_critical_once() {
    let store = test_store().await;
    let detector = ChangeDetector::new(store.clone());
    let engine = AlertEngine::new(0.08, 0.02, StdDuration::from_secs(3600));

    // Baseline ten minutes ago, then the current cycle's snapshot.
    store
        .save_snapshot("AAVEUSDT", minutes_ago(10), 1_000_000.0, 1.00, None)
        .await
        .expect("baseline snapshot");
    store
        .save_snapshot("AAVEUSDT", clock::now_utc8(), 1_600_000.0, 1.08, None)
        .await
        .expect("current snapshot");

    let oi_rate = detector
        .change_rate("AAVEUSDT", 1_600_000.0, ChangeField::OpenInterest)
        .await
        .expect("query")
        .expect("rate available");
    let price_rate = detector
        .change_rate("AAVEUSDT", 1.08, ChangeField::Price)
        .await
        .expect("query")
        .expect("rate available");

    assert!((oi_rate - 0.6).abs() < 1e-9);
    assert!((price_rate - 0.08).abs() < 1e-9);

    let outcome = engine.evaluate("AAVEUSDT", Some(oi_rate), Some(price_rate));
    assert_eq!(outcome, AlertOutcome::Dispatched(AlertLevel::Critical));

    engine.mark_dispatched("AAVEUSDT");
    assert_eq!(
        engine.evaluate("AAVEUSDT", Some(oi_rate), Some(price_rate)),
        AlertOutcome::Suppressed,
        "same condition within cooldown must not dispatch again"
    );
}

#[tokio::test]
async fn test_change_rate_unavailable_with_single_sample() {
    let store = test_store().await;
    let detector = ChangeDetector::new(store.clone());

    store
        .save_snapshot("BTCUSDT", clock::now_utc8(), 1_000_000.0, 65_000.0, None)
        .await
        .expect("insert");

    let rate = detector
        .change_rate("BTCUSDT", 1_000_000.0, ChangeField::OpenInterest)
        .await
        .expect("query");
    assert_eq!(rate, None, "a lone snapshot is no baseline");
}

#[tokio::test]
async fn test_change_rate_unavailable_for_zero_baseline() {
    let store = test_store().await;
    let detector = ChangeDetector::new(store.clone());

    store
        .save_snapshot("NEWUSDT", minutes_ago(10), 0.0, 2.0, None)
        .await
        .expect("insert");
    store
        .save_snapshot("NEWUSDT", clock::now_utc8(), 5_000.0, 2.2, None)
        .await
        .expect("insert");

    let oi_rate = detector
        .change_rate("NEWUSDT", 5_000.0, ChangeField::OpenInterest)
        .await
        .expect("query");
    assert_eq!(oi_rate, None, "zero baseline has no defined relative change");

    // The price baseline is fine, so that rate still computes.
    let price_rate = detector
        .change_rate("NEWUSDT", 2.2, ChangeField::Price)
        .await
        .expect("query")
        .expect("rate available");
    assert!((price_rate - 0.1).abs() < 1e-9);
}

#[tokio::test]
async fn test_change_rate_against_widened_baseline() {
    let store = test_store().await;
    let detector = ChangeDetector::new(store.clone());

    // Both samples are outside the 15-minute window, so the lookback
    // widens to 60 minutes and finds them, oldest first.
    store
        .save_snapshot("SOLUSDT", minutes_ago(40), 1_000.0, 100.0, None)
        .await
        .expect("insert");
    store
        .save_snapshot("SOLUSDT", minutes_ago(35), 1_150.0, 102.0, None)
        .await
        .expect("insert");

    let oi_rate = detector
        .change_rate("SOLUSDT", 1_200.0, ChangeField::OpenInterest)
        .await
        .expect("query")
        .expect("rate available");
    assert!((oi_rate - 0.2).abs() < 1e-9);
}

#[tokio::test]
async fn test_fresh_snapshot_alone_never_triggers_widening() {
    let store = test_store().await;
    let detector = ChangeDetector::new(store.clone());

    // A stale row plus a current-cycle row: the fresh row keeps the
    // 15-minute window non-empty, so no widening happens and a
    // single-sample window yields no rate.
    store
        .save_snapshot("SOLUSDT", minutes_ago(40), 1_000.0, 100.0, None)
        .await
        .expect("insert");
    store
        .save_snapshot("SOLUSDT", clock::now_utc8(), 1_200.0, 103.0, None)
        .await
        .expect("insert");

    let window = store.recent_window("SOLUSDT", 15).await.expect("query");
    assert_eq!(window.len(), 1);

    let oi_rate = detector
        .change_rate("SOLUSDT", 1_200.0, ChangeField::OpenInterest)
        .await
        .expect("query");
    assert_eq!(oi_rate, None);
}

#[tokio::test]
async fn test_dispatch_persists_alert_and_delivers_notification() {
    let store = test_store().await;
    let notifier = RecordingNotifier::new(true);
    let now = clock::now_utc8();

    let event = AlertEvent {
        symbol: "AAVEUSDT".to_string(),
        oi_change_percent: 60.0,
        price_change_percent: 8.0,
        current_oi: 1_600_000.0,
        old_oi: 1_000_000.0,
        current_price: 1.08,
        old_price: 1.00,
        total_value_usdt: Some(1_728_000.0),
        level: AlertLevel::Critical,
        timestamp: now,
    };

    // Persist first, deliver second: the record must exist even when
    // delivery later fails.
    store
        .save_alert(
            &event.symbol,
            event.oi_change_percent,
            event.price_change_percent,
            event.current_oi,
            event.old_oi,
            event.current_price,
            event.old_price,
            event.total_value_usdt,
            event.level.as_str(),
            event.timestamp,
        )
        .await
        .expect("persist alert");
    assert!(notifier.notify(&event).await);

    let persisted = store.recent_alerts(1, Some("AAVEUSDT")).await.expect("query");
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].alert_level, "critical");
    assert!((persisted[0].oi_change_percent - 60.0).abs() < 1e-9);

    let delivered = notifier.delivered.lock();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].symbol, "AAVEUSDT");
}

#[tokio::test]
async fn test_failed_delivery_does_not_lose_the_alert_record() {
    let store = test_store().await;
    let notifier = RecordingNotifier::new(false);
    let engine = AlertEngine::new(0.05, 0.02, StdDuration::from_secs(3600));
    let now = clock::now_utc8();

    let event = AlertEvent {
        symbol: "BTCUSDT".to_string(),
        oi_change_percent: 12.0,
        price_change_percent: 4.0,
        current_oi: 1_120_000.0,
        old_oi: 1_000_000.0,
        current_price: 67_600.0,
        old_price: 65_000.0,
        total_value_usdt: None,
        level: AlertLevel::High,
        timestamp: now,
    };

    store
        .save_alert(
            &event.symbol,
            event.oi_change_percent,
            event.price_change_percent,
            event.current_oi,
            event.old_oi,
            event.current_price,
            event.old_price,
            event.total_value_usdt,
            event.level.as_str(),
            event.timestamp,
        )
        .await
        .expect("persist alert");

    let delivered_ok = notifier.notify(&event).await;
    assert!(!delivered_ok);

    // Cooldown still advances after a failed delivery.
    engine.mark_dispatched(&event.symbol);
    assert_eq!(
        engine.evaluate(&event.symbol, Some(0.12), Some(0.04)),
        AlertOutcome::Suppressed
    );

    let persisted = store.recent_alerts(1, Some("BTCUSDT")).await.expect("query");
    assert_eq!(persisted.len(), 1, "record survives the failed delivery");
}
