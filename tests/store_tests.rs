//! Store adapter integration tests against an in-memory database.

mod common;

use chrono::{DateTime, Duration, FixedOffset};
use oi_monitor::clock;
use oi_monitor::services::store::OiStore;

fn minutes_ago(minutes: i64) -> DateTime<FixedOffset> {
    clock::now_utc8() - Duration::minutes(minutes)
}

fn days_ago(days: i64) -> DateTime<FixedOffset> {
    clock::now_utc8() - Duration::days(days)
}

async fn test_store() -> OiStore {
    OiStore::new(common::setup_test_db().await)
}

#[tokio::test]
async fn test_round_trip_ascending_order_no_gaps() {
    let store = test_store().await;

    // Insert out of chronological order on purpose.
    for offset in [4i64, 12, 6, 10, 8] {
        store
            .save_snapshot(
                "BTCUSDT",
                minutes_ago(offset),
                1_000_000.0 + offset as f64,
                65_000.0,
                None,
            )
            .await
            .expect("insert snapshot");
    }

    let window = store
        .recent_window("BTCUSDT", 15)
        .await
        .expect("window query");

    assert_eq!(window.len(), 5);
    for pair in window.windows(2) {
        assert!(
            pair[0].timestamp < pair[1].timestamp,
            "rows must come back in ascending timestamp order"
        );
    }
    // Index 0 is the oldest sample - the baseline.
    assert_eq!(window[0].open_interest, 1_000_012.0);

    let mut ids: Vec<i64> = window.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5, "no duplicate rows");
}

#[tokio::test]
async fn test_window_is_per_symbol() {
    let store = test_store().await;
    store
        .save_snapshot("BTCUSDT", minutes_ago(5), 1.0, 1.0, None)
        .await
        .expect("insert");
    store
        .save_snapshot("ETHUSDT", minutes_ago(5), 2.0, 2.0, None)
        .await
        .expect("insert");

    let window = store.recent_window("BTCUSDT", 15).await.expect("query");
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].symbol, "BTCUSDT");
}

#[tokio::test]
async fn test_window_widens_when_requested_range_is_empty() {
    let store = test_store().await;

    // Only sample is 45 minutes old: outside 15m, inside the widened 60m.
    store
        .save_snapshot("SOLUSDT", minutes_ago(45), 500.0, 150.0, None)
        .await
        .expect("insert");

    let window = store.recent_window("SOLUSDT", 15).await.expect("query");
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].open_interest, 500.0);
}

#[tokio::test]
async fn test_window_falls_back_to_most_recent_stale_row() {
    let store = test_store().await;

    // Nothing within 60 minutes, but history exists.
    store
        .save_snapshot("DOGEUSDT", minutes_ago(200), 10.0, 0.1, None)
        .await
        .expect("insert");
    store
        .save_snapshot("DOGEUSDT", minutes_ago(300), 20.0, 0.2, None)
        .await
        .expect("insert");

    let window = store.recent_window("DOGEUSDT", 15).await.expect("query");
    assert_eq!(window.len(), 1, "synthetic baseline is a single row");
    assert_eq!(
        window[0].open_interest, 10.0,
        "fallback uses the most recent row"
    );
}

#[tokio::test]
async fn test_window_empty_without_any_history() {
    let store = test_store().await;
    let window = store.recent_window("NOSUCH", 15).await.expect("query");
    assert!(window.is_empty());
}

#[tokio::test]
async fn test_cleanup_deletes_only_expired_rows() {
    let store = test_store().await;

    // Two snapshots past the 30-day retention, three inside it.
    for days in [40i64, 35] {
        store
            .save_snapshot("BTCUSDT", days_ago(days), 1.0, 1.0, None)
            .await
            .expect("insert old");
    }
    for days in [1i64, 5, 20] {
        store
            .save_snapshot("BTCUSDT", days_ago(days), 1.0, 1.0, None)
            .await
            .expect("insert fresh");
    }

    // One alert past the 90-day retention, one inside.
    store
        .save_alert("BTCUSDT", 10.0, 3.0, 2.0, 1.0, 2.0, 1.0, None, "medium", days_ago(100))
        .await
        .expect("insert old alert");
    store
        .save_alert("BTCUSDT", 10.0, 3.0, 2.0, 1.0, 2.0, 1.0, None, "medium", days_ago(10))
        .await
        .expect("insert fresh alert");

    let before = store.stats().await.expect("stats");
    assert_eq!(before.oi_history_records, 5);
    assert_eq!(before.alert_records, 2);

    let deleted = store.cleanup_old_data(30, 90).await.expect("cleanup");
    assert_eq!(deleted.oi_records_deleted, 2);
    assert_eq!(deleted.alert_records_deleted, 1);

    let after = store.stats().await.expect("stats");
    assert_eq!(
        after.oi_history_records,
        before.oi_history_records - deleted.oi_records_deleted
    );
    assert_eq!(
        after.alert_records,
        before.alert_records - deleted.alert_records_deleted
    );
}

#[tokio::test]
async fn test_cleanup_is_idempotent_when_nothing_expired() {
    let store = test_store().await;
    store
        .save_snapshot("BTCUSDT", minutes_ago(5), 1.0, 1.0, None)
        .await
        .expect("insert");

    let deleted = store.cleanup_old_data(30, 90).await.expect("cleanup");
    assert_eq!(deleted.total(), 0);

    let stats = store.stats().await.expect("stats");
    assert_eq!(stats.oi_history_records, 1);
}

#[tokio::test]
async fn test_recent_alerts_filters_by_window_and_symbol() {
    let store = test_store().await;

    store
        .save_alert("BTCUSDT", 12.0, 4.0, 2.0, 1.0, 2.0, 1.0, None, "high", minutes_ago(30))
        .await
        .expect("insert");
    store
        .save_alert("ETHUSDT", 16.0, 6.0, 2.0, 1.0, 2.0, 1.0, None, "critical", minutes_ago(60))
        .await
        .expect("insert");
    store
        .save_alert("BTCUSDT", 11.0, 3.0, 2.0, 1.0, 2.0, 1.0, None, "medium", days_ago(3))
        .await
        .expect("insert");

    let last_day = store.recent_alerts(24, None).await.expect("query");
    assert_eq!(last_day.len(), 2);
    // Newest first.
    assert_eq!(last_day[0].symbol, "BTCUSDT");
    assert_eq!(last_day[1].symbol, "ETHUSDT");

    let btc_only = store.recent_alerts(24, Some("BTCUSDT")).await.expect("query");
    assert_eq!(btc_only.len(), 1);
    assert_eq!(btc_only[0].alert_level, "high");
}

#[tokio::test]
async fn test_metrics_and_error_logs_are_recorded() {
    let store = test_store().await;

    store
        .record_metric("monitor_cycle_duration", 12.5, None)
        .await
        .expect("metric");
    store
        .record_metric("api_request_success", 1.0, Some("BTCUSDT"))
        .await
        .expect("metric");
    store
        .log_error("API_REQUEST_ERROR", "timeout", Some("BTCUSDT"), None)
        .await;

    let stats = store.stats().await.expect("stats");
    assert_eq!(stats.performance_metric_records, 2);
    assert_eq!(stats.error_log_records, 1);
}

#[tokio::test]
async fn test_stats_latest_snapshot_time() {
    let store = test_store().await;
    assert!(
        store
            .stats()
            .await
            .expect("stats")
            .latest_snapshot_time
            .is_none()
    );

    let newest = minutes_ago(1);
    store
        .save_snapshot("BTCUSDT", minutes_ago(10), 1.0, 1.0, None)
        .await
        .expect("insert");
    store
        .save_snapshot("BTCUSDT", newest, 2.0, 2.0, None)
        .await
        .expect("insert");

    let stats = store.stats().await.expect("stats");
    assert_eq!(stats.oi_history_records, 2);
    let latest = stats.latest_snapshot_time.expect("latest timestamp");
    assert_eq!(latest.timestamp(), newest.timestamp());
}
