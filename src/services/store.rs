//! Time-series store adapter
//!
//! Append-only snapshot inserts, windowed lookups with adaptive
//! widening, alert/error/metric persistence and cutoff-based cleanup,
//! all over SeaORM on SQLite.

use chrono::{DateTime, Duration, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::clock;
use crate::entities::{alerts, error_logs, oi_history, performance_metrics, prelude::*};

/// Widened lookback steps applied when the requested window is empty
const WIDENED_WINDOWS_MINUTES: [i64; 2] = [30, 60];

/// Negative skew on the first cutoff, absorbs sub-second precision
/// jitter at the window boundary
const WINDOW_BOUNDARY_SKEW_SECS: i64 = 2;

/// Fixed retention for persisted error rows
const ERROR_LOG_RETENTION_DAYS: i64 = 7;

/// Fixed retention for metric rows
const METRIC_RETENTION_DAYS: i64 = 30;

/// Per-table deletion counts from one cleanup pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupStats {
    pub oi_records_deleted: u64,
    pub alert_records_deleted: u64,
    pub error_logs_deleted: u64,
    pub performance_metrics_deleted: u64,
}

impl CleanupStats {
    pub fn total(&self) -> u64 {
        self.oi_records_deleted
            + self.alert_records_deleted
            + self.error_logs_deleted
            + self.performance_metrics_deleted
    }
}

/// Row counts and freshness summary for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub oi_history_records: u64,
    pub alert_records: u64,
    pub error_log_records: u64,
    pub performance_metric_records: u64,
    pub database_size_bytes: u64,
    pub latest_snapshot_time: Option<DateTime<FixedOffset>>,
}

/// Store adapter owning the database connection.
#[derive(Clone)]
pub struct OiStore {
    db: DatabaseConnection,
    db_path: Option<PathBuf>,
}

impl OiStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, db_path: None }
    }

    /// Open (creating if needed) the SQLite database at `database_url`
    /// and bring the schema up to date.
    pub async fn open(database_url: &str) -> Result<Self, DbErr> {
        let db_path = database_path_from_url(database_url);

        if let Some(parent) = db_path.as_ref().and_then(|p| p.parent()) {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DbErr::Custom(format!("cannot create database directory: {}", e))
                })?;
            }
        }

        let db = sea_orm::Database::connect(database_url).await?;
        migration::Migrator::up(&db, None).await?;

        Ok(Self { db, db_path })
    }

    /// Attach the on-disk path so `stats()` can report file size.
    pub fn with_path(db: DatabaseConnection, db_path: PathBuf) -> Self {
        Self {
            db,
            db_path: Some(db_path),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Append one snapshot row. Single atomic insert.
    pub async fn save_snapshot(
        &self,
        symbol: &str,
        timestamp: DateTime<FixedOffset>,
        open_interest: f64,
        price: f64,
        value_usdt: Option<f64>,
    ) -> Result<(), DbErr> {
        let row = oi_history::ActiveModel {
            symbol: Set(symbol.to_string()),
            timestamp: Set(timestamp),
            open_interest: Set(open_interest),
            price: Set(price),
            value_usdt: Set(value_usdt),
            ..Default::default()
        };
        row.insert(&self.db).await?;
        Ok(())
    }

    /// Snapshots for `symbol` inside the trailing `minutes` window,
    /// ascending by timestamp so index 0 is the comparison baseline.
    ///
    /// When the requested window is empty the lookback widens to 30
    /// then 60 minutes. If even the widened window is empty but the
    /// symbol has history, the single most recent row is returned as a
    /// synthetic baseline - a best-effort comparison against a
    /// potentially stale sample, preferred over no comparison at all.
    pub async fn recent_window(
        &self,
        symbol: &str,
        minutes: i64,
    ) -> Result<Vec<oi_history::Model>, DbErr> {
        let now = clock::now_utc8();
        let cutoff = now - Duration::minutes(minutes) - Duration::seconds(WINDOW_BOUNDARY_SKEW_SECS);

        let mut rows = self.rows_since(symbol, cutoff).await?;

        if rows.is_empty() {
            for widened in WIDENED_WINDOWS_MINUTES {
                rows = self
                    .rows_since(symbol, now - Duration::minutes(widened))
                    .await?;
                if !rows.is_empty() {
                    info!(
                        symbol,
                        requested_minutes = minutes,
                        widened_minutes = widened,
                        "no samples in requested window, widened lookback"
                    );
                    break;
                }
            }
        }

        if rows.is_empty() {
            if let Some(latest) = OiHistory::find()
                .filter(oi_history::Column::Symbol.eq(symbol))
                .order_by_desc(oi_history::Column::Timestamp)
                .one(&self.db)
                .await?
            {
                info!(
                    symbol,
                    baseline_time = %latest.timestamp,
                    "no samples within 60 minutes, using most recent row as stale baseline"
                );
                rows = vec![latest];
            } else {
                debug!(symbol, "no history rows at all");
            }
        }

        Ok(rows)
    }

    async fn rows_since(
        &self,
        symbol: &str,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<Vec<oi_history::Model>, DbErr> {
        OiHistory::find()
            .filter(oi_history::Column::Symbol.eq(symbol))
            .filter(oi_history::Column::Timestamp.gte(cutoff))
            .order_by_asc(oi_history::Column::Timestamp)
            .all(&self.db)
            .await
    }

    /// Persist one dispatched alert record.
    #[allow(clippy::too_many_arguments)]
    pub async fn save_alert(
        &self,
        symbol: &str,
        oi_change_percent: f64,
        price_change_percent: f64,
        current_oi: f64,
        old_oi: f64,
        current_price: f64,
        old_price: f64,
        total_value_usdt: Option<f64>,
        alert_level: &str,
        alert_time: DateTime<FixedOffset>,
    ) -> Result<(), DbErr> {
        let row = alerts::ActiveModel {
            symbol: Set(symbol.to_string()),
            oi_change_percent: Set(oi_change_percent),
            price_change_percent: Set(price_change_percent),
            current_oi: Set(current_oi),
            old_oi: Set(old_oi),
            current_price: Set(current_price),
            old_price: Set(old_price),
            total_value_usdt: Set(total_value_usdt),
            alert_level: Set(alert_level.to_string()),
            alert_time: Set(alert_time),
            ..Default::default()
        };
        row.insert(&self.db).await?;
        Ok(())
    }

    /// Alerts from the trailing `hours`, newest first, optionally for
    /// a single symbol.
    pub async fn recent_alerts(
        &self,
        hours: i64,
        symbol: Option<&str>,
    ) -> Result<Vec<alerts::Model>, DbErr> {
        let cutoff = clock::now_utc8() - Duration::hours(hours);

        let mut query = Alerts::find().filter(alerts::Column::AlertTime.gte(cutoff));
        if let Some(symbol) = symbol {
            query = query.filter(alerts::Column::Symbol.eq(symbol));
        }
        query
            .order_by_desc(alerts::Column::AlertTime)
            .all(&self.db)
            .await
    }

    /// Persist a runtime error row. Failure here is logged and
    /// swallowed: error logging must never knock over the cycle.
    pub async fn log_error(
        &self,
        error_type: &str,
        error_message: &str,
        symbol: Option<&str>,
        context: Option<&str>,
    ) {
        let row = error_logs::ActiveModel {
            error_type: Set(error_type.to_string()),
            error_message: Set(error_message.to_string()),
            symbol: Set(symbol.map(|s| s.to_string())),
            context: Set(context.map(|s| s.to_string())),
            error_time: Set(clock::now_utc8()),
            ..Default::default()
        };
        if let Err(e) = row.insert(&self.db).await {
            warn!(error = %e, error_type, "failed to persist error log row");
        }
    }

    /// Record one telemetry sample.
    pub async fn record_metric(
        &self,
        metric_name: &str,
        metric_value: f64,
        symbol: Option<&str>,
    ) -> Result<(), DbErr> {
        let row = performance_metrics::ActiveModel {
            metric_name: Set(metric_name.to_string()),
            metric_value: Set(metric_value),
            symbol: Set(symbol.map(|s| s.to_string())),
            timestamp: Set(clock::now_utc8()),
            ..Default::default()
        };
        row.insert(&self.db).await?;
        Ok(())
    }

    /// Purge rows older than the retention cutoffs across all tables,
    /// then compact the database file.
    pub async fn cleanup_old_data(
        &self,
        data_retention_days: i64,
        alert_retention_days: i64,
    ) -> Result<CleanupStats, DbErr> {
        let now = clock::now_utc8();

        let oi_deleted = OiHistory::delete_many()
            .filter(oi_history::Column::Timestamp.lt(now - Duration::days(data_retention_days)))
            .exec(&self.db)
            .await?
            .rows_affected;

        let alerts_deleted = Alerts::delete_many()
            .filter(alerts::Column::AlertTime.lt(now - Duration::days(alert_retention_days)))
            .exec(&self.db)
            .await?
            .rows_affected;

        let errors_deleted = ErrorLogs::delete_many()
            .filter(error_logs::Column::ErrorTime.lt(now - Duration::days(ERROR_LOG_RETENTION_DAYS)))
            .exec(&self.db)
            .await?
            .rows_affected;

        let metrics_deleted = PerformanceMetrics::delete_many()
            .filter(
                performance_metrics::Column::Timestamp
                    .lt(now - Duration::days(METRIC_RETENTION_DAYS)),
            )
            .exec(&self.db)
            .await?
            .rows_affected;

        // Reclaim disk space released by the deletes
        self.db.execute_unprepared("VACUUM").await?;

        let stats = CleanupStats {
            oi_records_deleted: oi_deleted,
            alert_records_deleted: alerts_deleted,
            error_logs_deleted: errors_deleted,
            performance_metrics_deleted: metrics_deleted,
        };

        info!(
            oi = stats.oi_records_deleted,
            alerts = stats.alert_records_deleted,
            errors = stats.error_logs_deleted,
            metrics = stats.performance_metrics_deleted,
            "cleanup pass completed"
        );

        Ok(stats)
    }

    /// Row counts, database file size and latest snapshot time.
    pub async fn stats(&self) -> Result<StoreStats, DbErr> {
        let oi_count = OiHistory::find().count(&self.db).await?;
        let alert_count = Alerts::find().count(&self.db).await?;
        let error_count = ErrorLogs::find().count(&self.db).await?;
        let metric_count = PerformanceMetrics::find().count(&self.db).await?;

        let latest = OiHistory::find()
            .order_by_desc(oi_history::Column::Timestamp)
            .one(&self.db)
            .await?
            .map(|row| row.timestamp);

        let database_size_bytes = self
            .db_path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            oi_history_records: oi_count,
            alert_records: alert_count,
            error_log_records: error_count,
            performance_metric_records: metric_count,
            database_size_bytes,
            latest_snapshot_time: latest,
        })
    }
}

/// On-disk path behind a `sqlite://` URL, if any.
fn database_path_from_url(database_url: &str) -> Option<PathBuf> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(PathBuf::from(path))
}
