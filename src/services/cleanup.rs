//! Time-gated retention cleanup
//!
//! Runs the store's purge pass at most once per configured interval.
//! `last_run` only advances after a successful pass, so a failed
//! cleanup is retried on the next cycle.

use parking_lot::Mutex;
use sea_orm::DbErr;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::services::store::{CleanupStats, OiStore};

pub struct CleanupScheduler {
    interval: Duration,
    data_retention_days: i64,
    alert_retention_days: i64,
    last_run: Mutex<Instant>,
}

impl CleanupScheduler {
    pub fn new(interval: Duration, data_retention_days: i64, alert_retention_days: i64) -> Self {
        Self {
            interval,
            data_retention_days,
            alert_retention_days,
            // First pass happens one full interval after startup.
            last_run: Mutex::new(Instant::now()),
        }
    }

    /// Run the purge if the interval has elapsed; otherwise a no-op.
    /// Returns the per-table stats when a pass ran.
    pub async fn maybe_run(&self, store: &OiStore) -> Result<Option<CleanupStats>, DbErr> {
        if self.last_run.lock().elapsed() < self.interval {
            return Ok(None);
        }

        let started = Instant::now();
        info!("starting periodic data cleanup");

        let stats = store
            .cleanup_old_data(self.data_retention_days, self.alert_retention_days)
            .await?;

        let duration = started.elapsed().as_secs_f64();
        if let Err(e) = store.record_metric("cleanup_duration", duration, None).await {
            warn!(error = %e, "failed to record cleanup duration metric");
        }

        info!(
            records_deleted = stats.total(),
            duration_secs = duration,
            "periodic cleanup completed"
        );

        *self.last_run.lock() = Instant::now();
        Ok(Some(stats))
    }
}
