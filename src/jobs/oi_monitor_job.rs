//! Open-interest monitor job
//!
//! Drives [`MonitorService::run_once`] on a fixed interval.
//! Supports graceful shutdown via SIGTERM/SIGINT: the in-flight cycle
//! finishes before the loop exits.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration as TokioDuration, interval};
use tracing::{error, info};

use crate::services::monitor::MonitorService;

/// Start the monitor job loop.
///
/// Spawns a background task that runs one monitoring cycle per
/// interval tick. A failed cycle is logged and retried on the next
/// tick. Returns the task handle so callers can await shutdown.
pub fn start_oi_monitor_job(monitor: Arc<MonitorService>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interval_secs = monitor.config().monitor_interval_minutes * 60;
        info!(
            interval_minutes = monitor.config().monitor_interval_minutes,
            "open-interest monitor job started"
        );

        let mut ticker = interval(TokioDuration::from_secs(interval_secs));

        loop {
            tokio::select! {
                // Handle shutdown signal gracefully
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received, stopping monitor job gracefully");
                    break;
                }
                // Normal interval tick
                _ = ticker.tick() => {
                    match monitor.run_once().await {
                        Ok(report) => {
                            info!(
                                succeeded = report.succeeded,
                                failed = report.failed,
                                dispatched = report.alerts_dispatched,
                                "cycle finished"
                            );
                        }
                        Err(e) => {
                            error!(error = %e, "monitoring cycle failed");
                            // Continue - next interval will retry
                        }
                    }
                }
            }
        }

        match monitor.get_stats().await {
            Ok(stats) => {
                info!(
                    symbols_monitored = stats.symbols_monitored,
                    total_alerts_sent = stats.total_alerts_sent,
                    snapshot_rows = stats.store.oi_history_records,
                    "monitor job stopped"
                );
            }
            Err(e) => {
                error!(error = %e, "failed to collect final stats on shutdown");
            }
        }
    })
}
