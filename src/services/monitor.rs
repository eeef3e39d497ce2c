//! Monitoring orchestrator
//!
//! One cycle: retention cleanup (time-gated), fetch the perpetual
//! universe, bulk-fetch prices, then walk symbols sequentially -
//! snapshot, change detection, alert evaluation, dispatch. Per-symbol
//! failures are isolated and counted; only a missing universe aborts
//! the cycle.

use sea_orm::DbErr;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::clock;
use crate::config::MonitorConfig;
use crate::services::alerting::{AlertEngine, AlertEvent, AlertOutcome};
use crate::services::binance::{BinanceFuturesService, FetchError};
use crate::services::change_detector::{ChangeDetector, ChangeField, LOOKBACK_MINUTES};
use crate::services::cleanup::CleanupScheduler;
use crate::services::store::{CleanupStats, OiStore, StoreStats};
use crate::services::telegram::Notifier;

/// Pause between consecutive symbols, throttles the walk beyond the
/// rate limiter
const INTER_SYMBOL_DELAY: Duration = Duration::from_millis(50);

/// Cycle-level failures that abort the current cycle.
#[derive(Debug)]
pub enum MonitorError {
    /// The exchange returned no tradable perpetual symbols
    EmptyUniverse,
    /// Universe fetch failed outright
    Fetch(FetchError),
    Database(DbErr),
}

impl std::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorError::EmptyUniverse => write!(f, "Symbol universe is empty"),
            MonitorError::Fetch(e) => write!(f, "Universe fetch failed: {}", e),
            MonitorError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for MonitorError {}

impl From<DbErr> for MonitorError {
    fn from(e: DbErr) -> Self {
        MonitorError::Database(e)
    }
}

/// Per-symbol failures; isolated at the cycle loop.
#[derive(Debug)]
enum SymbolError {
    Fetch(FetchError),
    Database(DbErr),
}

impl std::fmt::Display for SymbolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolError::Fetch(e) => write!(f, "{}", e),
            SymbolError::Database(e) => write!(f, "{}", e),
        }
    }
}

impl SymbolError {
    fn error_type(&self) -> &'static str {
        match self {
            SymbolError::Fetch(_) => "API_REQUEST_ERROR",
            SymbolError::Database(_) => "PERSISTENCE_ERROR",
        }
    }
}

impl From<FetchError> for SymbolError {
    fn from(e: FetchError) -> Self {
        SymbolError::Fetch(e)
    }
}

impl From<DbErr> for SymbolError {
    fn from(e: DbErr) -> Self {
        SymbolError::Database(e)
    }
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub symbols_total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub alerts_dispatched: usize,
    pub alerts_suppressed: usize,
    pub duration_secs: f64,
}

/// Runtime counters plus store statistics, for the stats entry point.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStats {
    pub symbols_monitored: usize,
    pub total_alerts_sent: u64,
    pub store: StoreStats,
}

/// The monitoring core. Owns every collaborator and drives the cycle.
pub struct MonitorService {
    config: MonitorConfig,
    binance: BinanceFuturesService,
    store: OiStore,
    detector: ChangeDetector,
    engine: AlertEngine,
    cleanup: CleanupScheduler,
    notifier: Option<Arc<dyn Notifier>>,
    symbols_monitored: AtomicUsize,
    alerts_sent: AtomicU64,
}

impl MonitorService {
    pub fn new(
        config: MonitorConfig,
        binance: BinanceFuturesService,
        store: OiStore,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let engine = AlertEngine::new(
            config.oi_change_threshold,
            config.price_change_threshold,
            Duration::from_secs(config.cooldown_period_secs),
        );
        let cleanup = CleanupScheduler::new(
            Duration::from_secs(config.cleanup_interval_hours * 3600),
            config.data_retention_days,
            config.alert_retention_days,
        );
        let detector = ChangeDetector::new(store.clone());

        Self {
            config,
            binance,
            store,
            detector,
            engine,
            cleanup,
            notifier,
            symbols_monitored: AtomicUsize::new(0),
            alerts_sent: AtomicU64::new(0),
        }
    }

    /// Execute one full monitoring cycle.
    pub async fn run_once(&self) -> Result<CycleReport, MonitorError> {
        let started = Instant::now();
        info!("starting monitoring cycle");

        // Cleanup failures are retried next interval, never fatal.
        if let Err(e) = self.cleanup.maybe_run(&self.store).await {
            error!(error = %e, "periodic cleanup failed");
            self.store
                .log_error("CLEANUP_ERROR", &e.to_string(), None, None)
                .await;
        }

        let symbols = self
            .binance
            .perpetual_symbols()
            .await
            .map_err(MonitorError::Fetch)?;
        if symbols.is_empty() {
            return Err(MonitorError::EmptyUniverse);
        }
        self.symbols_monitored.store(symbols.len(), Ordering::Relaxed);

        // Bulk prices are best effort; per-symbol fetch covers misses.
        let bulk_prices = match self.binance.all_prices().await {
            Ok(prices) => prices,
            Err(e) => {
                warn!(error = %e, "bulk price fetch failed, falling back to per-symbol lookups");
                HashMap::new()
            }
        };

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut alerts_dispatched = 0usize;
        let mut alerts_suppressed = 0usize;

        for (idx, symbol) in symbols.iter().enumerate() {
            match self.process_symbol(symbol, &bulk_prices).await {
                Ok(outcome) => {
                    succeeded += 1;
                    match outcome {
                        AlertOutcome::Dispatched(_) => alerts_dispatched += 1,
                        AlertOutcome::Suppressed => alerts_suppressed += 1,
                        AlertOutcome::Idle => {}
                    }
                }
                Err(e) => {
                    failed += 1;
                    warn!(symbol, error = %e, "symbol processing failed, skipping");
                    self.store
                        .log_error(e.error_type(), &e.to_string(), Some(symbol), None)
                        .await;
                }
            }

            // Only between consecutive symbols, not after the last one.
            if idx + 1 < symbols.len() {
                tokio::time::sleep(INTER_SYMBOL_DELAY).await;
            }
        }

        let duration_secs = started.elapsed().as_secs_f64();
        self.record_cycle_metrics(duration_secs, succeeded, failed)
            .await;

        let report = CycleReport {
            symbols_total: symbols.len(),
            succeeded,
            failed,
            alerts_dispatched,
            alerts_suppressed,
            duration_secs,
        };

        info!(
            total = report.symbols_total,
            succeeded = report.succeeded,
            failed = report.failed,
            dispatched = report.alerts_dispatched,
            suppressed = report.alerts_suppressed,
            duration_secs = report.duration_secs,
            "monitoring cycle completed"
        );

        Ok(report)
    }

    async fn process_symbol(
        &self,
        symbol: &str,
        bulk_prices: &HashMap<String, f64>,
    ) -> Result<AlertOutcome, SymbolError> {
        let current_oi = self.binance.open_interest(symbol).await?;

        let current_price = match bulk_prices.get(symbol) {
            Some(price) => *price,
            None => self.binance.ticker_price(symbol).await?,
        };

        let total_value_usdt = current_oi * current_price;
        let now = clock::now_utc8();

        self.store
            .save_snapshot(symbol, now, current_oi, current_price, Some(total_value_usdt))
            .await?;

        let oi_rate = self
            .detector
            .change_rate(symbol, current_oi, ChangeField::OpenInterest)
            .await?;
        let price_rate = self
            .detector
            .change_rate(symbol, current_price, ChangeField::Price)
            .await?;

        let outcome = self.engine.evaluate(symbol, oi_rate, price_rate);

        match outcome {
            AlertOutcome::Dispatched(level) => {
                // Re-read the window for the baseline value pair.
                let window = self.store.recent_window(symbol, LOOKBACK_MINUTES).await?;
                if let (Some(baseline), Some(oi_rate), Some(price_rate)) =
                    (window.first(), oi_rate, price_rate)
                {
                    let event = AlertEvent {
                        symbol: symbol.to_string(),
                        oi_change_percent: oi_rate * 100.0,
                        price_change_percent: price_rate * 100.0,
                        current_oi,
                        old_oi: baseline.open_interest,
                        current_price,
                        old_price: baseline.price,
                        total_value_usdt: Some(total_value_usdt),
                        level,
                        timestamp: now,
                    };
                    self.dispatch_alert(event).await?;
                }
            }
            AlertOutcome::Suppressed => {
                info!(
                    symbol,
                    oi_change_rate = ?oi_rate,
                    price_change_rate = ?price_rate,
                    "alert condition met but symbol is in cooldown"
                );
            }
            AlertOutcome::Idle => {
                debug!(
                    symbol,
                    open_interest = current_oi,
                    price = current_price,
                    "data update"
                );
            }
        }

        if let Err(e) = self
            .store
            .record_metric("api_request_success", 1.0, Some(symbol))
            .await
        {
            warn!(symbol, error = %e, "failed to record request metric");
        }

        Ok(outcome)
    }

    /// Persist the alert record, then attempt delivery, then start the
    /// cooldown. A notifier failure is logged but the alert stays
    /// recorded and the cooldown still advances.
    async fn dispatch_alert(&self, event: AlertEvent) -> Result<(), SymbolError> {
        self.store
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
            .await?;

        if let Some(notifier) = &self.notifier {
            if !notifier.notify(&event).await {
                self.store
                    .log_error(
                        "TELEGRAM_ERROR",
                        "alert delivery failed",
                        Some(&event.symbol),
                        None,
                    )
                    .await;
            }
        }

        self.engine.mark_dispatched(&event.symbol);
        self.alerts_sent.fetch_add(1, Ordering::Relaxed);

        info!(
            symbol = %event.symbol,
            level = %event.level,
            oi_change_percent = event.oi_change_percent,
            price_change_percent = event.price_change_percent,
            "alert dispatched"
        );

        Ok(())
    }

    async fn record_cycle_metrics(&self, duration_secs: f64, succeeded: usize, failed: usize) {
        let samples = [
            ("monitor_cycle_duration", duration_secs),
            ("symbols_processed", succeeded as f64),
            ("symbols_failed", failed as f64),
        ];
        for (name, value) in samples {
            if let Err(e) = self.store.record_metric(name, value, None).await {
                warn!(metric = name, error = %e, "failed to record cycle metric");
            }
        }
    }

    /// Runtime counters plus store statistics.
    pub async fn get_stats(&self) -> Result<MonitorStats, MonitorError> {
        let store = self.store.stats().await?;
        Ok(MonitorStats {
            symbols_monitored: self.symbols_monitored.load(Ordering::Relaxed),
            total_alerts_sent: self.alerts_sent.load(Ordering::Relaxed),
            store,
        })
    }

    /// Immediate, non-gated cleanup with explicit retention periods.
    pub async fn cleanup(
        &self,
        data_retention_days: i64,
        alert_retention_days: i64,
    ) -> Result<CleanupStats, MonitorError> {
        Ok(self
            .store
            .cleanup_old_data(data_retention_days, alert_retention_days)
            .await?)
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}
