use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oi_monitor::config::MonitorConfig;
use oi_monitor::jobs::oi_monitor_job::start_oi_monitor_job;
use oi_monitor::services::binance::BinanceFuturesService;
use oi_monitor::services::monitor::MonitorService;
use oi_monitor::services::rate_limiter::RateLimiter;
use oi_monitor::services::store::OiStore;
use oi_monitor::services::telegram::{Notifier, TelegramNotifier};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/oi_monitor.db?mode=rwc";

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,oi_monitor=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = MonitorConfig::from_env();
    tracing::info!(
        oi_threshold = config.oi_change_threshold,
        price_threshold = config.price_change_threshold,
        interval_minutes = config.monitor_interval_minutes,
        telegram_enabled = config.telegram_enabled(),
        "starting open-interest monitor"
    );

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    tracing::info!("Connecting to database...");
    let store = OiStore::open(&database_url)
        .await
        .expect("Failed to open database");

    let limiter = Arc::new(RateLimiter::new(config.max_requests_per_minute));
    let binance = BinanceFuturesService::new(limiter);

    let notifier: Option<Arc<dyn Notifier>> = match (
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
    ) {
        (Some(token), Some(chat_id)) => Some(Arc::new(TelegramNotifier::new(token, chat_id))),
        _ => {
            tracing::warn!("Telegram credentials not set - alerts will only be persisted");
            None
        }
    };

    let monitor = Arc::new(MonitorService::new(config, binance, store, notifier));

    let job = start_oi_monitor_job(monitor);
    if let Err(e) = job.await {
        tracing::error!(error = %e, "monitor job terminated abnormally");
    }
}
