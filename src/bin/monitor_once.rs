//! One-shot monitoring cycle, for smoke tests and diagnostics.
//!
//! Runs a single cycle against the configured database and exchange,
//! then prints the cycle report as JSON.

use std::env;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use oi_monitor::config::MonitorConfig;
use oi_monitor::services::binance::BinanceFuturesService;
use oi_monitor::services::monitor::MonitorService;
use oi_monitor::services::rate_limiter::RateLimiter;
use oi_monitor::services::store::OiStore;
use oi_monitor::services::telegram::{Notifier, TelegramNotifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = MonitorConfig::from_env();
    let database_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/oi_monitor.db?mode=rwc".to_string());
    let store = OiStore::open(&database_url).await?;

    let limiter = Arc::new(RateLimiter::new(config.max_requests_per_minute));
    let binance = BinanceFuturesService::new(limiter);

    let notifier: Option<Arc<dyn Notifier>> = match (
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
    ) {
        (Some(token), Some(chat_id)) => Some(Arc::new(TelegramNotifier::new(token, chat_id))),
        _ => None,
    };

    let monitor = MonitorService::new(config, binance, store, notifier);

    tracing::info!("Running a single monitoring cycle...");
    let report = monitor.run_once().await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
