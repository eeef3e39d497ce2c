//! Run a retention cleanup pass immediately.
//!
//! Usage: manual_cleanup [data_retention_days] [alert_retention_days]
//! Defaults match the configured retention periods.

use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use oi_monitor::config::MonitorConfig;
use oi_monitor::services::store::OiStore;

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
    let mut args = env::args().skip(1);
    let data_retention_days: i64 = args
        .next()
        .and_then(|v| v.parse().ok())
        .unwrap_or(config.data_retention_days);
    let alert_retention_days: i64 = args
        .next()
        .and_then(|v| v.parse().ok())
        .unwrap_or(config.alert_retention_days);

    let database_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/oi_monitor.db?mode=rwc".to_string());
    let store = OiStore::open(&database_url).await?;

    tracing::info!(
        data_retention_days,
        alert_retention_days,
        "running manual cleanup"
    );
    let stats = store
        .cleanup_old_data(data_retention_days, alert_retention_days)
        .await?;

    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!("total rows deleted: {}", stats.total());
    Ok(())
}
