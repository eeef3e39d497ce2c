//! Dump database statistics as JSON.

use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use oi_monitor::services::store::OiStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/oi_monitor.db?mode=rwc".to_string());
    let store = OiStore::open(&database_url).await?;

    let stats = store.stats().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    // Show the last day of alerts alongside the counts.
    let recent = store.recent_alerts(24, None).await?;
    println!("alerts in the last 24h: {}", recent.len());
    for alert in recent.iter().take(10) {
        println!(
            "  {} {} oi {:+.2}% price {:+.2}% [{}]",
            alert.alert_time, alert.symbol, alert.oi_change_percent, alert.price_change_percent,
            alert.alert_level
        );
    }

    Ok(())
}
