//! Monitor configuration
//!
//! All knobs come from environment variables with defaults matching
//! production settings. `dotenvy` is loaded by the binaries before
//! this module is consulted.

use std::env;
use std::str::FromStr;

/// Environment variable for the OI change threshold (ratio)
const ENV_OI_CHANGE_THRESHOLD: &str = "OI_CHANGE_THRESHOLD";

/// Environment variable for the price change threshold (ratio)
const ENV_PRICE_CHANGE_THRESHOLD: &str = "PRICE_CHANGE_THRESHOLD";

/// Environment variable for the monitoring interval in minutes
const ENV_MONITOR_INTERVAL_MINUTES: &str = "MONITOR_INTERVAL_MINUTES";

/// Environment variable for snapshot retention in days
const ENV_DATA_RETENTION_DAYS: &str = "DATA_RETENTION_DAYS";

/// Environment variable for alert-record retention in days
const ENV_ALERT_RETENTION_DAYS: &str = "ALERT_RETENTION_DAYS";

/// Environment variable for the cleanup interval in hours
const ENV_CLEANUP_INTERVAL_HOURS: &str = "CLEANUP_INTERVAL_HOURS";

/// Environment variable for the per-symbol alert cooldown in seconds
const ENV_COOLDOWN_PERIOD_SECS: &str = "ALERT_COOLDOWN_SECS";

/// Environment variable for the outbound request budget per minute
const ENV_MAX_REQUESTS_PER_MINUTE: &str = "MAX_REQUESTS_PER_MINUTE";

/// Environment variable for the Telegram bot token
const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable for the Telegram chat id
const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

const DEFAULT_OI_CHANGE_THRESHOLD: f64 = 0.05;
const DEFAULT_PRICE_CHANGE_THRESHOLD: f64 = 0.02;
const DEFAULT_MONITOR_INTERVAL_MINUTES: u64 = 15;
const DEFAULT_DATA_RETENTION_DAYS: i64 = 30;
const DEFAULT_ALERT_RETENTION_DAYS: i64 = 90;
const DEFAULT_CLEANUP_INTERVAL_HOURS: u64 = 24;
const DEFAULT_COOLDOWN_PERIOD_SECS: u64 = 3600;
const DEFAULT_MAX_REQUESTS_PER_MINUTE: usize = 1200;

/// Runtime configuration for the monitor core.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Minimum absolute OI change rate to qualify for an alert (0.05 = 5%)
    pub oi_change_threshold: f64,
    /// Minimum absolute price change rate to qualify for an alert
    pub price_change_threshold: f64,
    /// Delay between monitoring cycles
    pub monitor_interval_minutes: u64,
    pub data_retention_days: i64,
    pub alert_retention_days: i64,
    pub cleanup_interval_hours: u64,
    /// Minimum elapsed time between two dispatched alerts for one symbol
    pub cooldown_period_secs: u64,
    /// Sliding 60s window capacity for outbound requests
    pub max_requests_per_minute: usize,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            oi_change_threshold: DEFAULT_OI_CHANGE_THRESHOLD,
            price_change_threshold: DEFAULT_PRICE_CHANGE_THRESHOLD,
            monitor_interval_minutes: DEFAULT_MONITOR_INTERVAL_MINUTES,
            data_retention_days: DEFAULT_DATA_RETENTION_DAYS,
            alert_retention_days: DEFAULT_ALERT_RETENTION_DAYS,
            cleanup_interval_hours: DEFAULT_CLEANUP_INTERVAL_HOURS,
            cooldown_period_secs: DEFAULT_COOLDOWN_PERIOD_SECS,
            max_requests_per_minute: DEFAULT_MAX_REQUESTS_PER_MINUTE,
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

impl MonitorConfig {
    /// Build a configuration from environment variables, falling back
    /// to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            oi_change_threshold: env_or(ENV_OI_CHANGE_THRESHOLD, DEFAULT_OI_CHANGE_THRESHOLD),
            price_change_threshold: env_or(
                ENV_PRICE_CHANGE_THRESHOLD,
                DEFAULT_PRICE_CHANGE_THRESHOLD,
            ),
            monitor_interval_minutes: env_or(
                ENV_MONITOR_INTERVAL_MINUTES,
                DEFAULT_MONITOR_INTERVAL_MINUTES,
            ),
            data_retention_days: env_or(ENV_DATA_RETENTION_DAYS, DEFAULT_DATA_RETENTION_DAYS),
            alert_retention_days: env_or(ENV_ALERT_RETENTION_DAYS, DEFAULT_ALERT_RETENTION_DAYS),
            cleanup_interval_hours: env_or(
                ENV_CLEANUP_INTERVAL_HOURS,
                DEFAULT_CLEANUP_INTERVAL_HOURS,
            ),
            cooldown_period_secs: env_or(ENV_COOLDOWN_PERIOD_SECS, DEFAULT_COOLDOWN_PERIOD_SECS),
            max_requests_per_minute: env_or(
                ENV_MAX_REQUESTS_PER_MINUTE,
                DEFAULT_MAX_REQUESTS_PER_MINUTE,
            ),
            telegram_bot_token: env::var(ENV_TELEGRAM_BOT_TOKEN)
                .ok()
                .filter(|v| !v.is_empty()),
            telegram_chat_id: env::var(ENV_TELEGRAM_CHAT_ID)
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }

    /// True when both Telegram credentials are present.
    pub fn telegram_enabled(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.oi_change_threshold, 0.05);
        assert_eq!(config.price_change_threshold, 0.02);
        assert_eq!(config.monitor_interval_minutes, 15);
        assert_eq!(config.data_retention_days, 30);
        assert_eq!(config.alert_retention_days, 90);
        assert_eq!(config.cleanup_interval_hours, 24);
        assert_eq!(config.cooldown_period_secs, 3600);
        assert_eq!(config.max_requests_per_minute, 1200);
        assert!(!config.telegram_enabled());
    }

    #[test]
    fn test_telegram_enabled_requires_both() {
        let mut config = MonitorConfig::default();
        config.telegram_bot_token = Some("token".to_string());
        assert!(!config.telegram_enabled());
        config.telegram_chat_id = Some("chat".to_string());
        assert!(config.telegram_enabled());
    }
}
