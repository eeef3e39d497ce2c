//! Alert delivery
//!
//! The monitor core only knows the [`Notifier`] seam; Telegram is the
//! production implementation. Delivery failure is reported as `false`
//! and must never crash the cycle - the alert record is already
//! persisted by the time a notifier runs.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use crate::services::alerting::AlertEvent;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound alert delivery seam.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert. Returns whether delivery succeeded.
    async fn notify(&self, alert: &AlertEvent) -> bool;
}

/// Telegram bot delivery via `sendMessage`.
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self::with_api_base(bot_token, chat_id, TELEGRAM_API_BASE.to_string())
    }

    /// API-base override for tests against a local stub.
    pub fn with_api_base(bot_token: String, chat_id: String, api_base: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("reqwest client with static config"),
            bot_token,
            chat_id,
            api_base,
        }
    }

    fn render_message(alert: &AlertEvent) -> String {
        let mut message = format!(
            "{} <b>Perpetual futures anomaly</b>\n\n\
             \u{1f4ca} <b>Symbol:</b> {}\n\n\
             \u{1f4c8} <b>OI change:</b> {:+.2}%\n\
             \u{1f4b0} <b>Current OI:</b> {:.0}\n\
             \u{1f4ca} <b>Baseline OI:</b> {:.0}\n\n\
             \u{1f4b9} <b>Price change:</b> {:+.2}%\n\
             \u{1f4b0} <b>Current price:</b> ${:.6}\n\
             \u{1f4ca} <b>Baseline price:</b> ${:.6}\n",
            alert.level.emoji(),
            alert.symbol,
            alert.oi_change_percent,
            alert.current_oi,
            alert.old_oi,
            alert.price_change_percent,
            alert.current_price,
            alert.old_price,
        );

        if let Some(value) = alert.total_value_usdt {
            message.push_str(&format!(
                "\u{1f48e} <b>Notional value:</b> {:.2} USDT\n",
                value
            ));
        }

        message.push_str(&format!(
            "\u{23f0} <b>Detected at:</b> {}\n\nSeverity: {}",
            alert.timestamp.to_rfc3339(),
            alert.level
        ));

        message
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, alert: &AlertEvent) -> bool {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let message = Self::render_message(alert);

        let result = self
            .client
            .post(&url)
            .form(&[
                ("chat_id", self.chat_id.as_str()),
                ("text", message.as_str()),
                ("parse_mode", "HTML"),
            ])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(symbol = %alert.symbol, level = %alert.level, "telegram alert sent");
                true
            }
            Ok(response) => {
                warn!(
                    symbol = %alert.symbol,
                    status = response.status().as_u16(),
                    "telegram rejected the alert message"
                );
                false
            }
            Err(e) => {
                warn!(symbol = %alert.symbol, error = %e, "telegram delivery failed");
                false
            }
        }
    }
}
