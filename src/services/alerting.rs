//! Alert evaluation
//!
//! Threshold conjunction, severity classification and the
//! per-symbol cooldown gate. Each evaluation yields exactly one of:
//! nothing to do, condition met but suppressed by cooldown, or
//! dispatch with a severity tier.

use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Severity tiers, ordered lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    /// Classify from percentage magnitudes. Evaluated as an ordered
    /// cascade, highest tier first; the first matching tier wins.
    pub fn classify(oi_change_percent: f64, price_change_percent: f64) -> Self {
        let oi = oi_change_percent.abs();
        let price = price_change_percent.abs();

        if oi >= 15.0 || price >= 5.0 {
            AlertLevel::Critical
        } else if oi >= 12.0 || price >= 4.0 {
            AlertLevel::High
        } else if oi >= 10.0 || price >= 3.0 {
            AlertLevel::Medium
        } else {
            AlertLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Low => "low",
            AlertLevel::Medium => "medium",
            AlertLevel::High => "high",
            AlertLevel::Critical => "critical",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AlertLevel::Low => "\u{26a0}\u{fe0f}",
            AlertLevel::Medium => "\u{1f6a8}",
            AlertLevel::High => "\u{1f525}",
            AlertLevel::Critical => "\u{1f4a5}",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload handed to the store and the notifier on dispatch.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub symbol: String,
    /// Signed change, in percent
    pub oi_change_percent: f64,
    /// Signed change, in percent
    pub price_change_percent: f64,
    pub current_oi: f64,
    pub old_oi: f64,
    pub current_price: f64,
    pub old_price: f64,
    pub total_value_usdt: Option<f64>,
    pub level: AlertLevel,
    pub timestamp: DateTime<FixedOffset>,
}

/// Result of one per-symbol evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// No alert possible or thresholds not met
    Idle,
    /// Both thresholds exceeded but the symbol is in cooldown
    Suppressed,
    /// Alert qualifies for dispatch at the given severity
    Dispatched(AlertLevel),
}

/// Threshold and cooldown state for alert evaluation.
///
/// Owns the cooldown map; callers only see `evaluate` and
/// `mark_dispatched`.
pub struct AlertEngine {
    oi_threshold: f64,
    price_threshold: f64,
    cooldown_period: Duration,
    cooldown: Mutex<HashMap<String, Instant>>,
}

impl AlertEngine {
    pub fn new(oi_threshold: f64, price_threshold: f64, cooldown_period: Duration) -> Self {
        Self {
            oi_threshold,
            price_threshold,
            cooldown: Mutex::new(HashMap::new()),
            cooldown_period,
        }
    }

    /// Evaluate one symbol for this cycle.
    ///
    /// Both change rates must be available and both magnitudes must
    /// meet their thresholds (conjunction). A qualifying symbol inside
    /// its cooldown window is suppressed, not dispatched.
    pub fn evaluate(
        &self,
        symbol: &str,
        oi_change_rate: Option<f64>,
        price_change_rate: Option<f64>,
    ) -> AlertOutcome {
        let (Some(oi_rate), Some(price_rate)) = (oi_change_rate, price_change_rate) else {
            return AlertOutcome::Idle;
        };

        if oi_rate.abs() < self.oi_threshold || price_rate.abs() < self.price_threshold {
            return AlertOutcome::Idle;
        }

        if !self.cooldown_elapsed(symbol) {
            return AlertOutcome::Suppressed;
        }

        AlertOutcome::Dispatched(AlertLevel::classify(oi_rate * 100.0, price_rate * 100.0))
    }

    /// Record a dispatch; starts (or restarts) the symbol's cooldown.
    /// Measured from the previous dispatch, never from cycle start.
    pub fn mark_dispatched(&self, symbol: &str) {
        self.cooldown
            .lock()
            .insert(symbol.to_string(), Instant::now());
    }

    fn cooldown_elapsed(&self, symbol: &str) -> bool {
        match self.cooldown.lock().get(symbol) {
            Some(last_alert) => last_alert.elapsed() > self.cooldown_period,
            None => true,
        }
    }
}
