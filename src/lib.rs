// src/lib.rs

pub mod entities {
    pub mod prelude;
    pub mod alerts;
    pub mod error_logs;
    pub mod oi_history;
    pub mod performance_metrics;
}

pub mod services {
    pub mod alerting;
    pub mod binance;
    pub mod change_detector;
    pub mod cleanup;
    pub mod monitor;
    pub mod rate_limiter;
    pub mod store;
    pub mod telegram;
}

pub mod clock;
pub mod config;
pub mod jobs;
