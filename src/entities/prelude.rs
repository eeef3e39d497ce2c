pub use super::alerts::Entity as Alerts;
pub use super::error_logs::Entity as ErrorLogs;
pub use super::oi_history::Entity as OiHistory;
pub use super::performance_metrics::Entity as PerformanceMetrics;
