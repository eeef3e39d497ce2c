pub use sea_orm_migration::prelude::*;

mod m20260210_000001_create_oi_history;
mod m20260210_000002_create_alerts;
mod m20260210_000003_create_error_logs;
mod m20260210_000004_create_performance_metrics;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260210_000001_create_oi_history::Migration),
            Box::new(m20260210_000002_create_alerts::Migration),
            Box::new(m20260210_000003_create_error_logs::Migration),
            Box::new(m20260210_000004_create_performance_metrics::Migration),
        ]
    }
}
