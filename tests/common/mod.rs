use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

/// Set up an isolated in-memory database with the full schema.
///
/// A single pooled connection keeps the in-memory database alive and
/// visible for the whole test.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);

    let db = Database::connect(options)
        .await
        .expect("in-memory sqlite connection should succeed");

    migration::Migrator::up(&db, None)
        .await
        .expect("migrations should apply cleanly");

    db
}
