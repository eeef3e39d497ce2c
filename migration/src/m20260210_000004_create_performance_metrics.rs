use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PerformanceMetrics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PerformanceMetrics::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PerformanceMetrics::MetricName)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PerformanceMetrics::MetricValue)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PerformanceMetrics::Symbol)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PerformanceMetrics::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_performance_metrics_time")
                    .table(PerformanceMetrics::Table)
                    .col(PerformanceMetrics::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PerformanceMetrics::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PerformanceMetrics {
    Table,
    Id,
    MetricName,
    MetricValue,
    Symbol,
    Timestamp,
}
