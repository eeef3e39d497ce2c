use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create oi_history table - open interest / price time series
        manager
            .create_table(
                Table::create()
                    .table(OiHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OiHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OiHistory::Symbol).string_len(32).not_null())
                    .col(
                        ColumnDef::new(OiHistory::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OiHistory::OpenInterest).double().not_null())
                    .col(ColumnDef::new(OiHistory::Price).double().not_null())
                    .col(ColumnDef::new(OiHistory::ValueUsdt).double().null())
                    .col(
                        ColumnDef::new(OiHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index for windowed per-symbol lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_oi_history_symbol_time")
                    .table(OiHistory::Table)
                    .col(OiHistory::Symbol)
                    .col(OiHistory::Timestamp)
                    .to_owned(),
            )
            .await?;

        // Index for retention cleanup by cutoff timestamp
        manager
            .create_index(
                Index::create()
                    .name("idx_oi_history_time")
                    .table(OiHistory::Table)
                    .col(OiHistory::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OiHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OiHistory {
    Table,
    Id,
    Symbol,
    Timestamp,
    OpenInterest,
    Price,
    ValueUsdt,
    CreatedAt,
}
