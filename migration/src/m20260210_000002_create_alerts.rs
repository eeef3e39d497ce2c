use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create alerts table - one row per dispatched alert
        manager
            .create_table(
                Table::create()
                    .table(Alerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alerts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alerts::Symbol).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Alerts::OiChangePercent)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alerts::PriceChangePercent)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alerts::CurrentOi).double().not_null())
                    .col(ColumnDef::new(Alerts::OldOi).double().not_null())
                    .col(ColumnDef::new(Alerts::CurrentPrice).double().not_null())
                    .col(ColumnDef::new(Alerts::OldPrice).double().not_null())
                    .col(ColumnDef::new(Alerts::TotalValueUsdt).double().null())
                    .col(ColumnDef::new(Alerts::AlertLevel).string_len(10).not_null())
                    .col(
                        ColumnDef::new(Alerts::AlertTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alerts::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_alerts_time")
                    .table(Alerts::Table)
                    .col(Alerts::AlertTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_alerts_symbol_time")
                    .table(Alerts::Table)
                    .col(Alerts::Symbol)
                    .col(Alerts::AlertTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alerts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Alerts {
    Table,
    Id,
    Symbol,
    OiChangePercent,
    PriceChangePercent,
    CurrentOi,
    OldOi,
    CurrentPrice,
    OldPrice,
    TotalValueUsdt,
    AlertLevel,
    AlertTime,
    CreatedAt,
}
