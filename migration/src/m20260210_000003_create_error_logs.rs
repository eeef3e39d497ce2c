use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ErrorLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ErrorLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ErrorLogs::ErrorType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ErrorLogs::ErrorMessage).text().not_null())
                    .col(ColumnDef::new(ErrorLogs::Symbol).string_len(32).null())
                    .col(ColumnDef::new(ErrorLogs::Context).text().null())
                    .col(
                        ColumnDef::new(ErrorLogs::ErrorTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_error_logs_time")
                    .table(ErrorLogs::Table)
                    .col(ErrorLogs::ErrorTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ErrorLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ErrorLogs {
    Table,
    Id,
    ErrorType,
    ErrorMessage,
    Symbol,
    Context,
    ErrorTime,
}
