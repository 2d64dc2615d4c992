use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SystemStatuses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SystemStatuses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SystemStatuses::ServiceName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SystemStatuses::Status)
                            .string_len(20)
                            .not_null()
                            .default("operational"),
                    )
                    .col(
                        ColumnDef::new(SystemStatuses::ResponseTimeMs)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SystemStatuses::UptimePercentage)
                            .double()
                            .not_null()
                            .default(100.0),
                    )
                    .col(
                        ColumnDef::new(SystemStatuses::LastCheck)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SystemStatuses::Message)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SystemStatuses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SystemStatuses {
    Table,
    Id,
    ServiceName,
    Status,
    ResponseTimeMs,
    UptimePercentage,
    LastCheck,
    Message,
}
