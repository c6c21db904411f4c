use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    OrderName,
    Description,
    CostCents,
    Status,
    Priority,
    CreateDate,
    CompleteDate,
    ClientId,
    AssignedToId,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::OrderName).string_len(250).not_null())
                    .col(
                        ColumnDef::new(Orders::Description)
                            .string_len(3500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::CostCents).big_integer().null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(20)
                            .not_null()
                            .default("New"),
                    )
                    .col(
                        ColumnDef::new(Orders::Priority)
                            .string_len(10)
                            .not_null()
                            .default("Medium"),
                    )
                    .col(
                        ColumnDef::new(Orders::CreateDate)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Orders::CompleteDate).timestamp().null())
                    .col(ColumnDef::new(Orders::ClientId).integer().not_null())
                    .col(ColumnDef::new(Orders::AssignedToId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_client_id")
                            .from(Orders::Table, Orders::ClientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_assigned_to_id")
                            .from(Orders::Table, Orders::AssignedToId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_client_id")
                    .table(Orders::Table)
                    .col(Orders::ClientId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_assigned_to_id")
                    .table(Orders::Table)
                    .col(Orders::AssignedToId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}
