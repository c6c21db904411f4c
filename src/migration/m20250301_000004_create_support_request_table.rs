use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum SupportRequest {
    #[sea_orm(iden = "supportRequest")]
    Table,
    Id,
    Topic,
    Message,
    Status,
    CreateDate,
    ClientId,
    AssignedToId,
    RelatedOrderId,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SupportRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SupportRequest::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SupportRequest::Topic)
                            .string_len(250)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SupportRequest::Message)
                            .string_len(3500)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SupportRequest::Status)
                            .string_len(20)
                            .not_null()
                            .default("New"),
                    )
                    .col(
                        ColumnDef::new(SupportRequest::CreateDate)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(SupportRequest::ClientId).integer().not_null())
                    .col(ColumnDef::new(SupportRequest::AssignedToId).integer().null())
                    .col(ColumnDef::new(SupportRequest::RelatedOrderId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_support_request_client_id")
                            .from(SupportRequest::Table, SupportRequest::ClientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_support_request_assigned_to_id")
                            .from(SupportRequest::Table, SupportRequest::AssignedToId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_support_request_related_order_id")
                            .from(SupportRequest::Table, SupportRequest::RelatedOrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_support_request_client_id")
                    .table(SupportRequest::Table)
                    .col(SupportRequest::ClientId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SupportRequest::Table).to_owned())
            .await
    }
}
