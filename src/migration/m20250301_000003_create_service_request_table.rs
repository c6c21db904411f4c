use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ServiceRequest {
    #[sea_orm(iden = "serviceRequest")]
    Table,
    Id,
    ServiceType,
    Description,
    CostCents,
    Status,
    CreateDate,
    ClientId,
    AssignedToId,
    OrderId,
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
                    .table(ServiceRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceRequest::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ServiceRequest::ServiceType)
                            .string_len(250)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceRequest::Description)
                            .string_len(3500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ServiceRequest::CostCents).big_integer().null())
                    .col(
                        ColumnDef::new(ServiceRequest::Status)
                            .string_len(20)
                            .not_null()
                            .default("New"),
                    )
                    .col(
                        ColumnDef::new(ServiceRequest::CreateDate)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ServiceRequest::ClientId).integer().not_null())
                    .col(ColumnDef::new(ServiceRequest::AssignedToId).integer().null())
                    .col(ColumnDef::new(ServiceRequest::OrderId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_request_client_id")
                            .from(ServiceRequest::Table, ServiceRequest::ClientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_request_assigned_to_id")
                            .from(ServiceRequest::Table, ServiceRequest::AssignedToId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_request_order_id")
                            .from(ServiceRequest::Table, ServiceRequest::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_request_order_id")
                    .table(ServiceRequest::Table)
                    .col(ServiceRequest::OrderId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceRequest::Table).to_owned())
            .await
    }
}
