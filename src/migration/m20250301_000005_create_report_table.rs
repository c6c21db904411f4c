use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Report {
    Table,
    Id,
    Title,
    Content,
    CreateDate,
    CreatedById,
    OrderId,
    ServiceRequestId,
    SupportRequestId,
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

#[derive(DeriveIden)]
enum ServiceRequest {
    #[sea_orm(iden = "serviceRequest")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SupportRequest {
    #[sea_orm(iden = "supportRequest")]
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::Title).string_len(250).not_null())
                    .col(ColumnDef::new(Report::Content).string_len(3500).not_null())
                    .col(
                        ColumnDef::new(Report::CreateDate)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Report::CreatedById).integer().not_null())
                    .col(ColumnDef::new(Report::OrderId).integer().null())
                    .col(ColumnDef::new(Report::ServiceRequestId).integer().null())
                    .col(ColumnDef::new(Report::SupportRequestId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_created_by_id")
                            .from(Report::Table, Report::CreatedById)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_order_id")
                            .from(Report::Table, Report::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_service_request_id")
                            .from(Report::Table, Report::ServiceRequestId)
                            .to(ServiceRequest::Table, ServiceRequest::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_support_request_id")
                            .from(Report::Table, Report::SupportRequestId)
                            .to(SupportRequest::Table, SupportRequest::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_order_id")
                    .table(Report::Table)
                    .col(Report::OrderId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_support_request_id")
                    .table(Report::Table)
                    .col(Report::SupportRequestId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}
