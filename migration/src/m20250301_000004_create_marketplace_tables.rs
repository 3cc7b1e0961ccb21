use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ServiceRequests {
    Table,
    Id,
    ClientId,
    Title,
    Category,
    Description,
    PreferredSessionType,
    Budget,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ServiceProposals {
    Table,
    Id,
    RequestId,
    ProfessionalId,
    Message,
    Status,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceRequests::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ServiceRequests::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ServiceRequests::ClientId).uuid().not_null())
                    .col(ColumnDef::new(ServiceRequests::Title).string().not_null())
                    .col(ColumnDef::new(ServiceRequests::Category).string().not_null())
                    .col(ColumnDef::new(ServiceRequests::Description).text().not_null())
                    .col(
                        ColumnDef::new(ServiceRequests::PreferredSessionType)
                            .string()
                            .not_null()
                            .default("video"),
                    )
                    .col(ColumnDef::new(ServiceRequests::Budget).decimal_len(10, 2).null())
                    .col(
                        ColumnDef::new(ServiceRequests::Status)
                            .string()
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(ServiceRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_requests_client_id")
                            .from(ServiceRequests::Table, ServiceRequests::ClientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ServiceProposals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ServiceProposals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ServiceProposals::RequestId).uuid().not_null())
                    .col(ColumnDef::new(ServiceProposals::ProfessionalId).uuid().not_null())
                    .col(ColumnDef::new(ServiceProposals::Message).text().not_null().default(""))
                    .col(
                        ColumnDef::new(ServiceProposals::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ServiceProposals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_proposals_request_id")
                            .from(ServiceProposals::Table, ServiceProposals::RequestId)
                            .to(ServiceRequests::Table, ServiceRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_proposals_professional_id")
                            .from(ServiceProposals::Table, ServiceProposals::ProfessionalId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceProposals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ServiceRequests::Table).to_owned())
            .await
    }
}
