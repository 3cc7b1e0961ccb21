use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Appointments {
    Table,
    ClientId,
    ProfessionalId,
    Status,
}

#[derive(DeriveIden)]
enum Connections {
    Table,
    ClientId,
    ProfessionalId,
}

#[derive(DeriveIden)]
enum ServiceProposals {
    Table,
    RequestId,
    ProfessionalId,
}

#[derive(DeriveIden)]
enum DirectMessages {
    Table,
    SenderId,
    ReceiverId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ChatMessages {
    Table,
    SessionId,
    Timestamp,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One connection per (client, professional)
        manager
            .create_index(
                Index::create()
                    .name("uq_connections_pair")
                    .table(Connections::Table)
                    .col(Connections::ClientId)
                    .col(Connections::ProfessionalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // One proposal per (request, professional)
        manager
            .create_index(
                Index::create()
                    .name("uq_service_proposals_pair")
                    .table(ServiceProposals::Table)
                    .col(ServiceProposals::RequestId)
                    .col(ServiceProposals::ProfessionalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Active-appointment lookups and the cleanup scan
        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_pair_status")
                    .table(Appointments::Table)
                    .col(Appointments::ClientId)
                    .col(Appointments::ProfessionalId)
                    .col(Appointments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_direct_messages_pair_created")
                    .table(DirectMessages::Table)
                    .col(DirectMessages::SenderId)
                    .col(DirectMessages::ReceiverId)
                    .col(DirectMessages::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_user_created")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chat_messages_session_ts")
                    .table(ChatMessages::Table)
                    .col(ChatMessages::SessionId)
                    .col(ChatMessages::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            ("idx_chat_messages_session_ts", ChatMessages::Table.into_iden()),
            ("idx_notifications_user_created", Notifications::Table.into_iden()),
            ("idx_direct_messages_pair_created", DirectMessages::Table.into_iden()),
            ("idx_appointments_pair_status", Appointments::Table.into_iden()),
            ("uq_service_proposals_pair", ServiceProposals::Table.into_iden()),
            ("uq_connections_pair", Connections::Table.into_iden()),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}
