use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ChatSessions {
    Table,
    Id,
    UserId,
    Title,
    IsPinned,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ChatMessages {
    Table,
    Id,
    SessionId,
    Role,
    Content,
    Timestamp,
}

#[derive(DeriveIden)]
enum Appointments {
    Table,
    Id,
    ClientId,
    ProfessionalId,
    Date,
    Time,
    Status,
    SessionType,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Connections {
    Table,
    Id,
    ClientId,
    ProfessionalId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Title,
    Message,
    Kind,
    Link,
    IsRead,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DirectMessages {
    Table,
    Id,
    SenderId,
    ReceiverId,
    Content,
    IsRead,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MoodUpdates {
    Table,
    Id,
    UserId,
    MoodScore,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum JournalEntries {
    Table,
    Id,
    ProfessionalId,
    ClientId,
    Title,
    Content,
    MediaFile,
    EntryType,
    CreatedAt,
    UpdatedAt,
}

/// Foreign key from `table.col` to `users.id`.
fn user_fk<T, C>(name: &str, table: T, col: C, on_delete: ForeignKeyAction) -> ForeignKeyCreateStatement
where
    T: IntoIden,
    C: IntoIden,
{
    ForeignKey::create()
        .name(name)
        .from(table, col)
        .to(Users::Table, Users::Id)
        .on_delete(on_delete)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

fn created_at<C: IntoIden>(col: C) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChatSessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ChatSessions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ChatSessions::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ChatSessions::Title)
                            .string()
                            .not_null()
                            .default("New Chat"),
                    )
                    .col(
                        ColumnDef::new(ChatSessions::IsPinned)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(created_at(ChatSessions::CreatedAt))
                    .col(created_at(ChatSessions::UpdatedAt))
                    .foreign_key(&mut user_fk(
                        "fk_chat_sessions_user_id",
                        ChatSessions::Table,
                        ChatSessions::UserId,
                        ForeignKeyAction::Cascade,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChatMessages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ChatMessages::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ChatMessages::SessionId).uuid().not_null())
                    .col(ColumnDef::new(ChatMessages::Role).string().not_null())
                    .col(ColumnDef::new(ChatMessages::Content).text().not_null())
                    .col(created_at(ChatMessages::Timestamp))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_messages_session_id")
                            .from(ChatMessages::Table, ChatMessages::SessionId)
                            .to(ChatSessions::Table, ChatSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Appointments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Appointments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Appointments::ClientId).uuid().not_null())
                    .col(ColumnDef::new(Appointments::ProfessionalId).uuid().not_null())
                    .col(ColumnDef::new(Appointments::Date).date().not_null())
                    .col(ColumnDef::new(Appointments::Time).time().not_null())
                    .col(
                        ColumnDef::new(Appointments::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Appointments::SessionType)
                            .string()
                            .not_null()
                            .default("video"),
                    )
                    .col(ColumnDef::new(Appointments::Notes).text().null())
                    .col(created_at(Appointments::CreatedAt))
                    .foreign_key(&mut user_fk(
                        "fk_appointments_client_id",
                        Appointments::Table,
                        Appointments::ClientId,
                        ForeignKeyAction::Cascade,
                    ))
                    .foreign_key(&mut user_fk(
                        "fk_appointments_professional_id",
                        Appointments::Table,
                        Appointments::ProfessionalId,
                        ForeignKeyAction::Cascade,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Connections::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Connections::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Connections::ClientId).uuid().not_null())
                    .col(ColumnDef::new(Connections::ProfessionalId).uuid().not_null())
                    .col(
                        ColumnDef::new(Connections::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(created_at(Connections::CreatedAt))
                    .col(created_at(Connections::UpdatedAt))
                    .foreign_key(&mut user_fk(
                        "fk_connections_client_id",
                        Connections::Table,
                        Connections::ClientId,
                        ForeignKeyAction::Cascade,
                    ))
                    .foreign_key(&mut user_fk(
                        "fk_connections_professional_id",
                        Connections::Table,
                        Connections::ProfessionalId,
                        ForeignKeyAction::Cascade,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Notifications::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Notifications::UserId).uuid().not_null())
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(
                        ColumnDef::new(Notifications::Kind)
                            .string()
                            .not_null()
                            .default("general"),
                    )
                    .col(ColumnDef::new(Notifications::Link).string().null())
                    .col(
                        ColumnDef::new(Notifications::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(created_at(Notifications::CreatedAt))
                    .foreign_key(&mut user_fk(
                        "fk_notifications_user_id",
                        Notifications::Table,
                        Notifications::UserId,
                        ForeignKeyAction::Cascade,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DirectMessages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DirectMessages::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DirectMessages::SenderId).uuid().not_null())
                    .col(ColumnDef::new(DirectMessages::ReceiverId).uuid().not_null())
                    .col(ColumnDef::new(DirectMessages::Content).text().not_null())
                    .col(
                        ColumnDef::new(DirectMessages::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(created_at(DirectMessages::CreatedAt))
                    .foreign_key(&mut user_fk(
                        "fk_direct_messages_sender_id",
                        DirectMessages::Table,
                        DirectMessages::SenderId,
                        ForeignKeyAction::Cascade,
                    ))
                    .foreign_key(&mut user_fk(
                        "fk_direct_messages_receiver_id",
                        DirectMessages::Table,
                        DirectMessages::ReceiverId,
                        ForeignKeyAction::Cascade,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MoodUpdates::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MoodUpdates::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(MoodUpdates::UserId).uuid().not_null())
                    .col(ColumnDef::new(MoodUpdates::MoodScore).integer().not_null())
                    .col(ColumnDef::new(MoodUpdates::Note).text().null())
                    .col(created_at(MoodUpdates::CreatedAt))
                    .foreign_key(&mut user_fk(
                        "fk_mood_updates_user_id",
                        MoodUpdates::Table,
                        MoodUpdates::UserId,
                        ForeignKeyAction::Cascade,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JournalEntries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(JournalEntries::ProfessionalId).uuid().not_null())
                    .col(ColumnDef::new(JournalEntries::ClientId).uuid().null())
                    .col(ColumnDef::new(JournalEntries::Title).string().null())
                    .col(ColumnDef::new(JournalEntries::Content).text().null())
                    .col(ColumnDef::new(JournalEntries::MediaFile).string().null())
                    .col(
                        ColumnDef::new(JournalEntries::EntryType)
                            .string()
                            .not_null()
                            .default("text"),
                    )
                    .col(created_at(JournalEntries::CreatedAt))
                    .col(created_at(JournalEntries::UpdatedAt))
                    .foreign_key(&mut user_fk(
                        "fk_journal_entries_professional_id",
                        JournalEntries::Table,
                        JournalEntries::ProfessionalId,
                        ForeignKeyAction::Cascade,
                    ))
                    .foreign_key(&mut user_fk(
                        "fk_journal_entries_client_id",
                        JournalEntries::Table,
                        JournalEntries::ClientId,
                        ForeignKeyAction::SetNull,
                    ))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            JournalEntries::Table.into_iden(),
            MoodUpdates::Table.into_iden(),
            DirectMessages::Table.into_iden(),
            Notifications::Table.into_iden(),
            Connections::Table.into_iden(),
            Appointments::Table.into_iden(),
            ChatMessages::Table.into_iden(),
            ChatSessions::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}
