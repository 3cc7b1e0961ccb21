use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    Role,
    IsActive,
    DateJoined,
    UpdatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum ClientProfiles {
    Table,
    Id,
    UserId,
    Phone,
    Dob,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProfessionalProfiles {
    Table,
    Id,
    UserId,
    Phone,
    Dob,
    Specialization,
    Bio,
    Location,
    Languages,
    IdType,
    IdNumber,
    IssuingAuthority,
    ProfilePhoto,
    IdImage,
    IdImageBack,
    Certificates,
    HasDocuments,
    Rating,
    ReviewCount,
    SessionsCompleted,
    IsOnline,
    VerificationStatus,
    RejectionReasonType,
    RejectionReason,
    Verified,
    Balance,
    TotalEarnings,
}

#[derive(DeriveIden, Clone, Copy)]
enum AdminProfiles {
    Table,
    Id,
    UserId,
    Department,
}

/// `user_id` column plus its cascading foreign key, shared by every profile table.
fn owned_by_user<T: IntoIden + Copy + 'static>(
    table: &mut TableCreateStatement,
    table_iden: T,
    user_col: T,
    fk_name: &str,
) {
    table
        .col(ColumnDef::new(user_col).uuid().not_null().unique_key())
        .foreign_key(
            ForeignKey::create()
                .name(fk_name)
                .from(table_iden, user_col)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade),
        );
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::FirstName).string().not_null().default(""))
                    .col(ColumnDef::new(Users::LastName).string().not_null().default(""))
                    .col(ColumnDef::new(Users::Role).string().not_null().default("client"))
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Users::DateJoined)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        let mut clients = Table::create()
            .table(ClientProfiles::Table)
            .if_not_exists()
            .col(ColumnDef::new(ClientProfiles::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(ClientProfiles::Phone).string().null())
            .col(ColumnDef::new(ClientProfiles::Dob).date().null())
            .to_owned();
        owned_by_user(
            &mut clients,
            ClientProfiles::Table,
            ClientProfiles::UserId,
            "fk_client_profiles_user_id",
        );
        manager.create_table(clients).await?;

        let mut professionals = Table::create()
            .table(ProfessionalProfiles::Table)
            .if_not_exists()
            .col(ColumnDef::new(ProfessionalProfiles::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(ProfessionalProfiles::Phone).string().null())
            .col(ColumnDef::new(ProfessionalProfiles::Dob).date().null())
            .col(ColumnDef::new(ProfessionalProfiles::Specialization).string().null())
            .col(ColumnDef::new(ProfessionalProfiles::Bio).text().null())
            .col(
                ColumnDef::new(ProfessionalProfiles::Location)
                    .string()
                    .not_null()
                    .default("Global"),
            )
            .col(
                ColumnDef::new(ProfessionalProfiles::Languages)
                    .string()
                    .not_null()
                    .default("English"),
            )
            .col(ColumnDef::new(ProfessionalProfiles::IdType).string().null())
            .col(ColumnDef::new(ProfessionalProfiles::IdNumber).string().null())
            .col(ColumnDef::new(ProfessionalProfiles::IssuingAuthority).string().null())
            .col(ColumnDef::new(ProfessionalProfiles::ProfilePhoto).string().null())
            .col(ColumnDef::new(ProfessionalProfiles::IdImage).string().null())
            .col(ColumnDef::new(ProfessionalProfiles::IdImageBack).string().null())
            .col(ColumnDef::new(ProfessionalProfiles::Certificates).string().null())
            .col(
                ColumnDef::new(ProfessionalProfiles::HasDocuments)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(ProfessionalProfiles::Rating)
                    .decimal_len(3, 2)
                    .not_null()
                    .default(5.0),
            )
            .col(
                ColumnDef::new(ProfessionalProfiles::ReviewCount)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(ProfessionalProfiles::SessionsCompleted)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(ProfessionalProfiles::IsOnline)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(ProfessionalProfiles::VerificationStatus)
                    .string()
                    .not_null()
                    .default("pending"),
            )
            .col(ColumnDef::new(ProfessionalProfiles::RejectionReasonType).string().null())
            .col(ColumnDef::new(ProfessionalProfiles::RejectionReason).text().null())
            .col(
                ColumnDef::new(ProfessionalProfiles::Verified)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(ProfessionalProfiles::Balance)
                    .decimal_len(10, 2)
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(ProfessionalProfiles::TotalEarnings)
                    .decimal_len(10, 2)
                    .not_null()
                    .default(0),
            )
            .to_owned();
        owned_by_user(
            &mut professionals,
            ProfessionalProfiles::Table,
            ProfessionalProfiles::UserId,
            "fk_professional_profiles_user_id",
        );
        manager.create_table(professionals).await?;

        let mut admins = Table::create()
            .table(AdminProfiles::Table)
            .if_not_exists()
            .col(ColumnDef::new(AdminProfiles::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(AdminProfiles::Department).string().null())
            .to_owned();
        owned_by_user(
            &mut admins,
            AdminProfiles::Table,
            AdminProfiles::UserId,
            "fk_admin_profiles_user_id",
        );
        manager.create_table(admins).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminProfiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProfessionalProfiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClientProfiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}
