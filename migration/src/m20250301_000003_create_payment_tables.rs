use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    UserId,
    Amount,
    Currency,
    Email,
    TxRef,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Withdrawals {
    Table,
    Id,
    UserId,
    Amount,
    Currency,
    BankName,
    BankCode,
    AccountNumber,
    AccountName,
    Reference,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Payments::UserId).uuid().not_null())
                    .col(ColumnDef::new(Payments::Amount).decimal_len(10, 2).not_null())
                    .col(
                        ColumnDef::new(Payments::Currency)
                            .string_len(10)
                            .not_null()
                            .default("ETB"),
                    )
                    .col(ColumnDef::new(Payments::Email).string().not_null())
                    .col(ColumnDef::new(Payments::TxRef).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(Payments::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_user_id")
                            .from(Payments::Table, Payments::UserId)
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
                    .table(Withdrawals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Withdrawals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Withdrawals::UserId).uuid().not_null())
                    .col(ColumnDef::new(Withdrawals::Amount).decimal_len(10, 2).not_null())
                    .col(
                        ColumnDef::new(Withdrawals::Currency)
                            .string_len(10)
                            .not_null()
                            .default("ETB"),
                    )
                    .col(ColumnDef::new(Withdrawals::BankName).string().null())
                    .col(ColumnDef::new(Withdrawals::BankCode).string().not_null())
                    .col(ColumnDef::new(Withdrawals::AccountNumber).string().not_null())
                    .col(ColumnDef::new(Withdrawals::AccountName).string().not_null())
                    .col(
                        ColumnDef::new(Withdrawals::Reference)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_withdrawals_user_id")
                            .from(Withdrawals::Table, Withdrawals::UserId)
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
            .drop_table(Table::drop().table(Withdrawals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}
