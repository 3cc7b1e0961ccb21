use rust_decimal::Decimal;
use sea_orm::prelude::Expr;
use sea_orm::*;
use serde_json::Value;
use uuid::Uuid;

use crate::db::profiles;
use crate::errors::ApiError;
use crate::gateway::{PaymentGateway, TransferRequest, payout_succeeded};
use crate::models::payments::{DEFAULT_CURRENCY, parse_amount};
use crate::models::professional_profiles::{self, Earnings};
use crate::models::users;
use crate::models::withdrawals::{self, NewWithdrawal, RequestWithdrawal, WithdrawalStatus};

const UNKNOWN_BANK: &str = "Unknown Bank";

/// Check the request body and fill in defaults from the user.
pub fn validate_request(
    user: &users::Model,
    input: RequestWithdrawal,
) -> Result<NewWithdrawal, ApiError> {
    let bank_code = input.bank_code.filter(|v| !v.trim().is_empty());
    let account_number = input.account_number.filter(|v| !v.trim().is_empty());
    let (Some(raw_amount), Some(bank_code), Some(account_number)) =
        (input.amount, bank_code, account_number)
    else {
        return Err(ApiError::bad_request(
            "Amount, bank_code, and account_number are required",
        ));
    };

    let amount =
        parse_amount(&raw_amount).ok_or_else(|| ApiError::bad_request("Invalid amount format"))?;
    if amount <= Decimal::ZERO {
        return Err(ApiError::bad_request("Amount must be greater than zero"));
    }

    let account_name = input
        .account_name
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| format!("{} {}", user.first_name, user.last_name).trim().to_string());

    Ok(NewWithdrawal {
        amount,
        bank_code,
        account_number,
        account_name,
        bank_name: Some(
            input
                .bank_name
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_BANK.to_string()),
        ),
    })
}

pub fn new_reference() -> String {
    format!("wd-{}", Uuid::new_v4())
}

async fn professional_profile(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<professional_profiles::Model, DbErr> {
    profiles::get_professional_profile(db, user_id)
        .await?
        .ok_or(DbErr::RecordNotFound(
            "Professional profile not found".to_string(),
        ))
}

async fn set_status(
    conn: &impl ConnectionTrait,
    withdrawal: withdrawals::Model,
    status: WithdrawalStatus,
) -> Result<withdrawals::Model, DbErr> {
    let mut active: withdrawals::ActiveModel = withdrawal.into();
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now());
    active.update(conn).await
}

/// Pay out part of a professional's balance. On gateway success the balance
/// is debited in place and the withdrawal approved; the gateway's data is
/// returned.
///
/// The balance check is not done under a row lock.
pub async fn request_withdrawal(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    user: &users::Model,
    input: NewWithdrawal,
) -> Result<Value, ApiError> {
    let profile = professional_profile(db, user.id).await?;
    if profile.balance < input.amount {
        return Err(ApiError::bad_request(format!(
            "Insufficient balance. Current balance: {}",
            profile.balance
        )));
    }

    let reference = new_reference();
    let now = chrono::Utc::now();
    let withdrawal = withdrawals::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        amount: Set(input.amount),
        currency: Set(DEFAULT_CURRENCY.to_string()),
        bank_name: Set(input.bank_name.clone()),
        bank_code: Set(input.bank_code.clone()),
        account_number: Set(input.account_number.clone()),
        account_name: Set(input.account_name.clone()),
        reference: Set(reference.clone()),
        status: Set(WithdrawalStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    let transfer = TransferRequest {
        account_name: input.account_name,
        account_number: input.account_number,
        amount: input.amount,
        currency: DEFAULT_CURRENCY.to_string(),
        reference: reference.clone(),
        bank_code: input.bank_code,
    };

    let reply = gateway.transfer(&transfer).await.map_err(|e| {
        tracing::error!(%reference, error = %e, "payout request failed");
        ApiError::internal(format!("Exception during payout: {e}"))
    })?;

    if !payout_succeeded(&reply) {
        set_status(db, withdrawal, WithdrawalStatus::Failed).await?;
        tracing::warn!(%reference, message = %reply.message_text(), "payout rejected");
        return Err(ApiError::Gateway(format!(
            "Chapa Payout Error: {}",
            reply.message_text()
        )));
    }

    let txn = db.begin().await?;
    professional_profiles::Entity::update_many()
        .col_expr(
            professional_profiles::Column::Balance,
            Expr::col(professional_profiles::Column::Balance).sub(input.amount),
        )
        .filter(professional_profiles::Column::Id.eq(profile.id))
        .exec(&txn)
        .await?;
    set_status(&txn, withdrawal, WithdrawalStatus::Approved).await?;
    txn.commit().await?;

    tracing::info!(%reference, user_id = %user.id, amount = %input.amount, "payout approved");
    Ok(reply.data)
}

/// Balance, lifetime earnings and withdrawals newest first.
pub async fn earnings(db: &DatabaseConnection, user: &users::Model) -> Result<Earnings, DbErr> {
    let profile = professional_profile(db, user.id).await?;
    let withdrawals = withdrawals::Entity::find()
        .filter(withdrawals::Column::UserId.eq(user.id))
        .order_by_desc(withdrawals::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(Earnings {
        available_balance: profile.balance,
        total_earnings: profile.total_earnings,
        withdrawals,
    })
}
