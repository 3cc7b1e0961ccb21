use rust_decimal::Decimal;
use sea_orm::*;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::db::users as user_db;
use crate::errors::ApiError;
use crate::gateway::{
    CheckoutRequest, GatewayError, PaymentGateway, VerifyOutcome, classify_verification,
};
use crate::models::payments::{
    self, CheckoutResponse, DEFAULT_CURRENCY, InitializePayment, PaymentResponse, PaymentStatus,
    parse_amount,
};
use crate::models::users;

/// Result of polling a payment.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Confirmed(Value),
    Failed(String),
}

pub fn new_tx_ref() -> String {
    format!("soultalk-{}", Uuid::new_v4())
}

pub async fn find_by_tx_ref(
    db: &DatabaseConnection,
    tx_ref: &str,
) -> Result<payments::Model, DbErr> {
    payments::Entity::find()
        .filter(payments::Column::TxRef.eq(tx_ref))
        .one(db)
        .await?
        .ok_or(DbErr::RecordNotFound("Payment not found".to_string()))
}

async fn set_status(
    db: &DatabaseConnection,
    payment: payments::Model,
    status: PaymentStatus,
) -> Result<payments::Model, DbErr> {
    let mut active: payments::ActiveModel = payment.into();
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await
}

/// Record a pending payment and open a hosted checkout for it.
pub async fn initialize(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    frontend_url: &str,
    user: &users::Model,
    input: InitializePayment,
) -> Result<CheckoutResponse, ApiError> {
    let email = input.email.filter(|e| !e.trim().is_empty());
    let (Some(raw_amount), Some(email)) = (input.amount, email) else {
        return Err(ApiError::bad_request("Amount and email are required"));
    };
    let amount = parse_amount(&raw_amount)
        .filter(|a| *a > Decimal::ZERO)
        .ok_or_else(|| ApiError::bad_request("Invalid amount format"))?;

    let first_name = input
        .first_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| user.username.clone());
    let last_name = input
        .last_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "User".to_string());

    let tx_ref = new_tx_ref();
    let now = chrono::Utc::now();
    payments::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        amount: Set(amount),
        currency: Set(DEFAULT_CURRENCY.to_string()),
        email: Set(email.clone()),
        tx_ref: Set(tx_ref.clone()),
        status: Set(PaymentStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    let request = CheckoutRequest {
        amount,
        currency: DEFAULT_CURRENCY.to_string(),
        email,
        first_name,
        last_name,
        return_url: format!("{frontend_url}/payment/success?tx_ref={tx_ref}"),
        tx_ref: tx_ref.clone(),
    };

    let reply = gateway.initialize(&request).await.map_err(|e| match e {
        GatewayError::MissingKey => ApiError::internal(e.to_string()),
        other => ApiError::internal(format!("Chapa Exception: {other}")),
    })?;

    if !reply.is_success() {
        tracing::warn!(%tx_ref, message = %reply.message_text(), "checkout rejected");
        return Err(ApiError::Gateway(format!(
            "Chapa Payment Error: {}",
            reply.message_text()
        )));
    }

    let checkout_url = reply.data["checkout_url"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ApiError::internal("Chapa Exception: checkout_url missing"))?;

    tracing::info!(%tx_ref, user_id = %user.id, "checkout initialized");
    Ok(CheckoutResponse {
        checkout_url,
        tx_ref,
    })
}

/// Confirm a payment with the gateway. Settled payments and local setups
/// never call out.
pub async fn verify(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    tx_ref: &str,
) -> Result<Verification, ApiError> {
    let payment = find_by_tx_ref(db, tx_ref).await?;

    if payment.status == PaymentStatus::Success {
        return Ok(Verification::Confirmed(json!({
            "amount": payment.amount,
            "currency": payment.currency,
            "tx_ref": payment.tx_ref,
            "status": "success",
        })));
    }

    if gateway.is_dev_mode() {
        let payment = set_status(db, payment, PaymentStatus::Success).await?;
        tracing::info!(%tx_ref, "payment confirmed without gateway (dev mode)");
        return Ok(Verification::Confirmed(json!({
            "amount": payment.amount,
            "currency": DEFAULT_CURRENCY,
        })));
    }

    let reply = gateway.verify(tx_ref).await.map_err(|e| match e {
        GatewayError::Timeout => ApiError::GatewayTimeout(e.to_string()),
        other => ApiError::internal(other.to_string()),
    })?;

    match classify_verification(&reply) {
        VerifyOutcome::Success => {
            set_status(db, payment, PaymentStatus::Success).await?;
            Ok(Verification::Confirmed(reply.data))
        }
        VerifyOutcome::StillPending => Ok(Verification::Failed(reply.message_text())),
        VerifyOutcome::Failed => {
            set_status(db, payment, PaymentStatus::Failed).await?;
            Ok(Verification::Failed(reply.message_text()))
        }
    }
}

/// Webhook from the gateway. Only a success status changes anything.
pub async fn callback(
    db: &DatabaseConnection,
    tx_ref: &str,
    status: Option<&str>,
) -> Result<(), DbErr> {
    let payment = find_by_tx_ref(db, tx_ref).await?;
    if status == Some("success") && payment.status != PaymentStatus::Success {
        set_status(db, payment, PaymentStatus::Success).await?;
        tracing::info!(%tx_ref, "payment confirmed by callback");
    }
    Ok(())
}

/// Newest first.
pub async fn history(
    db: &DatabaseConnection,
    user: &users::Model,
) -> Result<Vec<PaymentResponse>, DbErr> {
    let rows = payments::Entity::find()
        .filter(payments::Column::UserId.eq(user.id))
        .order_by_desc(payments::Column::CreatedAt)
        .all(db)
        .await?;
    let names = user_db::users_by_ids(db, [user.id]).await?;
    Ok(rows
        .into_iter()
        .map(|p| {
            let username = names
                .get(&p.user_id)
                .map(|u| u.username.clone())
                .unwrap_or_default();
            PaymentResponse::new(p, username)
        })
        .collect())
}
