use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::authorization::require_role;
use crate::auth::middleware::AuthenticatedUser;
use crate::config::AppConfig;
use crate::db::payments::{self as payment_db, Verification};
use crate::db::withdrawals as withdrawal_db;
use crate::errors::ApiError;
use crate::gateway::{GatewayError, PaymentGateway};
use crate::models::payments::{InitializePayment, PaymentCallback};
use crate::models::users::Roles;
use crate::models::withdrawals::RequestWithdrawal;

/// POST /api/auth/payment/initialize/
pub async fn initialize_payment(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
    config: web::Data<AppConfig>,
    body: web::Json<InitializePayment>,
) -> Result<HttpResponse, ApiError> {
    let checkout = payment_db::initialize(
        db.get_ref(),
        gateway.get_ref().as_ref(),
        &config.frontend_url,
        &user.0,
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(checkout))
}

/// GET /api/auth/payment/verify/{tx_ref}/
pub async fn verify_payment(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tx_ref = path.into_inner();
    match payment_db::verify(db.get_ref(), gateway.get_ref().as_ref(), &tx_ref).await? {
        Verification::Confirmed(data) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "data": data,
        }))),
        Verification::Failed(message) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "status": "failed",
            "message": message,
        }))),
    }
}

/// POST /api/auth/payment/callback/{tx_ref}/
///
/// Gateway webhook, no auth.
pub async fn payment_callback(
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
    body: Option<web::Json<PaymentCallback>>,
) -> Result<HttpResponse, ApiError> {
    let status = body.and_then(|b| b.into_inner().status);
    payment_db::callback(db.get_ref(), &path.into_inner(), status.as_deref()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "received" })))
}

/// GET /api/auth/payment/history/
pub async fn payment_history(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    match payment_db::history(db.get_ref(), &user.0).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch payments: {e}"),
        })),
    }
}

/// POST /api/auth/payout/withdraw/
pub async fn request_withdrawal(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
    body: web::Json<RequestWithdrawal>,
) -> Result<HttpResponse, ApiError> {
    require_role(&user.0, Roles::Professional, "Only professionals can request withdrawals")?;
    let request = withdrawal_db::validate_request(&user.0, body.into_inner())?;

    let data =
        withdrawal_db::request_withdrawal(db.get_ref(), gateway.get_ref().as_ref(), &user.0, request)
            .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "Withdrawal initiated successfully",
        "data": data,
    })))
}

/// GET /api/auth/payout/earnings/
pub async fn earnings(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    require_role(
        &user.0,
        Roles::Professional,
        "Only professionals can access dynamic earnings details.",
    )?;
    let earnings = withdrawal_db::earnings(db.get_ref(), &user.0).await?;
    Ok(HttpResponse::Ok().json(earnings))
}

/// GET /api/auth/payout/banks/
///
/// Cached by the gateway client for an hour.
pub async fn banks(
    _user: AuthenticatedUser,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
) -> impl Responder {
    match gateway.banks().await {
        Ok(banks) => HttpResponse::Ok().json(banks),
        Err(GatewayError::MissingKey) => HttpResponse::InternalServerError().json(
            serde_json::json!({ "error": "Chapa key missing" }),
        ),
        Err(e) => {
            tracing::error!("bank list request failed: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.to_string(),
            }))
        }
    }
}
