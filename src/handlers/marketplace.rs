use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::authorization::require_role;
use crate::auth::middleware::AuthenticatedUser;
use crate::db::marketplace as marketplace_db;
use crate::errors::ApiError;
use crate::handlers::messaging::push_notification;
use crate::models::service_proposals::{CreateProposal, ProposalActionBody};
use crate::models::service_requests::CreateServiceRequest;
use crate::models::users::Roles;
use crate::realtime::RealtimeHub;

/// GET /api/auth/service-requests/
pub async fn get_service_requests(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    match marketplace_db::list_requests(db.get_ref(), &user.0).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch service requests: {e}"),
        })),
    }
}

/// POST /api/auth/service-requests/
pub async fn create_service_request(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateServiceRequest>,
) -> Result<HttpResponse, ApiError> {
    require_role(&user.0, Roles::Client, "Only clients can post service requests")?;
    let request = marketplace_db::create_request(db.get_ref(), &user.0, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(request))
}

/// POST /api/auth/service-proposals/
pub async fn create_proposal(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    hub: web::Data<Arc<RealtimeHub>>,
    body: web::Json<CreateProposal>,
) -> Result<HttpResponse, ApiError> {
    require_role(&user.0, Roles::Professional, "Only professionals can send proposals")?;
    let (proposal, notification) =
        marketplace_db::create_proposal(db.get_ref(), &user.0, body.into_inner()).await?;
    push_notification(hub.get_ref(), notification).await;
    Ok(HttpResponse::Created().json(proposal))
}

/// POST /api/auth/service-proposals/{id}/action/
pub async fn proposal_action(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    hub: web::Data<Arc<RealtimeHub>>,
    path: web::Path<Uuid>,
    body: web::Json<ProposalActionBody>,
) -> Result<HttpResponse, ApiError> {
    require_role(&user.0, Roles::Client, "Only clients can respond to proposals")?;
    let (proposal, notification) =
        marketplace_db::act_on_proposal(db.get_ref(), &user.0, path.into_inner(), body.action)
            .await?;
    push_notification(hub.get_ref(), notification).await;
    Ok(HttpResponse::Ok().json(proposal))
}
