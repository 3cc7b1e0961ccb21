use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::authorization::require_admin;
use crate::auth::middleware::AuthenticatedUser;
use crate::cache::RedisCache;
use crate::db::verification as verification_db;
use crate::errors::ApiError;
use crate::handlers::messaging::push_notification;
use crate::models::professional_profiles::{ReviewVerification, VerificationQuery};
use crate::realtime::RealtimeHub;

/// GET /api/auth/admin/professionals/?status=pending
pub async fn get_professionals(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    query: web::Query<VerificationQuery>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&user.0)?;
    let list = verification_db::list_professionals(db.get_ref(), query.status).await?;
    Ok(HttpResponse::Ok().json(list))
}

/// POST /api/auth/admin/professionals/{id}/verification/
pub async fn review_verification(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<Arc<RedisCache>>,
    hub: web::Data<Arc<RealtimeHub>>,
    path: web::Path<Uuid>,
    body: web::Json<ReviewVerification>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&user.0)?;
    let professional_id = path.into_inner();

    let (updated, notification) =
        verification_db::review(db.get_ref(), professional_id, body.into_inner()).await?;
    cache.invalidate_user(professional_id).await;
    push_notification(hub.get_ref(), notification).await;

    Ok(HttpResponse::Ok().json(updated))
}
