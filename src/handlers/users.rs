use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::authorization::{require_admin, require_role};
use crate::auth::middleware::AuthenticatedUser;
use crate::cache::{CacheConfig, RedisCache, keys};
use crate::config::AppConfig;
use crate::db::{profiles, users as user_db};
use crate::errors::ApiError;
use crate::handlers::auth::prepare_update;
use crate::models::professional_profiles::OnlineStatus;
use crate::models::users::{AdminUpdateUser, PublicUser, Roles, UsersByRole};

/// GET /api/auth/users/
///
/// Every user grouped by role (admin only).
pub async fn get_users(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&user.0)?;

    let mut grouped = UsersByRole {
        clients: Vec::new(),
        professionals: Vec::new(),
        admins: Vec::new(),
    };
    for (role, bucket) in [
        (Roles::Client, &mut grouped.clients),
        (Roles::Professional, &mut grouped.professionals),
        (Roles::Admin, &mut grouped.admins),
    ] {
        let users = user_db::get_users_by_role(db.get_ref(), role).await?;
        *bucket = user_db::with_profiles(db.get_ref(), users).await?;
    }

    Ok(HttpResponse::Ok().json(grouped))
}

/// PATCH /api/auth/users/
///
/// Partial update of any user (admin only).
pub async fn patch_user(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<Arc<RedisCache>>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&user.0)?;

    if body.get("id").is_none_or(|v| v.is_null()) {
        return Err(ApiError::bad_request("User ID is required"));
    }
    let AdminUpdateUser { id, changes } = serde_json::from_value(body.into_inner())
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let target = user_db::get_user_by_id(db.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let password_hash = prepare_update(db.get_ref(), &target, &changes).await?;
    let updated = user_db::update_user(db.get_ref(), target, changes, password_hash).await?;
    cache.invalidate_user(id).await;

    tracing::info!(admin_id = %user.0.id, user_id = %id, "user updated by admin");
    Ok(HttpResponse::Ok().json(updated))
}

/// GET /api/auth/professionals/
pub async fn get_professionals(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    match user_db::list_professionals(db.get_ref(), &user.0).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch professionals: {e}"),
        })),
    }
}

/// GET /api/auth/clients/
pub async fn get_clients(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    match user_db::list_clients(db.get_ref(), &user.0).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch clients: {e}"),
        })),
    }
}

/// GET /api/auth/users/detail/{id}/
///
/// Public card, served from cache when possible.
pub async fn get_user_detail(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<Arc<RedisCache>>,
    cache_config: web::Data<CacheConfig>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let id = path.into_inner();
    let cache_key = keys::public_user(&id.to_string());

    match cache.get::<PublicUser>(&cache_key).await {
        Ok(Some(cached)) => return HttpResponse::Ok().json(cached),
        Ok(None) => {}
        Err(e) => tracing::warn!("Cache error: {}", e),
    }

    match user_db::get_public_user(db.get_ref(), id).await {
        Ok(Some(card)) => {
            if let Err(e) = cache
                .set(&cache_key, &card, Some(cache_config.public_user_ttl))
                .await
            {
                tracing::warn!("Cache error: {}", e);
            }
            HttpResponse::Ok().json(card)
        }
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "User not found",
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        })),
    }
}

/// POST /api/auth/status/online/
pub async fn set_online_status(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<OnlineStatus>,
) -> Result<HttpResponse, ApiError> {
    require_role(&user.0, Roles::Professional, "Only professionals can set online status")?;
    let is_online = body
        .is_online
        .ok_or_else(|| ApiError::bad_request("is_online field is required"))?;

    profiles::set_online(db.get_ref(), &user.0, is_online).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "is_online": is_online,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ZegoQuery {
    pub room_id: Option<String>,
}

/// GET /api/auth/zego-token/?room_id=
///
/// The video app id, never the secret.
pub async fn zego_token(
    _user: AuthenticatedUser,
    config: web::Data<AppConfig>,
    query: web::Query<ZegoQuery>,
) -> impl Responder {
    if query.room_id.as_deref().is_none_or(|r| r.trim().is_empty()) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "room_id required",
        }));
    }
    HttpResponse::Ok().json(serde_json::json!({
        "app_id": config.zego_app_id,
    }))
}
