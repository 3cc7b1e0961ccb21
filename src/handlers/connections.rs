use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::db::connections as connection_db;
use crate::errors::ApiError;
use crate::models::connections::{CreateConnection, UpdateConnection};

/// GET /api/auth/connections/
pub async fn get_connections(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    match connection_db::list_for(db.get_ref(), &user.0).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch connections: {e}"),
        })),
    }
}

/// POST /api/auth/connections/
pub async fn create_connection(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateConnection>,
) -> Result<HttpResponse, ApiError> {
    let connection = connection_db::create(db.get_ref(), &user.0, body.into_inner()).await?;
    let mut resp = connection_db::to_responses(db.get_ref(), vec![connection]).await?;
    Ok(HttpResponse::Created().json(resp.pop()))
}

/// GET /api/auth/connections/{id}/
pub async fn get_connection(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let connection = connection_db::get_scoped(db.get_ref(), &user.0, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Connection not found"))?;
    let mut resp = connection_db::to_responses(db.get_ref(), vec![connection]).await?;
    Ok(HttpResponse::Ok().json(resp.pop()))
}

/// PUT/PATCH /api/auth/connections/{id}/
pub async fn update_connection(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateConnection>,
) -> Result<HttpResponse, ApiError> {
    let connection = connection_db::get_scoped(db.get_ref(), &user.0, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Connection not found"))?;
    let updated = connection_db::update_status(db.get_ref(), connection, body.status).await?;
    let mut resp = connection_db::to_responses(db.get_ref(), vec![updated]).await?;
    Ok(HttpResponse::Ok().json(resp.pop()))
}

/// DELETE /api/auth/connections/{id}/
pub async fn delete_connection(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let connection = connection_db::get_scoped(db.get_ref(), &user.0, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Connection not found"))?;
    connection_db::delete(db.get_ref(), connection.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
