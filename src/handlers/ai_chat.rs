use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::assistant::Assistant;
use crate::auth::middleware::AuthenticatedUser;
use crate::db::chat as chat_db;
use crate::errors::ApiError;
use crate::models::chat_sessions::{AiChatRequest, UpdateChatSession};

/// POST /api/auth/ai-chat/
pub async fn ai_chat(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    assistant: web::Data<Arc<dyn Assistant>>,
    body: web::Json<AiChatRequest>,
) -> Result<HttpResponse, ApiError> {
    let AiChatRequest {
        message,
        session_id,
    } = body.into_inner();
    let message = message.unwrap_or_default();

    let resp = chat_db::ai_chat(
        db.get_ref(),
        assistant.get_ref().as_ref(),
        user.0.id,
        session_id,
        &message,
    )
    .await?;
    Ok(HttpResponse::Ok().json(resp))
}

/// GET /api/auth/chat-sessions/
pub async fn get_sessions(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    match chat_db::list_sessions(db.get_ref(), user.0.id).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch chat sessions: {e}"),
        })),
    }
}

/// GET /api/auth/chat-sessions/{id}/
pub async fn get_session(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let session = chat_db::get_own_session(db.get_ref(), user.0.id, path.into_inner()).await?;
    let full = chat_db::session_with_messages(db.get_ref(), session).await?;
    Ok(HttpResponse::Ok().json(full))
}

/// PUT/PATCH /api/auth/chat-sessions/{id}/
pub async fn update_session(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateChatSession>,
) -> Result<HttpResponse, ApiError> {
    let session = chat_db::get_own_session(db.get_ref(), user.0.id, path.into_inner()).await?;
    let updated = chat_db::update_session(db.get_ref(), session, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/auth/chat-sessions/{id}/
pub async fn delete_session(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let session = chat_db::get_own_session(db.get_ref(), user.0.id, path.into_inner()).await?;
    chat_db::delete_session(db.get_ref(), session.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
