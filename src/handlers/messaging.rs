use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::db::{direct_messages as message_db, notifications as notification_db, users as user_db};
use crate::errors::ApiError;
use crate::models::direct_messages::{ConversationQuery, SendDirectMessage};
use crate::models::notifications::{self, CreateNotification, InitiateLiveSession, KIND_LIVE_REQUEST};
use crate::realtime::RealtimeHub;
use crate::realtime::protocol::ServerMessage;

/// Push a stored notification to the user's open sockets.
pub(crate) async fn push_notification(hub: &RealtimeHub, notification: notifications::Model) {
    let user_id = notification.user_id;
    hub.send_to_user(user_id, ServerMessage::Notification { notification })
        .await;
}

/// GET /api/auth/notifications/
pub async fn get_notifications(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    match notification_db::list_for_user(db.get_ref(), user.0.id).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch notifications: {e}"),
        })),
    }
}

/// POST /api/auth/notifications/{id}/read/
pub async fn mark_notification_read(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    notification_db::mark_read(db.get_ref(), user.0.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "marked as read" })))
}

/// GET /api/auth/messages/?user_id=
pub async fn get_conversation(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    query: web::Query<ConversationQuery>,
) -> impl Responder {
    let Some(other) = query.user_id else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "user_id param required",
        }));
    };
    match message_db::conversation(db.get_ref(), user.0.id, other).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch messages: {e}"),
        })),
    }
}

/// POST /api/auth/messages/
///
/// Stored, then pushed to the receiver live.
pub async fn send_message(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    hub: web::Data<Arc<RealtimeHub>>,
    body: web::Json<SendDirectMessage>,
) -> Result<HttpResponse, ApiError> {
    let SendDirectMessage { receiver, content } = body.into_inner();
    let (Some(receiver), Some(content)) = (receiver, content) else {
        return Err(ApiError::bad_request("receiver and content required"));
    };

    let message = message_db::send(db.get_ref(), &user.0, receiver, &content).await?;
    hub.send_to_user(
        receiver,
        ServerMessage::NewMessage {
            message: message.clone(),
        },
    )
    .await;

    Ok(HttpResponse::Created().json(message))
}

/// POST /api/auth/live/initiate/
///
/// Ask a verified professional to join a session.
pub async fn initiate_live_session(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    hub: web::Data<Arc<RealtimeHub>>,
    body: web::Json<InitiateLiveSession>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();
    let (professional, _) = user_db::get_verified_professional(db.get_ref(), input.professional_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Professional not found"))?;

    let session_type = input.session_type.trim().to_lowercase();
    let notification = notification_db::create(
        db.get_ref(),
        CreateNotification {
            user_id: professional.id,
            title: notification_db::live_request_title(&session_type),
            message: format!(
                "{} wants to connect with you via {session_type}.",
                user.0.display_name()
            ),
            kind: KIND_LIVE_REQUEST,
            link: Some(notification_db::live_request_link(&session_type, &input.session_id)),
        },
    )
    .await?;
    push_notification(hub.get_ref(), notification).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "success" })))
}
