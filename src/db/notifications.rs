use sea_orm::*;
use uuid::Uuid;

use crate::models::notifications::{self, CreateNotification};

/// Insert a notification. Generic so it can run inside a transaction.
pub async fn create<C: ConnectionTrait>(
    conn: &C,
    input: CreateNotification,
) -> Result<notifications::Model, DbErr> {
    notifications::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(input.user_id),
        title: Set(input.title),
        message: Set(input.message),
        kind: Set(input.kind.to_string()),
        link: Set(input.link),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(conn)
    .await
}

/// Newest first.
pub async fn list_for_user(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Vec<notifications::Model>, DbErr> {
    notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .order_by_desc(notifications::Column::CreatedAt)
        .all(db)
        .await
}

/// Mark one of the user's notifications as read.
pub async fn mark_read(
    db: &DatabaseConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<notifications::Model, DbErr> {
    let notification = notifications::Entity::find_by_id(id)
        .filter(notifications::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(DbErr::RecordNotFound("Notification not found".to_string()))?;

    if notification.is_read {
        return Ok(notification);
    }

    let mut active: notifications::ActiveModel = notification.into();
    active.is_read = Set(true);
    active.update(db).await
}

/// Title and link for a live session request.
pub fn live_request_link(session_type: &str, session_id: &str) -> String {
    if session_type == "chat" {
        format!("/chat/{session_id}")
    } else {
        format!("/live/{session_id}?mode={session_type}")
    }
}

pub fn live_request_title(session_type: &str) -> String {
    let mut chars = session_type.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("Incoming {capitalized} Request")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_requests_link_to_chat_page() {
        assert_eq!(live_request_link("chat", "abc"), "/chat/abc");
        assert_eq!(live_request_link("video", "abc"), "/live/abc?mode=video");
    }

    #[test]
    fn title_capitalizes_session_type() {
        assert_eq!(live_request_title("video"), "Incoming Video Request");
        assert_eq!(live_request_title("audio"), "Incoming Audio Request");
    }
}
