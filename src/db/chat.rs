use sea_orm::*;
use uuid::Uuid;

use crate::assistant::{self, Assistant, HISTORY_LIMIT};
use crate::errors::ApiError;
use crate::models::chat_messages::{self, ChatRole};
use crate::models::chat_sessions::{
    self, AiChatResponse, SessionWithMessages, UpdateChatSession,
};

/// Pinned sessions first, then most recently active.
pub async fn list_sessions(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Vec<chat_sessions::Model>, DbErr> {
    chat_sessions::Entity::find()
        .filter(chat_sessions::Column::UserId.eq(user_id))
        .order_by_desc(chat_sessions::Column::IsPinned)
        .order_by_desc(chat_sessions::Column::UpdatedAt)
        .all(db)
        .await
}

pub async fn get_own_session(
    db: &DatabaseConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<chat_sessions::Model, DbErr> {
    chat_sessions::Entity::find_by_id(id)
        .filter(chat_sessions::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(DbErr::RecordNotFound("Session not found".to_string()))
}

pub async fn session_with_messages(
    db: &DatabaseConnection,
    session: chat_sessions::Model,
) -> Result<SessionWithMessages, DbErr> {
    let messages = chat_messages::Entity::find()
        .filter(chat_messages::Column::SessionId.eq(session.id))
        .order_by_asc(chat_messages::Column::Timestamp)
        .all(db)
        .await?;
    Ok(SessionWithMessages { session, messages })
}

pub async fn update_session(
    db: &DatabaseConnection,
    session: chat_sessions::Model,
    input: UpdateChatSession,
) -> Result<chat_sessions::Model, DbErr> {
    let mut active: chat_sessions::ActiveModel = session.into();
    if let Some(title) = input.title.filter(|t| !t.trim().is_empty()) {
        active.title = Set(title);
    }
    if let Some(pinned) = input.is_pinned {
        active.is_pinned = Set(pinned);
    }
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await
}

/// Messages go with the session.
pub async fn delete_session(db: &DatabaseConnection, id: Uuid) -> Result<(), DbErr> {
    let txn = db.begin().await?;
    chat_messages::Entity::delete_many()
        .filter(chat_messages::Column::SessionId.eq(id))
        .exec(&txn)
        .await?;
    chat_sessions::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await
}

async fn add_message(
    db: &DatabaseConnection,
    session_id: Uuid,
    role: ChatRole,
    content: &str,
) -> Result<chat_messages::Model, DbErr> {
    chat_messages::ActiveModel {
        id: Set(Uuid::new_v4()),
        session_id: Set(session_id),
        role: Set(role),
        content: Set(content.to_string()),
        timestamp: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await
}

/// Send `message` to the assistant within a session, creating the session
/// when none is given. Both sides of the exchange are stored.
pub async fn ai_chat(
    db: &DatabaseConnection,
    assistant: &dyn Assistant,
    user_id: Uuid,
    session_id: Option<Uuid>,
    message: &str,
) -> Result<AiChatResponse, ApiError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }

    let session = match session_id {
        Some(id) => get_own_session(db, user_id, id).await?,
        None => {
            let now = chrono::Utc::now();
            chat_sessions::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                title: Set(assistant::session_title(message)),
                is_pinned: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(db)
            .await?
        }
    };

    let current = add_message(db, session.id, ChatRole::User, message).await?;

    let recent = chat_messages::Entity::find()
        .filter(chat_messages::Column::SessionId.eq(session.id))
        .filter(chat_messages::Column::Id.ne(current.id))
        .filter(chat_messages::Column::Content.ne(""))
        .order_by_desc(chat_messages::Column::Timestamp)
        .limit(HISTORY_LIMIT)
        .all(db)
        .await?;
    let history = assistant::build_history(recent);

    let reply = assistant.reply(&history, message).await.map_err(|e| {
        tracing::error!(session_id = %session.id, error = %e, "assistant request failed");
        ApiError::internal(format!("AI Service Error: {e}"))
    })?;

    add_message(db, session.id, ChatRole::Assistant, &reply).await?;

    let title = session.title.clone();
    let session_id = session.id;
    let mut active: chat_sessions::ActiveModel = session.into();
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await?;

    Ok(AiChatResponse {
        reply,
        session_id,
        title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{AssistantError, HistoryTurn};
    use async_trait::async_trait;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAssistant {
        seen: Mutex<Vec<Vec<HistoryTurn>>>,
        fail: bool,
    }

    #[async_trait]
    impl Assistant for RecordingAssistant {
        async fn reply(
            &self,
            history: &[HistoryTurn],
            _message: &str,
        ) -> Result<String, AssistantError> {
            self.seen.lock().unwrap().push(history.to_vec());
            if self.fail {
                Err(AssistantError::Request("connection refused".into()))
            } else {
                Ok("Take a deep breath.".into())
            }
        }
    }

    fn session(user_id: Uuid, title: &str) -> chat_sessions::Model {
        let now = chrono::Utc::now();
        chat_sessions::Model {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            is_pinned: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn message(session_id: Uuid, role: ChatRole, content: &str) -> chat_messages::Model {
        chat_messages::Model {
            id: Uuid::new_v4(),
            session_id,
            role,
            content: content.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = ai_chat(&db, &RecordingAssistant::default(), Uuid::new_v4(), None, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Message is required"));
    }

    #[tokio::test]
    async fn first_message_creates_titled_session() {
        let user_id = Uuid::new_v4();
        let created = session(user_id, "I can't sleep");
        let user_msg = message(created.id, ChatRole::User, "I can't sleep");
        let reply_msg = message(created.id, ChatRole::Assistant, "Take a deep breath.");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![created.clone()]])
            .append_query_results([vec![user_msg]])
            .append_query_results([Vec::<chat_messages::Model>::new()])
            .append_query_results([vec![reply_msg]])
            .append_query_results([vec![created.clone()]])
            .into_connection();

        let assistant = RecordingAssistant::default();
        let resp = ai_chat(&db, &assistant, user_id, None, "I can't sleep")
            .await
            .unwrap();

        assert_eq!(resp.reply, "Take a deep breath.");
        assert_eq!(resp.session_id, created.id);
        assert_eq!(resp.title, "I can't sleep");
        assert_eq!(assistant.seen.lock().unwrap().as_slice(), &[Vec::<HistoryTurn>::new()]);
    }

    #[tokio::test]
    async fn earlier_messages_are_sent_chronologically() {
        let user_id = Uuid::new_v4();
        let existing = session(user_id, "Work stress");
        let older = message(existing.id, ChatRole::User, "Work is hard");
        let newer = message(existing.id, ChatRole::Assistant, "Tell me more");
        let current = message(existing.id, ChatRole::User, "My boss yells");
        let reply_msg = message(existing.id, ChatRole::Assistant, "Take a deep breath.");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![current]])
            .append_query_results([vec![newer, older]])
            .append_query_results([vec![reply_msg]])
            .append_query_results([vec![existing.clone()]])
            .into_connection();

        let assistant = RecordingAssistant::default();
        ai_chat(&db, &assistant, user_id, Some(existing.id), "My boss yells")
            .await
            .unwrap();

        let seen = assistant.seen.lock().unwrap();
        let contents: Vec<&str> = seen[0].iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["Work is hard", "Tell me more"]);
    }

    #[tokio::test]
    async fn assistant_failure_maps_to_service_error() {
        let user_id = Uuid::new_v4();
        let existing = session(user_id, "Hi");
        let current = message(existing.id, ChatRole::User, "Hi");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![current]])
            .append_query_results([Vec::<chat_messages::Model>::new()])
            .into_connection();

        let assistant = RecordingAssistant {
            fail: true,
            ..Default::default()
        };
        let err = ai_chat(&db, &assistant, user_id, Some(existing.id), "Hi")
            .await
            .unwrap_err();
        assert!(
            matches!(err, ApiError::Internal(ref m) if m == "AI Service Error: connection refused")
        );
    }
}
