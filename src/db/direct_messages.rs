use sea_orm::*;
use uuid::Uuid;

use crate::db::users as user_db;
use crate::errors::ApiError;
use crate::models::direct_messages::{self, DirectMessageResponse};
use crate::models::users;

/// Messages exchanged between `me` and `other` in either direction, oldest first.
pub async fn conversation(
    db: &DatabaseConnection,
    me: Uuid,
    other: Uuid,
) -> Result<Vec<DirectMessageResponse>, DbErr> {
    let rows = direct_messages::Entity::find()
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(direct_messages::Column::SenderId.eq(me))
                        .add(direct_messages::Column::ReceiverId.eq(other)),
                )
                .add(
                    Condition::all()
                        .add(direct_messages::Column::SenderId.eq(other))
                        .add(direct_messages::Column::ReceiverId.eq(me)),
                ),
        )
        .order_by_asc(direct_messages::Column::CreatedAt)
        .all(db)
        .await?;

    let names = user_db::users_by_ids(db, [me, other]).await?;
    Ok(rows
        .into_iter()
        .map(|m| {
            let name = user_db::name_of(&names, m.sender_id);
            DirectMessageResponse::new(m, name)
        })
        .collect())
}

/// Store a message from `sender`. The receiver must exist.
pub async fn send(
    db: &DatabaseConnection,
    sender: &users::Model,
    receiver_id: Uuid,
    content: &str,
) -> Result<DirectMessageResponse, ApiError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::bad_request("receiver and content required"));
    }
    if user_db::get_user_by_id(db, receiver_id).await?.is_none() {
        return Err(ApiError::not_found("Receiver not found"));
    }

    let message = direct_messages::ActiveModel {
        id: Set(Uuid::new_v4()),
        sender_id: Set(sender.id),
        receiver_id: Set(receiver_id),
        content: Set(content.to_string()),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await?;

    Ok(DirectMessageResponse::new(message, sender.display_name()))
}

/// Only the receiver can mark a message read. Returns the message.
pub async fn mark_read(
    db: &DatabaseConnection,
    receiver_id: Uuid,
    message_id: Uuid,
) -> Result<direct_messages::Model, DbErr> {
    let message = direct_messages::Entity::find_by_id(message_id)
        .filter(direct_messages::Column::ReceiverId.eq(receiver_id))
        .one(db)
        .await?
        .ok_or(DbErr::RecordNotFound("Message not found".to_string()))?;

    if message.is_read {
        return Ok(message);
    }
    let mut active: direct_messages::ActiveModel = message.into();
    active.is_read = Set(true);
    active.update(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::Roles;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn user(first: &str) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            username: first.to_lowercase(),
            email: format!("{}@example.com", first.to_lowercase()),
            password_hash: "hash".into(),
            first_name: first.into(),
            last_name: String::new(),
            role: Roles::Client,
            is_active: true,
            date_joined: Utc::now(),
            updated_at: None,
        }
    }

    fn message(from: Uuid, to: Uuid, content: &str, age_minutes: i64) -> direct_messages::Model {
        direct_messages::Model {
            id: Uuid::new_v4(),
            sender_id: from,
            receiver_id: to,
            content: content.into(),
            is_read: false,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn statements(db: DatabaseConnection) -> Vec<String> {
        db.into_transaction_log()
            .iter()
            .flat_map(|t| t.statements().iter().map(|s| s.sql.clone()))
            .collect()
    }

    #[tokio::test]
    async fn send_requires_existing_receiver() {
        let sender = user("Sara");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let err = send(&db, &sender, Uuid::new_v4(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Receiver not found"));
        assert!(statements(db).iter().all(|s| !s.starts_with("INSERT")));
    }

    #[tokio::test]
    async fn send_rejects_blank_content() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = send(&db, &user("Sara"), Uuid::new_v4(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn send_stores_trimmed_message() {
        let sender = user("Sara");
        let receiver = user("Dawit");
        let stored = message(sender.id, receiver.id, "see you at ten", 0);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![receiver.clone()]])
            .append_query_results([vec![stored.clone()]])
            .into_connection();

        let sent = send(&db, &sender, receiver.id, "  see you at ten ")
            .await
            .unwrap();
        assert_eq!(sent.id, stored.id);
        assert_eq!(sent.sender, sender.id);
        assert_eq!(sent.receiver, receiver.id);
        assert_eq!(sent.sender_name, "Sara");
        assert!(!sent.is_read);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("see you at ten\""));
    }

    #[tokio::test]
    async fn conversation_covers_both_directions_oldest_first() {
        let me = user("Sara");
        let other = user("Dawit");
        let rows = vec![
            message(me.id, other.id, "hi", 10),
            message(other.id, me.id, "hello", 5),
            message(me.id, other.id, "how are you", 1),
        ];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .append_query_results([vec![me.clone(), other.clone()]])
            .into_connection();

        let thread = conversation(&db, me.id, other.id).await.unwrap();
        let contents: Vec<&str> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["hi", "hello", "how are you"]);
        let names: Vec<&str> = thread.iter().map(|m| m.sender_name.as_str()).collect();
        assert_eq!(names, ["Sara", "Dawit", "Sara"]);

        let sql = statements(db);
        assert!(sql[0].contains(r#"ORDER BY "direct_messages"."created_at" ASC"#));
        assert!(sql[0].contains(" OR "));
    }
}
