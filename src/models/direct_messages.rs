use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `direct_messages` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "direct_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SenderId",
        to = "super::users::Column::Id"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReceiverId",
        to = "super::users::Column::Id"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

/// Body of `POST /api/auth/messages/`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendDirectMessage {
    pub receiver: Option<Uuid>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationQuery {
    pub user_id: Option<Uuid>,
}

/// Response DTO for messages sent over REST and WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMessageResponse {
    pub id: Uuid,
    pub sender: Uuid,
    pub sender_name: String,
    pub receiver: Uuid,
    pub content: String,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl DirectMessageResponse {
    pub fn new(m: Model, sender_name: String) -> Self {
        Self {
            id: m.id,
            sender: m.sender_id,
            sender_name,
            receiver: m.receiver_id,
            content: m.content,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}
