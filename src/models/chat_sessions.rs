use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `chat_sessions` table: one AI conversation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chat_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub title: String,
    pub is_pinned: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::chat_messages::Entity")]
    Messages,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::chat_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateChatSession {
    pub title: Option<String>,
    pub is_pinned: Option<bool>,
}

/// Body of `POST /api/auth/ai-chat/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AiChatRequest {
    pub message: Option<String>,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AiChatResponse {
    pub reply: String,
    pub session_id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionWithMessages {
    pub session: Model,
    pub messages: Vec<super::chat_messages::Model>,
}
