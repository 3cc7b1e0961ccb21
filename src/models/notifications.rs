use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const KIND_GENERAL: &str = "general";
pub const KIND_LIVE_REQUEST: &str = "live_request";
pub const KIND_VERIFICATION: &str = "verification";
pub const KIND_SERVICE_PROPOSAL: &str = "service_proposal";

/// SeaORM entity for the `notifications` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

/// Used internally whenever the backend notifies a user.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: &'static str,
    pub link: Option<String>,
}

/// Body of `POST /api/auth/live/initiate/`.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiateLiveSession {
    pub professional_id: Uuid,
    #[serde(rename = "type")]
    pub session_type: String,
    pub session_id: String,
}
