use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[sea_orm(string_value = "text")]
    Text,
    #[sea_orm(string_value = "audio")]
    Audio,
    #[sea_orm(string_value = "video")]
    Video,
}

/// SeaORM entity for the `journal_entries` table. Authored by a professional,
/// optionally about one of their clients.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub professional_id: Uuid,
    pub client_id: Option<Uuid>,
    pub title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub media_file: Option<String>,
    pub entry_type: EntryType,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ProfessionalId",
        to = "super::users::Column::Id"
    )]
    Professional,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ClientId",
        to = "super::users::Column::Id"
    )]
    Client,
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJournalEntry {
    pub client: Option<Uuid>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub entry_type: Option<EntryType>,
    pub media_file: Option<crate::models::users::UploadedFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateJournalEntry {
    pub title: Option<String>,
    pub content: Option<String>,
    pub entry_type: Option<EntryType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JournalQuery {
    pub client_id: Option<Uuid>,
    pub personal: Option<String>,
}

impl JournalQuery {
    pub fn personal(&self) -> bool {
        self.personal.as_deref() == Some("true")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalEntryResponse {
    pub id: Uuid,
    pub professional: Uuid,
    pub client: Option<Uuid>,
    pub client_name: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub media_file: Option<String>,
    pub entry_type: EntryType,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl JournalEntryResponse {
    pub fn new(m: Model, client_name: Option<String>) -> Self {
        Self {
            id: m.id,
            professional: m.professional_id,
            client: m.client_id,
            client_name,
            title: m.title,
            content: m.content,
            media_file: m.media_file,
            entry_type: m.entry_type,
            created_at: m.created_at,
        }
    }
}
