use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// SeaORM entity for the `service_proposals` table. One per (request, professional).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_proposals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub professional_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub status: ProposalStatus,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_requests::Entity",
        from = "Column::RequestId",
        to = "super::service_requests::Column::Id",
        on_delete = "Cascade"
    )]
    Request,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ProfessionalId",
        to = "super::users::Column::Id"
    )]
    Professional,
}

impl Related<super::service_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProposal {
    pub request: Uuid,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalAction {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProposalActionBody {
    pub action: ProposalAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposalResponse {
    pub id: Uuid,
    pub request: Uuid,
    pub professional: Uuid,
    pub professional_name: String,
    pub message: String,
    pub status: ProposalStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ProposalResponse {
    pub fn new(p: Model, professional_name: String) -> Self {
        Self {
            id: p.id,
            request: p.request_id,
            professional: p.professional_id,
            professional_name,
            message: p.message,
            status: p.status,
            created_at: p.created_at,
        }
    }
}
