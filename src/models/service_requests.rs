use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::appointments::SessionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// SeaORM entity for the `service_requests` table: a client asking the
/// marketplace for help.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub category: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub preferred_session_type: SessionType,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub budget: Option<Decimal>,
    pub status: RequestStatus,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ClientId",
        to = "super::users::Column::Id"
    )]
    Client,
    #[sea_orm(has_many = "super::service_proposals::Entity")]
    Proposals,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::service_proposals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Proposals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceRequest {
    pub title: String,
    pub category: String,
    pub description: String,
    pub preferred_session_type: Option<SessionType>,
    pub budget: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceRequestResponse {
    pub id: Uuid,
    pub client: Uuid,
    pub client_name: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub preferred_session_type: SessionType,
    pub budget: Option<Decimal>,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub proposals_count: usize,
    pub proposals: Vec<super::service_proposals::ProposalResponse>,
}
