use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    #[sea_orm(string_value = "passport")]
    Passport,
    #[sea_orm(string_value = "national_id")]
    NationalId,
    #[sea_orm(string_value = "driver_license")]
    DriverLicense,
    #[sea_orm(string_value = "professional_id")]
    ProfessionalId,
}

/// Admin-reviewed approval state of a professional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "verified")]
    Verified,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    #[sea_orm(string_value = "invalid_id")]
    InvalidId,
    #[sea_orm(string_value = "unclear_certificates")]
    UnclearCertificates,
    #[sea_orm(string_value = "fake_profile")]
    FakeProfile,
    #[sea_orm(string_value = "insufficient_bio")]
    InsufficientBio,
    #[sea_orm(string_value = "other")]
    Other,
}

impl RejectionReason {
    pub fn label(&self) -> &'static str {
        match self {
            RejectionReason::InvalidId => "Invalid or Expired ID",
            RejectionReason::UnclearCertificates => "Unclear or Missing Certificates",
            RejectionReason::FakeProfile => "Potential Fake Profile / Identity Issue",
            RejectionReason::InsufficientBio => "Incomplete or Low Quality Bio",
            RejectionReason::Other => "Other",
        }
    }
}

/// SeaORM entity for the `professional_profiles` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "professional_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub dob: Option<Date>,
    pub specialization: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,
    pub location: String,
    /// Comma separated.
    pub languages: String,
    pub id_type: Option<IdType>,
    pub id_number: Option<String>,
    pub issuing_authority: Option<String>,
    pub profile_photo: Option<String>,
    pub id_image: Option<String>,
    pub id_image_back: Option<String>,
    pub certificates: Option<String>,
    pub has_documents: bool,
    #[sea_orm(column_type = "Decimal(Some((3, 2)))")]
    pub rating: Decimal,
    pub review_count: i32,
    pub sessions_completed: i32,
    pub is_online: bool,
    pub verification_status: VerificationStatus,
    pub rejection_reason_type: Option<RejectionReason>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    pub verified: bool,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_earnings: Decimal,
}

impl Model {
    pub fn language_list(&self) -> Vec<String> {
        let langs: Vec<String> = self
            .languages
            .split(',')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if langs.is_empty() {
            vec!["English".to_string()]
        } else {
            langs
        }
    }
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

/// Body of `POST /api/auth/status/online/`.
#[derive(Debug, Clone, Deserialize)]
pub struct OnlineStatus {
    pub is_online: Option<bool>,
}

/// Body of `POST /api/auth/admin/professionals/{id}/verification/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewVerification {
    pub status: VerificationStatus,
    pub rejection_reason_type: Option<RejectionReason>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationQuery {
    pub status: Option<VerificationStatus>,
}

/// Response of `GET /api/auth/payout/earnings/`.
#[derive(Debug, Clone, Serialize)]
pub struct Earnings {
    pub available_balance: Decimal,
    pub total_earnings: Decimal,
    pub withdrawals: Vec<super::withdrawals::Model>,
}
