use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{admin_profiles, client_profiles, professional_profiles};

/// The `Roles` enum maps to a Postgres TEXT column stored as lowercase strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Roles {
    #[sea_orm(string_value = "client")]
    Client,
    #[sea_orm(string_value = "professional")]
    Professional,
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// SeaORM entity for the `users` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Roles,
    pub is_active: bool,
    pub date_joined: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    /// "First Last" when either part is set, the username otherwise.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::client_profiles::Entity")]
    ClientProfile,
    #[sea_orm(has_one = "super::professional_profiles::Entity")]
    ProfessionalProfile,
    #[sea_orm(has_one = "super::admin_profiles::Entity")]
    AdminProfile,
    #[sea_orm(has_many = "super::chat_sessions::Entity")]
    ChatSessions,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
    #[sea_orm(has_many = "super::withdrawals::Entity")]
    Withdrawals,
}

impl Related<super::client_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClientProfile.def()
    }
}

impl Related<super::professional_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProfessionalProfile.def()
    }
}

impl Related<super::admin_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdminProfile.def()
    }
}

impl Related<super::chat_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChatSessions.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::withdrawals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Withdrawals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The role-specific row that extends a user.
#[derive(Debug, Clone, PartialEq)]
pub enum UserProfile {
    Client(client_profiles::Model),
    Professional(professional_profiles::Model),
    Admin(admin_profiles::Model),
}

// ── DTOs (not stored in DB, used for request bodies) ──

/// Profile attributes accepted at signup and on profile updates. Which ones
/// apply depends on the user's role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileFields {
    pub phone: Option<String>,
    pub dob: Option<chrono::NaiveDate>,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub id_type: Option<professional_profiles::IdType>,
    pub id_number: Option<String>,
    pub issuing_authority: Option<String>,
    pub languages: Option<Vec<String>>,
    pub department: Option<String>,
}

/// A file sent inline in a JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    pub content_base64: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileFiles {
    pub profile_photo: Option<UploadedFile>,
    pub id_image: Option<UploadedFile>,
    pub id_image_back: Option<UploadedFile>,
    pub certificates: Option<UploadedFile>,
}

impl ProfileFiles {
    pub fn is_empty(&self) -> bool {
        self.profile_photo.is_none()
            && self.id_image.is_none()
            && self.id_image_back.is_none()
            && self.certificates.is_none()
    }
}

/// Body of `POST /api/auth/register/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<Roles>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(flatten)]
    pub profile: ProfileFields,
    #[serde(flatten)]
    pub files: ProfileFiles,
}

/// Body of `POST /api/auth/login/`. `username` may also be an email.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Partial update used by `PUT/PATCH /api/auth/me/` and the admin user endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Roles>,
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

/// Body of `PATCH /api/auth/users/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminUpdateUser {
    pub id: Uuid,
    #[serde(flatten)]
    pub changes: UpdateUser,
}

/// Full user representation with the profile flattened in. Never leaks the
/// password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Roles,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub date_joined: DateTimeUtc,
    pub phone: Option<String>,
    pub dob: Option<chrono::NaiveDate>,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub id_type: Option<professional_profiles::IdType>,
    pub profile_photo: Option<String>,
    pub id_image: Option<String>,
    pub certificates: Option<String>,
    pub verified: bool,
    pub verification_status: Option<professional_profiles::VerificationStatus>,
    pub rejection_reason_type: Option<professional_profiles::RejectionReason>,
    pub rejection_reason: Option<String>,
    pub rating: f64,
    pub review_count: i32,
    pub sessions_completed: i32,
    pub languages: Vec<String>,
    pub is_online: bool,
}

impl UserResponse {
    pub fn new(user: Model, profile: Option<UserProfile>) -> Self {
        let mut resp = Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            date_joined: user.date_joined,
            phone: None,
            dob: None,
            specialization: None,
            bio: None,
            location: None,
            id_type: None,
            profile_photo: None,
            id_image: None,
            certificates: None,
            verified: false,
            verification_status: None,
            rejection_reason_type: None,
            rejection_reason: None,
            rating: 5.0,
            review_count: 0,
            sessions_completed: 0,
            languages: vec!["English".to_string()],
            is_online: false,
        };

        match profile {
            Some(UserProfile::Client(p)) => {
                resp.phone = p.phone;
                resp.dob = p.dob;
            }
            Some(UserProfile::Professional(p)) => {
                resp.rating = rust_decimal::prelude::ToPrimitive::to_f64(&p.rating).unwrap_or(5.0);
                resp.languages = p.language_list();
                resp.phone = p.phone;
                resp.dob = p.dob;
                resp.specialization = p.specialization;
                resp.bio = p.bio;
                resp.location = Some(p.location);
                resp.id_type = p.id_type;
                resp.profile_photo = p.profile_photo;
                resp.id_image = p.id_image;
                resp.certificates = p.certificates;
                resp.verified = p.verified;
                resp.verification_status = Some(p.verification_status);
                resp.rejection_reason_type = p.rejection_reason_type;
                resp.rejection_reason = p.rejection_reason;
                resp.review_count = p.review_count;
                resp.sessions_completed = p.sessions_completed;
                resp.is_online = p.is_online;
            }
            Some(UserProfile::Admin(_)) | None => {}
        }

        resp
    }
}

/// Minimal card shown to other users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub role: Roles,
}

impl From<Model> for PublicUser {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            name: m.display_name(),
            role: m.role,
        }
    }
}

/// Admin listing grouped by role.
#[derive(Debug, Clone, Serialize)]
pub struct UsersByRole {
    pub clients: Vec<UserResponse>,
    pub professionals: Vec<UserResponse>,
    pub admins: Vec<UserResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> Model {
        Model {
            id: Uuid::new_v4(),
            username: "jdoe".into(),
            email: "jdoe@example.com".into(),
            password_hash: "hash".into(),
            first_name: first.into(),
            last_name: last.into(),
            role: Roles::Client,
            is_active: true,
            date_joined: chrono::Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn display_name_prefers_full_name() {
        assert_eq!(user("John", "Doe").display_name(), "John Doe");
        assert_eq!(user("John", "").display_name(), "John");
        assert_eq!(user("", "").display_name(), "jdoe");
    }

    #[test]
    fn response_without_profile_uses_defaults() {
        let resp = UserResponse::new(user("A", "B"), None);
        assert_eq!(resp.rating, 5.0);
        assert_eq!(resp.languages, vec!["English".to_string()]);
        assert!(!resp.verified);
        assert!(resp.verification_status.is_none());
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let json = serde_json::to_value(user("A", "B")).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
