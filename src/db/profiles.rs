use rust_decimal::Decimal;
use sea_orm::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::professional_profiles::{self, VerificationStatus};
use crate::models::users::{self, ProfileFields, ProfileFiles, Roles, UserProfile};
use crate::models::{admin_profiles, client_profiles};
use crate::storage::{FileStorage, StorageError};

/// URLs of files stored for a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredFiles {
    pub profile_photo: Option<String>,
    pub id_image: Option<String>,
    pub id_image_back: Option<String>,
    pub certificates: Option<String>,
}

impl StoredFiles {
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        [
            &self.profile_photo,
            &self.id_image,
            &self.id_image_back,
            &self.certificates,
        ]
        .into_iter()
        .filter_map(|u| u.as_deref())
    }
}

/// Write every provided upload to storage. On failure the uploads already
/// written are removed again.
pub async fn store_files(
    storage: &dyn FileStorage,
    files: &ProfileFiles,
) -> Result<StoredFiles, StorageError> {
    let mut stored = StoredFiles::default();
    if let Err(e) = save_each(storage, files, &mut stored).await {
        discard_files(storage, &stored).await;
        return Err(e);
    }
    Ok(stored)
}

async fn save_each(
    storage: &dyn FileStorage,
    files: &ProfileFiles,
    stored: &mut StoredFiles,
) -> Result<(), StorageError> {
    if let Some(f) = &files.profile_photo {
        stored.profile_photo = Some(storage.save("profiles", f).await?);
    }
    if let Some(f) = &files.id_image {
        stored.id_image = Some(storage.save("ids", f).await?);
    }
    if let Some(f) = &files.id_image_back {
        stored.id_image_back = Some(storage.save("ids", f).await?);
    }
    if let Some(f) = &files.certificates {
        stored.certificates = Some(storage.save("certificates", f).await?);
    }
    Ok(())
}

/// Best-effort removal of uploads whose profile write did not go through.
pub async fn discard_files(storage: &dyn FileStorage, stored: &StoredFiles) {
    for url in stored.urls() {
        if let Err(e) = storage.remove(url).await {
            tracing::warn!(%url, "failed to remove orphaned upload: {e}");
        }
    }
}

fn new_professional(user_id: Uuid) -> professional_profiles::ActiveModel {
    professional_profiles::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        phone: Set(None),
        dob: Set(None),
        specialization: Set(None),
        bio: Set(None),
        location: Set("Global".to_string()),
        languages: Set("English".to_string()),
        id_type: Set(None),
        id_number: Set(None),
        issuing_authority: Set(None),
        profile_photo: Set(None),
        id_image: Set(None),
        id_image_back: Set(None),
        certificates: Set(None),
        has_documents: Set(false),
        rating: Set(Decimal::new(500, 2)),
        review_count: Set(0),
        sessions_completed: Set(0),
        is_online: Set(false),
        verification_status: Set(VerificationStatus::Pending),
        rejection_reason_type: Set(None),
        rejection_reason: Set(None),
        verified: Set(false),
        balance: Set(Decimal::ZERO),
        total_earnings: Set(Decimal::ZERO),
    }
}

/// Fetch the profile matching the user's current role.
pub async fn find_profile<C: ConnectionTrait>(
    conn: &C,
    user: &users::Model,
) -> Result<Option<UserProfile>, DbErr> {
    let profile = match user.role {
        Roles::Client => client_profiles::Entity::find()
            .filter(client_profiles::Column::UserId.eq(user.id))
            .one(conn)
            .await?
            .map(UserProfile::Client),
        Roles::Professional => professional_profiles::Entity::find()
            .filter(professional_profiles::Column::UserId.eq(user.id))
            .one(conn)
            .await?
            .map(UserProfile::Professional),
        Roles::Admin => admin_profiles::Entity::find()
            .filter(admin_profiles::Column::UserId.eq(user.id))
            .one(conn)
            .await?
            .map(UserProfile::Admin),
    };
    Ok(profile)
}

/// Runs after every user save: creates the role's profile when it is missing
/// and keeps the professional `verified` flag in line with the status.
pub async fn sync_profile<C: ConnectionTrait>(
    conn: &C,
    user: &users::Model,
) -> Result<UserProfile, DbErr> {
    if let Some(existing) = find_profile(conn, user).await? {
        return match existing {
            UserProfile::Professional(p)
                if p.verified != (p.verification_status == VerificationStatus::Verified) =>
            {
                let verified = p.verification_status == VerificationStatus::Verified;
                let mut active: professional_profiles::ActiveModel = p.into();
                active.verified = Set(verified);
                Ok(UserProfile::Professional(active.update(conn).await?))
            }
            other => Ok(other),
        };
    }

    tracing::info!(user_id = %user.id, role = ?user.role, "provisioning profile");
    let created = match user.role {
        Roles::Client => UserProfile::Client(
            client_profiles::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.id),
                phone: Set(None),
                dob: Set(None),
            }
            .insert(conn)
            .await?,
        ),
        Roles::Professional => {
            UserProfile::Professional(new_professional(user.id).insert(conn).await?)
        }
        Roles::Admin => UserProfile::Admin(
            admin_profiles::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.id),
                department: Set(None),
            }
            .insert(conn)
            .await?,
        ),
    };
    Ok(created)
}

/// Write the supplied fields (and stored file URLs) onto a profile. Absent
/// fields are left untouched.
pub async fn apply_profile_fields<C: ConnectionTrait>(
    conn: &C,
    profile: UserProfile,
    fields: &ProfileFields,
    files: &StoredFiles,
) -> Result<UserProfile, DbErr> {
    match profile {
        UserProfile::Client(p) => {
            let mut active: client_profiles::ActiveModel = p.into();
            if let Some(phone) = &fields.phone {
                active.phone = Set(Some(phone.clone()));
            }
            if let Some(dob) = fields.dob {
                active.dob = Set(Some(dob));
            }
            Ok(UserProfile::Client(active.update(conn).await?))
        }
        UserProfile::Professional(p) => {
            let has_documents = p.has_documents
                || files.id_image.is_some()
                || files.id_image_back.is_some()
                || files.certificates.is_some();
            let verified = p.verification_status == VerificationStatus::Verified;
            let mut active: professional_profiles::ActiveModel = p.into();

            if let Some(v) = &fields.phone {
                active.phone = Set(Some(v.clone()));
            }
            if let Some(v) = fields.dob {
                active.dob = Set(Some(v));
            }
            if let Some(v) = &fields.specialization {
                active.specialization = Set(Some(v.clone()));
            }
            if let Some(v) = &fields.bio {
                active.bio = Set(Some(v.clone()));
            }
            if let Some(v) = fields.location.as_ref().filter(|l| !l.trim().is_empty()) {
                active.location = Set(v.clone());
            }
            if let Some(v) = fields.id_type {
                active.id_type = Set(Some(v));
            }
            if let Some(v) = &fields.id_number {
                active.id_number = Set(Some(v.clone()));
            }
            if let Some(v) = &fields.issuing_authority {
                active.issuing_authority = Set(Some(v.clone()));
            }
            if let Some(langs) = &fields.languages {
                let joined = langs
                    .iter()
                    .map(|l| l.trim())
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join(",");
                if !joined.is_empty() {
                    active.languages = Set(joined);
                }
            }
            if let Some(url) = &files.profile_photo {
                active.profile_photo = Set(Some(url.clone()));
            }
            if let Some(url) = &files.id_image {
                active.id_image = Set(Some(url.clone()));
            }
            if let Some(url) = &files.id_image_back {
                active.id_image_back = Set(Some(url.clone()));
            }
            if let Some(url) = &files.certificates {
                active.certificates = Set(Some(url.clone()));
            }
            active.has_documents = Set(has_documents);
            active.verified = Set(verified);

            Ok(UserProfile::Professional(active.update(conn).await?))
        }
        UserProfile::Admin(p) => {
            let mut active: admin_profiles::ActiveModel = p.into();
            if let Some(dept) = &fields.department {
                active.department = Set(Some(dept.clone()));
            }
            Ok(UserProfile::Admin(active.update(conn).await?))
        }
    }
}

/// Load the role profiles of many users with one query per profile table.
pub async fn profiles_for_users(
    db: &DatabaseConnection,
    users: &[users::Model],
) -> Result<HashMap<Uuid, UserProfile>, DbErr> {
    let ids_with = |role: Roles| -> Vec<Uuid> {
        users.iter().filter(|u| u.role == role).map(|u| u.id).collect()
    };
    let mut profiles = HashMap::new();

    let client_ids = ids_with(Roles::Client);
    if !client_ids.is_empty() {
        for p in client_profiles::Entity::find()
            .filter(client_profiles::Column::UserId.is_in(client_ids))
            .all(db)
            .await?
        {
            profiles.insert(p.user_id, UserProfile::Client(p));
        }
    }

    let professional_ids = ids_with(Roles::Professional);
    if !professional_ids.is_empty() {
        for p in professional_profiles::Entity::find()
            .filter(professional_profiles::Column::UserId.is_in(professional_ids))
            .all(db)
            .await?
        {
            profiles.insert(p.user_id, UserProfile::Professional(p));
        }
    }

    let admin_ids = ids_with(Roles::Admin);
    if !admin_ids.is_empty() {
        for p in admin_profiles::Entity::find()
            .filter(admin_profiles::Column::UserId.is_in(admin_ids))
            .all(db)
            .await?
        {
            profiles.insert(p.user_id, UserProfile::Admin(p));
        }
    }

    Ok(profiles)
}

pub async fn get_professional_profile<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<Option<professional_profiles::Model>, DbErr> {
    professional_profiles::Entity::find()
        .filter(professional_profiles::Column::UserId.eq(user_id))
        .one(conn)
        .await
}

/// Professional photos keyed by user id, for list responses.
pub async fn professional_photos(
    db: &DatabaseConnection,
    user_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Option<String>>, DbErr> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = professional_profiles::Entity::find()
        .filter(professional_profiles::Column::UserId.is_in(user_ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|p| (p.user_id, p.profile_photo)).collect())
}

/// Set a professional's presence flag, provisioning the profile if needed.
pub async fn set_online(
    db: &DatabaseConnection,
    user: &users::Model,
    is_online: bool,
) -> Result<professional_profiles::Model, DbErr> {
    let profile = match sync_profile(db, user).await? {
        UserProfile::Professional(p) => p,
        _ => {
            return Err(DbErr::RecordNotFound(
                "Professional profile not found".to_string(),
            ));
        }
    };
    let mut active: professional_profiles::ActiveModel = profile.into();
    active.is_online = Set(is_online);
    active.update(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    fn professional_user() -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            username: "dr_abebe".into(),
            email: "abebe@example.com".into(),
            password_hash: "hash".into(),
            first_name: "Abebe".into(),
            last_name: "Kebede".into(),
            role: Roles::Professional,
            is_active: true,
            date_joined: chrono::Utc::now(),
            updated_at: None,
        }
    }

    fn profile_for(user_id: Uuid) -> professional_profiles::Model {
        professional_profiles::Model {
            id: Uuid::new_v4(),
            user_id,
            phone: None,
            dob: None,
            specialization: None,
            bio: None,
            location: "Global".into(),
            languages: "English".into(),
            id_type: None,
            id_number: None,
            issuing_authority: None,
            profile_photo: None,
            id_image: None,
            id_image_back: None,
            certificates: None,
            has_documents: false,
            rating: Decimal::new(500, 2),
            review_count: 0,
            sessions_completed: 0,
            is_online: false,
            verification_status: VerificationStatus::Pending,
            rejection_reason_type: None,
            rejection_reason: None,
            verified: false,
            balance: Decimal::ZERO,
            total_earnings: Decimal::ZERO,
        }
    }

    fn count_inserts(log: &[Transaction], table: &str) -> usize {
        log.iter()
            .flat_map(|t| t.statements())
            .filter(|s| s.sql.starts_with("INSERT") && s.sql.contains(table))
            .count()
    }

    #[tokio::test]
    async fn sync_creates_professional_profile_once() {
        let user = professional_user();
        let created = profile_for(user.id);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // first sync: lookup finds nothing, then insert returns the row
            .append_query_results([Vec::<professional_profiles::Model>::new()])
            .append_query_results([vec![created.clone()]])
            // second sync: lookup finds the row
            .append_query_results([vec![created.clone()]])
            .into_connection();

        let first = sync_profile(&db, &user).await.unwrap();
        let second = sync_profile(&db, &user).await.unwrap();

        assert_eq!(first, UserProfile::Professional(created.clone()));
        assert_eq!(second, UserProfile::Professional(created));

        let log = db.into_transaction_log();
        assert_eq!(count_inserts(&log, "professional_profiles"), 1);
        assert_eq!(count_inserts(&log, "client_profiles"), 0);
    }

    #[tokio::test]
    async fn sync_repairs_verified_flag() {
        let user = professional_user();
        let mut stale = profile_for(user.id);
        stale.verification_status = VerificationStatus::Verified;
        let mut repaired = stale.clone();
        repaired.verified = true;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stale]])
            .append_query_results([vec![repaired.clone()]])
            .into_connection();

        let synced = sync_profile(&db, &user).await.unwrap();
        assert_eq!(synced, UserProfile::Professional(repaired));
    }
}
