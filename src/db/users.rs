use sea_orm::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::db::profiles::{self, StoredFiles};
use crate::models::professional_profiles;
use crate::models::users::{
    self, PublicUser, RegisterUser, Roles, UpdateUser, UserProfile, UserResponse,
};
use crate::models::{appointments, connections};
use crate::storage::FileStorage;

/// Result of a signup. `partial_failure` is set when the profile documents
/// could not be stored and only the plain fields were kept.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: UserResponse,
    pub partial_failure: Option<String>,
}

/// Fetch a single user by ID.
pub async fn get_user_by_id<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find_by_id(id).one(conn).await
}

/// Look a user up by username or email, as typed on the login form.
pub async fn find_by_login(
    db: &DatabaseConnection,
    login: &str,
) -> Result<Option<users::Model>, DbErr> {
    let login = login.trim();
    users::Entity::find()
        .filter(
            Condition::any()
                .add(users::Column::Username.eq(login))
                .add(users::Column::Email.eq(login.to_lowercase())),
        )
        .one(db)
        .await
}

pub async fn username_taken(
    db: &DatabaseConnection,
    username: &str,
    except: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut query = users::Entity::find().filter(users::Column::Username.eq(username));
    if let Some(id) = except {
        query = query.filter(users::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

pub async fn email_taken(
    db: &DatabaseConnection,
    email: &str,
    except: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut query = users::Entity::find().filter(users::Column::Email.eq(email.to_lowercase()));
    if let Some(id) = except {
        query = query.filter(users::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

/// Users keyed by id, for decorating list responses with names.
pub async fn users_by_ids(
    db: &DatabaseConnection,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, users::Model>, DbErr> {
    let ids: HashSet<Uuid> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|u| (u.id, u)).collect())
}

/// Display name for `id` from a lookup map, empty when unknown.
pub fn name_of(users: &HashMap<Uuid, users::Model>, id: Uuid) -> String {
    users.get(&id).map(|u| u.display_name()).unwrap_or_default()
}

/// Attach each user's profile for the API representation.
pub async fn with_profiles(
    db: &DatabaseConnection,
    users: Vec<users::Model>,
) -> Result<Vec<UserResponse>, DbErr> {
    let mut profiles = profiles::profiles_for_users(db, &users).await?;
    Ok(users
        .into_iter()
        .map(|u| {
            let profile = profiles.remove(&u.id);
            UserResponse::new(u, profile)
        })
        .collect())
}

pub async fn user_response(
    db: &DatabaseConnection,
    user: users::Model,
) -> Result<UserResponse, DbErr> {
    let profile = profiles::find_profile(db, &user).await?;
    Ok(UserResponse::new(user, profile))
}

pub async fn get_users_by_role(
    db: &DatabaseConnection,
    role: Roles,
) -> Result<Vec<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Role.eq(role))
        .order_by_asc(users::Column::DateJoined)
        .all(db)
        .await
}

/// Create the user and its profile in one transaction. Profile details are
/// written inside a savepoint; for professionals a failure there is retried
/// without the uploaded files.
pub async fn register_user(
    db: &DatabaseConnection,
    storage: &dyn FileStorage,
    input: RegisterUser,
    password_hash: String,
) -> Result<Registration, DbErr> {
    let role = input.role.unwrap_or(Roles::Client);
    let txn = db.begin().await?;

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(input.username.trim().to_string()),
        email: Set(input.email.trim().to_lowercase()),
        password_hash: Set(password_hash),
        first_name: Set(input.first_name.trim().to_string()),
        last_name: Set(input.last_name.trim().to_string()),
        role: Set(role),
        is_active: Set(true),
        date_joined: Set(chrono::Utc::now()),
        updated_at: Set(None),
    }
    .insert(&txn)
    .await?;

    let profile = profiles::sync_profile(&txn, &user).await?;

    let savepoint = txn.begin().await?;
    let attempt = save_details(&savepoint, storage, profile.clone(), &input).await;

    let (profile, partial_failure) = match attempt {
        Ok(profile) => {
            savepoint.commit().await?;
            (profile, None)
        }
        Err(e) => {
            savepoint.rollback().await?;
            if role != Roles::Professional {
                return Err(e);
            }
            tracing::warn!(user_id = %user.id, "profile details failed, retrying without files: {e}");
            let profile = profiles::apply_profile_fields(
                &txn,
                profile,
                &input.profile,
                &StoredFiles::default(),
            )
            .await?;
            (profile, Some(e.to_string()))
        }
    };

    txn.commit().await?;
    tracing::info!(user_id = %user.id, role = ?role, "user registered");

    Ok(Registration {
        user: UserResponse::new(user, Some(profile)),
        partial_failure,
    })
}

async fn save_details<C: ConnectionTrait>(
    conn: &C,
    storage: &dyn FileStorage,
    profile: UserProfile,
    input: &RegisterUser,
) -> Result<UserProfile, DbErr> {
    let stored = if matches!(profile, UserProfile::Professional(_)) {
        profiles::store_files(storage, &input.files)
            .await
            .map_err(|e| DbErr::Custom(e.to_string()))?
    } else {
        StoredFiles::default()
    };
    match profiles::apply_profile_fields(conn, profile, &input.profile, &stored).await {
        Ok(profile) => Ok(profile),
        Err(e) => {
            profiles::discard_files(storage, &stored).await;
            Err(e)
        }
    }
}

/// Apply a partial update to a user, then resync and update its profile.
/// Uploaded files are only accepted at signup.
pub async fn update_user(
    db: &DatabaseConnection,
    user: users::Model,
    input: UpdateUser,
    password_hash: Option<String>,
) -> Result<UserResponse, DbErr> {
    let mut active: users::ActiveModel = user.into();

    if let Some(username) = input.username {
        active.username = Set(username.trim().to_string());
    }
    if let Some(email) = input.email {
        active.email = Set(email.trim().to_lowercase());
    }
    if let Some(hash) = password_hash {
        active.password_hash = Set(hash);
    }
    if let Some(first_name) = input.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = input.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(role) = input.role {
        active.role = Set(role);
    }
    if let Some(is_active) = input.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Some(chrono::Utc::now()));

    let txn = db.begin().await?;
    let user = active.update(&txn).await?;
    let profile = profiles::sync_profile(&txn, &user).await?;
    let profile =
        profiles::apply_profile_fields(&txn, profile, &input.profile, &StoredFiles::default())
            .await?;
    txn.commit().await?;

    Ok(UserResponse::new(user, Some(profile)))
}

/// Professionals visible to `viewer`: clients only see verified ones.
pub async fn list_professionals(
    db: &DatabaseConnection,
    viewer: &users::Model,
) -> Result<Vec<UserResponse>, DbErr> {
    let professionals = get_users_by_role(db, Roles::Professional).await?;
    let responses = with_profiles(db, professionals).await?;
    if viewer.role == Roles::Client {
        Ok(responses.into_iter().filter(|u| u.verified).collect())
    } else {
        Ok(responses)
    }
}

/// Clients visible to `viewer`. Professionals see the clients they are
/// connected with or have any appointment with.
pub async fn list_clients(
    db: &DatabaseConnection,
    viewer: &users::Model,
) -> Result<Vec<UserResponse>, DbErr> {
    if viewer.role != Roles::Professional {
        let clients = get_users_by_role(db, Roles::Client).await?;
        return with_profiles(db, clients).await;
    }

    let mut client_ids: HashSet<Uuid> = connections::Entity::find()
        .filter(connections::Column::ProfessionalId.eq(viewer.id))
        .filter(connections::Column::Status.eq(connections::Status::Accepted))
        .all(db)
        .await?
        .into_iter()
        .map(|c| c.client_id)
        .collect();

    client_ids.extend(
        appointments::Entity::find()
            .filter(appointments::Column::ProfessionalId.eq(viewer.id))
            .all(db)
            .await?
            .into_iter()
            .map(|a| a.client_id),
    );

    if client_ids.is_empty() {
        return Ok(Vec::new());
    }

    let clients = users::Entity::find()
        .filter(users::Column::Id.is_in(client_ids))
        .order_by_asc(users::Column::DateJoined)
        .all(db)
        .await?;
    with_profiles(db, clients).await
}

/// Public card for clients and verified professionals; `None` for anyone else.
pub async fn get_public_user(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<PublicUser>, DbErr> {
    let Some(user) = get_user_by_id(db, id).await? else {
        return Ok(None);
    };

    let visible = match user.role {
        Roles::Client => true,
        Roles::Professional => profiles::get_professional_profile(db, user.id)
            .await?
            .is_some_and(|p| p.verified),
        Roles::Admin => false,
    };

    Ok(visible.then(|| PublicUser::from(user)))
}

/// A verified professional by id, used before contacting them.
pub async fn get_verified_professional(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<(users::Model, professional_profiles::Model)>, DbErr> {
    let Some(user) = get_user_by_id(db, id).await? else {
        return Ok(None);
    };
    if user.role != Roles::Professional {
        return Ok(None);
    }
    Ok(profiles::get_professional_profile(db, user.id)
        .await?
        .filter(|p| p.verified)
        .map(|p| (user, p)))
}

/// True when `id` belongs to a user with the professional role.
pub async fn is_professional(db: &DatabaseConnection, id: Uuid) -> Result<bool, DbErr> {
    Ok(get_user_by_id(db, id)
        .await?
        .is_some_and(|u| u.role == Roles::Professional))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client_profiles;
    use crate::models::professional_profiles::VerificationStatus;
    use crate::models::users::{ProfileFields, ProfileFiles, UploadedFile};
    use crate::storage::StorageError;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Mutex;

    /// Accepts the first `succeed` uploads, then fails every later one.
    struct FlakyStorage {
        succeed: usize,
        saved: Mutex<Vec<String>>,
        removed: Mutex<Vec<String>>,
    }

    impl FlakyStorage {
        fn new(succeed: usize) -> Self {
            Self {
                succeed,
                saved: Mutex::new(Vec::new()),
                removed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl FileStorage for FlakyStorage {
        async fn save(&self, folder: &str, file: &UploadedFile) -> Result<String, StorageError> {
            let mut saved = self.saved.lock().unwrap();
            if saved.len() >= self.succeed {
                return Err(StorageError::InvalidEncoding(file.filename.clone()));
            }
            let url = format!("/media/{folder}/{}", file.filename);
            saved.push(url.clone());
            Ok(url)
        }

        async fn remove(&self, url: &str) -> Result<(), StorageError> {
            self.removed.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn user(role: Roles, first: &str) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            username: first.to_lowercase(),
            email: format!("{}@example.com", first.to_lowercase()),
            password_hash: "hash".into(),
            first_name: first.into(),
            last_name: String::new(),
            role,
            is_active: true,
            date_joined: Utc::now(),
            updated_at: None,
        }
    }

    fn pro_profile(user_id: Uuid, status: VerificationStatus) -> professional_profiles::Model {
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
            verification_status: status,
            rejection_reason_type: None,
            rejection_reason: None,
            verified: status == VerificationStatus::Verified,
            balance: Decimal::ZERO,
            total_earnings: Decimal::ZERO,
        }
    }

    fn upload(name: &str) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            content_base64: "aGVsbG8=".to_string(),
        }
    }

    fn signup(role: Roles, files: ProfileFiles) -> RegisterUser {
        RegisterUser {
            username: "meron".into(),
            email: "meron@example.com".into(),
            password: "Str0ng!pass".into(),
            role: Some(role),
            first_name: "Meron".into(),
            last_name: "Tesfaye".into(),
            profile: ProfileFields {
                phone: Some("+251911000000".into()),
                specialization: Some("Anxiety".into()),
                ..Default::default()
            },
            files,
        }
    }

    fn registered(input: &RegisterUser) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            username: input.username.clone(),
            email: input.email.clone(),
            password_hash: "hash".into(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            role: input.role.unwrap_or(Roles::Client),
            is_active: true,
            date_joined: Utc::now(),
            updated_at: None,
        }
    }

    fn sql_log(db: DatabaseConnection) -> String {
        format!("{:?}", db.into_transaction_log())
    }

    #[tokio::test]
    async fn professional_signup_survives_failed_upload() {
        let storage = FlakyStorage::new(1);
        let input = signup(
            Roles::Professional,
            ProfileFiles {
                profile_photo: Some(upload("me.png")),
                id_image: Some(upload("id.png")),
                ..Default::default()
            },
        );
        let user = registered(&input);
        let created = pro_profile(user.id, VerificationStatus::Pending);
        let mut retried = created.clone();
        retried.specialization = Some("Anxiety".into());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([Vec::<professional_profiles::Model>::new()])
            .append_query_results([vec![created]])
            .append_query_results([vec![retried]])
            .into_connection();

        let registration = register_user(&db, &storage, input, "hash".into())
            .await
            .unwrap();

        let reason = registration.partial_failure.expect("partial failure reported");
        assert!(reason.contains("id.png is not valid base64"), "{reason}");
        assert_eq!(registration.user.id, user.id);
        assert_eq!(registration.user.specialization.as_deref(), Some("Anxiety"));
        assert_eq!(registration.user.profile_photo, None);

        // the photo written before the failure is cleaned up
        let saved = storage.saved.lock().unwrap().clone();
        assert_eq!(saved, vec!["/media/profiles/me.png".to_string()]);
        assert_eq!(*storage.removed.lock().unwrap(), saved);

        // the retry stores the plain fields without any file url
        let log = sql_log(db);
        assert!(log.contains("Anxiety"));
        assert!(!log.contains("/media/"));
    }

    #[tokio::test]
    async fn professional_signup_with_uploads_has_no_partial_failure() {
        let storage = FlakyStorage::new(4);
        let input = signup(
            Roles::Professional,
            ProfileFiles {
                profile_photo: Some(upload("me.png")),
                ..Default::default()
            },
        );
        let user = registered(&input);
        let created = pro_profile(user.id, VerificationStatus::Pending);
        let mut saved_profile = created.clone();
        saved_profile.profile_photo = Some("/media/profiles/me.png".into());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([Vec::<professional_profiles::Model>::new()])
            .append_query_results([vec![created]])
            .append_query_results([vec![saved_profile]])
            .into_connection();

        let registration = register_user(&db, &storage, input, "hash".into())
            .await
            .unwrap();
        assert!(registration.partial_failure.is_none());
        assert_eq!(
            registration.user.profile_photo.as_deref(),
            Some("/media/profiles/me.png")
        );
        assert!(storage.removed.lock().unwrap().is_empty());
        assert!(sql_log(db).contains("/media/profiles/me.png"));
    }

    #[tokio::test]
    async fn failed_profile_write_discards_stored_files_and_retries() {
        let storage = FlakyStorage::new(4);
        let input = signup(
            Roles::Professional,
            ProfileFiles {
                certificates: Some(upload("cert.pdf")),
                ..Default::default()
            },
        );
        let user = registered(&input);
        let created = pro_profile(user.id, VerificationStatus::Pending);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([Vec::<professional_profiles::Model>::new()])
            .append_query_results([vec![created.clone()]])
            .append_query_errors([DbErr::Custom("value too long".into())])
            .append_query_results([vec![created]])
            .into_connection();

        let registration = register_user(&db, &storage, input, "hash".into())
            .await
            .unwrap();
        assert!(registration
            .partial_failure
            .is_some_and(|r| r.contains("value too long")));
        assert_eq!(
            *storage.removed.lock().unwrap(),
            vec!["/media/certificates/cert.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn client_signup_fails_when_details_fail() {
        let storage = FlakyStorage::new(0);
        let input = signup(Roles::Client, ProfileFiles::default());
        let user = registered(&input);
        let profile = client_profiles::Model {
            id: Uuid::new_v4(),
            user_id: user.id,
            phone: None,
            dob: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([Vec::<client_profiles::Model>::new()])
            .append_query_results([vec![profile]])
            .append_query_errors([DbErr::Custom("disk full".into())])
            .into_connection();

        let err = register_user(&db, &storage, input, "hash".into())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(storage.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn professional_signup_fails_when_retry_fails() {
        let storage = FlakyStorage::new(0);
        let input = signup(
            Roles::Professional,
            ProfileFiles {
                id_image: Some(upload("id.png")),
                ..Default::default()
            },
        );
        let user = registered(&input);
        let created = pro_profile(user.id, VerificationStatus::Pending);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([Vec::<professional_profiles::Model>::new()])
            .append_query_results([vec![created]])
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();

        let err = register_user(&db, &storage, input, "hash".into())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn clients_only_see_verified_professionals() {
        let viewer = user(Roles::Client, "Sara");
        let verified = user(Roles::Professional, "Dawit");
        let pending = user(Roles::Professional, "Liya");

        let rows = || {
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![verified.clone(), pending.clone()]])
                .append_query_results([vec![
                    pro_profile(verified.id, VerificationStatus::Verified),
                    pro_profile(pending.id, VerificationStatus::Pending),
                ]])
                .into_connection()
        };

        let seen = list_professionals(&rows(), &viewer).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, verified.id);
        assert!(seen[0].verified);

        let admin = user(Roles::Admin, "Root");
        let seen = list_professionals(&rows(), &admin).await.unwrap();
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test]
    async fn professional_sees_connected_and_booked_clients() {
        let pro = user(Roles::Professional, "Dawit");
        let connected = user(Roles::Client, "Sara");
        let booked = user(Roles::Client, "Hana");
        let now = Utc::now();

        let connection = connections::Model {
            id: Uuid::new_v4(),
            client_id: connected.id,
            professional_id: pro.id,
            status: connections::Status::Accepted,
            created_at: now,
            updated_at: now,
        };
        let appointment = appointments::Model {
            id: Uuid::new_v4(),
            client_id: booked.id,
            professional_id: pro.id,
            date: NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            status: appointments::Status::Pending,
            session_type: appointments::SessionType::Video,
            notes: None,
            created_at: now,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![connection]])
            .append_query_results([vec![appointment]])
            .append_query_results([vec![connected.clone(), booked.clone()]])
            .append_query_results([Vec::<client_profiles::Model>::new()])
            .into_connection();

        let clients = list_clients(&db, &pro).await.unwrap();
        let ids: HashSet<Uuid> = clients.iter().map(|c| c.id).collect();
        assert_eq!(ids, HashSet::from([connected.id, booked.id]));

        let log = sql_log(db);
        assert!(log.contains("accepted"));
    }

    #[tokio::test]
    async fn professional_without_links_sees_no_clients() {
        let pro = user(Roles::Professional, "Dawit");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<connections::Model>::new()])
            .append_query_results([Vec::<appointments::Model>::new()])
            .into_connection();

        assert!(list_clients(&db, &pro).await.unwrap().is_empty());
        // no user lookup once nothing links them
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn public_card_hidden_for_admins_and_unverified_professionals() {
        let admin = user(Roles::Admin, "Root");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin.clone()]])
            .into_connection();
        assert!(get_public_user(&db, admin.id).await.unwrap().is_none());

        let pending = user(Roles::Professional, "Liya");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending.clone()]])
            .append_query_results([vec![pro_profile(pending.id, VerificationStatus::Pending)]])
            .into_connection();
        assert!(get_public_user(&db, pending.id).await.unwrap().is_none());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        assert!(get_public_user(&db, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn public_card_shown_for_clients_and_verified_professionals() {
        let client = user(Roles::Client, "Sara");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![client.clone()]])
            .into_connection();
        let card = get_public_user(&db, client.id).await.unwrap().unwrap();
        assert_eq!(card.name, "Sara");
        assert_eq!(card.role, Roles::Client);

        let pro = user(Roles::Professional, "Dawit");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pro.clone()]])
            .append_query_results([vec![pro_profile(pro.id, VerificationStatus::Verified)]])
            .into_connection();
        let card = get_public_user(&db, pro.id).await.unwrap().unwrap();
        assert_eq!(card.id, pro.id);
    }
}
