use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::authorization::require_role;
use crate::auth::middleware::AuthenticatedUser;
use crate::db::{journal as journal_db, mood as mood_db};
use crate::errors::ApiError;
use crate::models::journal_entries::{CreateJournalEntry, JournalQuery, UpdateJournalEntry};
use crate::models::mood_updates::CreateMoodUpdate;
use crate::models::users::Roles;
use crate::storage::FileStorage;

const JOURNAL_FORBIDDEN: &str = "Only professionals can manage journal entries";

/// GET /api/auth/mood-updates/
pub async fn get_mood_updates(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    match mood_db::list_for_user(db.get_ref(), user.0.id).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch mood updates: {e}"),
        })),
    }
}

/// POST /api/auth/mood-updates/
pub async fn create_mood_update(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateMoodUpdate>,
) -> Result<HttpResponse, ApiError> {
    let update = mood_db::create(db.get_ref(), user.0.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(update))
}

/// GET /api/auth/journal-entries/?client_id=&personal=
///
/// Non-professionals get an empty list.
pub async fn get_journal_entries(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    query: web::Query<JournalQuery>,
) -> impl Responder {
    if user.0.role != Roles::Professional {
        return HttpResponse::Ok().json(Vec::<serde_json::Value>::new());
    }
    match journal_db::list(db.get_ref(), user.0.id, &query).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch journal entries: {e}"),
        })),
    }
}

/// POST /api/auth/journal-entries/
pub async fn create_journal_entry(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<Arc<dyn FileStorage>>,
    body: web::Json<CreateJournalEntry>,
) -> Result<HttpResponse, ApiError> {
    require_role(&user.0, Roles::Professional, JOURNAL_FORBIDDEN)?;
    let entry = journal_db::create(
        db.get_ref(),
        storage.get_ref().as_ref(),
        &user.0,
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(entry))
}

/// GET /api/auth/journal-entries/{id}/
pub async fn get_journal_entry(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    require_role(&user.0, Roles::Professional, JOURNAL_FORBIDDEN)?;
    let entry = journal_db::get_own(db.get_ref(), user.0.id, path.into_inner()).await?;
    let mut resp = journal_db::to_responses(db.get_ref(), vec![entry]).await?;
    Ok(HttpResponse::Ok().json(resp.pop()))
}

/// PUT/PATCH /api/auth/journal-entries/{id}/
pub async fn update_journal_entry(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateJournalEntry>,
) -> Result<HttpResponse, ApiError> {
    require_role(&user.0, Roles::Professional, JOURNAL_FORBIDDEN)?;
    let entry = journal_db::get_own(db.get_ref(), user.0.id, path.into_inner()).await?;
    let updated = journal_db::update(db.get_ref(), entry, body.into_inner()).await?;
    let mut resp = journal_db::to_responses(db.get_ref(), vec![updated]).await?;
    Ok(HttpResponse::Ok().json(resp.pop()))
}

/// DELETE /api/auth/journal-entries/{id}/
pub async fn delete_journal_entry(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    require_role(&user.0, Roles::Professional, JOURNAL_FORBIDDEN)?;
    let entry = journal_db::get_own(db.get_ref(), user.0.id, path.into_inner()).await?;
    journal_db::delete(db.get_ref(), entry.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
