use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::jwt::{JwtService, TokenType};
use crate::auth::middleware::AuthenticatedUser;
use crate::auth::password;
use crate::cache::RedisCache;
use crate::db::users as user_db;
use crate::errors::ApiError;
use crate::models::users::{
    self, LoginRequest, RefreshRequest, RegisterUser, Roles, UpdateUser,
};
use crate::storage::FileStorage;

async fn hash(password: String) -> Result<String, ApiError> {
    web::block(move || password::hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .map_err(ApiError::internal)
}

/// POST /api/auth/register/
///
/// Returns 201 with the new user. When the professional documents could not
/// be stored the account is still created and `partial_failure` says why.
pub async fn register(
    db: web::Data<DatabaseConnection>,
    storage: web::Data<Arc<dyn FileStorage>>,
    body: web::Json<RegisterUser>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();

    if input.username.trim().is_empty() {
        return Err(ApiError::bad_request("Username is required."));
    }
    if input.role == Some(Roles::Admin) {
        return Err(ApiError::bad_request("Admin accounts cannot be created at signup."));
    }
    password::validate_email(&input.email).map_err(ApiError::BadRequest)?;
    if user_db::username_taken(db.get_ref(), &input.username, None).await? {
        return Err(ApiError::bad_request("A user with that username already exists."));
    }
    if user_db::email_taken(db.get_ref(), &input.email, None).await? {
        return Err(ApiError::bad_request("A user with that email already exists."));
    }
    password::validate_password_strength(
        &input.password,
        &input.first_name,
        &input.last_name,
        &input.email,
    )
    .map_err(ApiError::BadRequest)?;

    let password_hash = hash(input.password.clone()).await?;
    let registration =
        user_db::register_user(db.get_ref(), storage.get_ref().as_ref(), input, password_hash)
            .await
            .map_err(|e| {
                tracing::error!("signup failed: {e}");
                ApiError::internal(format!("Registration failed: {e}"))
            })?;

    let mut body = serde_json::to_value(&registration.user)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if let (Some(reason), Some(obj)) = (registration.partial_failure, body.as_object_mut()) {
        obj.insert("partial_failure".to_string(), serde_json::Value::String(reason));
    }
    Ok(HttpResponse::Created().json(body))
}

/// POST /api/auth/login/
pub async fn login(
    db: web::Data<DatabaseConnection>,
    jwt: web::Data<JwtService>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { username, password: given } = body.into_inner();
    let invalid = || ApiError::Unauthorized("No active account found with the given credentials".into());

    let user = user_db::find_by_login(db.get_ref(), &username)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(invalid)?;

    let stored = user.password_hash.clone();
    let matches = web::block(move || password::verify_password(&given, &stored))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !matches {
        return Err(invalid());
    }

    let tokens = jwt.issue_pair(&user).map_err(ApiError::internal)?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(HttpResponse::Ok().json(tokens))
}

/// POST /api/auth/token/refresh/
pub async fn refresh(
    db: web::Data<DatabaseConnection>,
    jwt: web::Data<JwtService>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = jwt
        .validate(&body.refresh, TokenType::Refresh)
        .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {e}")))?;
    let user_id = claims.user_id().map_err(ApiError::Unauthorized)?;

    let user = user_db::get_user_by_id(db.get_ref(), user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let access = jwt.issue(&user, TokenType::Access).map_err(ApiError::internal)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "access": access })))
}

/// GET /api/auth/me/
pub async fn me(user: AuthenticatedUser, db: web::Data<DatabaseConnection>) -> impl Responder {
    match user_db::user_response(db.get_ref(), user.0).await {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        })),
    }
}

/// Validate the identity fields of an update and hash a new password.
pub(crate) async fn prepare_update(
    db: &DatabaseConnection,
    target: &users::Model,
    input: &UpdateUser,
) -> Result<Option<String>, ApiError> {
    if let Some(username) = &input.username {
        if username.trim().is_empty() {
            return Err(ApiError::bad_request("Username cannot be blank."));
        }
        if user_db::username_taken(db, username, Some(target.id)).await? {
            return Err(ApiError::bad_request("A user with that username already exists."));
        }
    }
    if let Some(email) = &input.email {
        password::validate_email(email).map_err(ApiError::BadRequest)?;
        if user_db::email_taken(db, email, Some(target.id)).await? {
            return Err(ApiError::bad_request("A user with that email already exists."));
        }
    }

    match &input.password {
        Some(pw) => {
            let first = input.first_name.as_deref().unwrap_or(&target.first_name);
            let last = input.last_name.as_deref().unwrap_or(&target.last_name);
            let email = input.email.as_deref().unwrap_or(&target.email);
            password::validate_password_strength(pw, first, last, email)
                .map_err(ApiError::BadRequest)?;
            Ok(Some(hash(pw.clone()).await?))
        }
        None => Ok(None),
    }
}

/// PUT/PATCH /api/auth/me/
///
/// Users cannot change their own role or active flag.
pub async fn update_me(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<Arc<RedisCache>>,
    body: web::Json<UpdateUser>,
) -> Result<HttpResponse, ApiError> {
    let mut input = body.into_inner();
    input.role = None;
    input.is_active = None;

    let password_hash = prepare_update(db.get_ref(), &user.0, &input).await?;
    let user_id = user.0.id;
    let updated = user_db::update_user(db.get_ref(), user.0, input, password_hash).await?;
    cache.invalidate_user(user_id).await;

    Ok(HttpResponse::Ok().json(updated))
}
