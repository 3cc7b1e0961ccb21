use actix_web::FromRequest;
use actix_web::{Error, HttpRequest, dev::Payload, web};
use sea_orm::DatabaseConnection;
use std::future::Future;
use std::pin::Pin;

use crate::auth::jwt::{JwtService, TokenType};
use crate::db::users::get_user_by_id;
use crate::models::users;

pub struct AuthenticatedUser(pub users::Model);

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            // 1. Extract the Bearer token from the Authorization header.
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    actix_web::error::ErrorUnauthorized("Missing Authorization header")
                })?;

            let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
                actix_web::error::ErrorUnauthorized("Authorization header must be: Bearer <token>")
            })?;

            let jwt = req.app_data::<web::Data<JwtService>>().ok_or_else(|| {
                actix_web::error::ErrorInternalServerError("JWT service not configured")
            })?;

            let db = req
                .app_data::<web::Data<DatabaseConnection>>()
                .ok_or_else(|| {
                    actix_web::error::ErrorInternalServerError("Database not configured")
                })?;

            let user = authenticate(token, jwt.get_ref(), db.get_ref()).await?;
            Ok(AuthenticatedUser(user))
        })
    }
}

/// Resolve an access token to an active user. Also used by the WebSocket
/// upgrade, where the token travels in the query string.
pub async fn authenticate(
    token: &str,
    jwt: &JwtService,
    db: &DatabaseConnection,
) -> Result<users::Model, Error> {
    let claims = jwt
        .validate(token, TokenType::Access)
        .map_err(|e| actix_web::error::ErrorUnauthorized(format!("Invalid token: {e}")))?;

    let user_id = claims
        .user_id()
        .map_err(actix_web::error::ErrorUnauthorized)?;

    let user = get_user_by_id(db, user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(format!("Database error: {e}")))?
        .ok_or_else(|| actix_web::error::ErrorUnauthorized("User not found"))?;

    if !user.is_active {
        return Err(actix_web::error::ErrorUnauthorized("User account is disabled"));
    }

    Ok(user)
}
