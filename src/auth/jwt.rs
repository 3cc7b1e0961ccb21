use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::users::{self, Roles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by every token this server issues.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user's UUID.
    pub sub: String,
    pub role: Roles,
    pub token_type: TokenType,
    /// Expiration (Unix timestamp).
    pub exp: usize,
    /// Issued-at (Unix timestamp).
    pub iat: usize,
}

impl Claims {
    pub fn new(user_id: Uuid, role: Roles, token_type: TokenType, ttl: Duration) -> Self {
        let now = Utc::now().timestamp() as usize;
        Self {
            sub: user_id.to_string(),
            role,
            token_type,
            exp: now + ttl.as_secs() as usize,
            iat: now,
        }
    }

    /// Extract the user UUID from the `sub` claim.
    pub fn user_id(&self) -> Result<Uuid, String> {
        Uuid::parse_str(&self.sub).map_err(|e| format!("Invalid UUID in sub claim: {e}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and validates HS256 tokens. Shared through app data.
#[derive(Clone)]
pub struct JwtService {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    pub fn issue(&self, user: &users::Model, token_type: TokenType) -> Result<String, String> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims::new(user.id, user.role, token_type, ttl);
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| format!("Failed to sign token: {e}"))
    }

    pub fn issue_pair(&self, user: &users::Model) -> Result<TokenPair, String> {
        Ok(TokenPair {
            access: self.issue(user, TokenType::Access)?,
            refresh: self.issue(user, TokenType::Refresh)?,
        })
    }

    /// Validate a token and require it to be of `expected` type.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, String> {
        let claims = validate_token(token, &self.secret)?;
        if claims.token_type != expected {
            return Err(format!(
                "Token has wrong type: expected {expected:?}, got {:?}",
                claims.token_type
            ));
        }
        Ok(claims)
    }
}

/// Validate a HS256 token signed with `secret` and return the decoded claims.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, String> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
