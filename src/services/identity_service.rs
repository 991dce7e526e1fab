use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::identity::{Claims, Identity};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token subject is not a user id: {0}")]
    InvalidSubject(String),
}

/// Resolves bearer tokens to users and answers role questions about them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_user(&self, token: &str) -> std::result::Result<Identity, AuthError>;

    async fn has_role(&self, identity: &Identity, role: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct IdentityService {
    pool: PgPool,
    jwt_secret: String,
}

impl IdentityService {
    pub fn new(pool: PgPool, jwt_secret: String) -> Self {
        Self { pool, jwt_secret }
    }
}

pub fn decode_identity(token: &str, secret: &str) -> std::result::Result<Identity, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    // Platform tokens carry an "authenticated" audience we do not pin.
    validation.validate_aud = false;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    let user_id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| AuthError::InvalidSubject(data.claims.sub.clone()))?;

    Ok(Identity {
        user_id,
        email: data.claims.email,
    })
}

#[async_trait]
impl IdentityProvider for IdentityService {
    async fn resolve_user(&self, token: &str) -> std::result::Result<Identity, AuthError> {
        decode_identity(token, &self.jwt_secret)
    }

    async fn has_role(&self, identity: &Identity, role: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2)"#,
        )
        .bind(identity.user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
