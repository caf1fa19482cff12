//! Authentication service
//!
//! Core business logic for email/password authentication.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{User, UserResponse};

use super::jwt::{TokenError, TokenKind, TokenSigner};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Password hashing failed: {0}")]
    HashingError(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::DatabaseError(e.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        AuthError::TokenError(e.to_string())
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AuthError::HashingError(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::EmailTaken => ApiError::Conflict(e.to_string()),
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::TokenError(_) => ApiError::Unauthorized(e.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(e.to_string()),
            AuthError::DatabaseError(msg) => ApiError::DatabaseError(msg),
            AuthError::HashingError(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Token pair issued on register, login and refresh
#[derive(Debug, Serialize)]
pub struct AuthTokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    signer: TokenSigner,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        db_pool: PgPool,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_days: i64,
    ) -> Self {
        Self {
            db_pool,
            signer: TokenSigner::new(jwt_secret, access_token_ttl_seconds, refresh_token_ttl_days),
        }
    }

    /// Register a new account and issue the first token pair.
    ///
    /// A zero-balance wallet row is created in the same transaction so
    /// every user has a wallet from the moment they exist.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        location: Option<String>,
    ) -> Result<AuthTokensResponse, AuthError> {
        let email = email.trim().to_ascii_lowercase();
        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.db_pool.begin().await?;

        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, password_hash, display_name, location, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&email)
        .bind(&password_hash)
        .bind(display_name)
        .bind(&location)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AuthError::EmailTaken
            }
            _ => AuthError::from(e),
        })?;

        sqlx::query(
            r#"
            INSERT INTO user_wallets (user_id, updated_at)
            VALUES ($1, $2)
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.issue_tokens(user)
    }

    /// Verify credentials and issue a token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokensResponse, AuthError> {
        let email = email.trim().to_ascii_lowercase();

        let user: User = sqlx::query_as(
            r#"
            SELECT * FROM users WHERE email = $1
            "#,
        )
        .bind(&email)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        let valid = bcrypt::verify(password, &user.password_hash)?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_tokens(user)
    }

    /// Rotate tokens using a valid refresh token
    pub async fn refresh_tokens(
        &self,
        refresh_token: &str,
    ) -> Result<AuthTokensResponse, AuthError> {
        let claims = self
            .signer
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let user = self.get_user_by_id(claims.sub).await?;

        self.issue_tokens(user)
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        sqlx::query_as(
            r#"
            SELECT * FROM users WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::UserNotFound)
    }

    fn issue_tokens(&self, user: User) -> Result<AuthTokensResponse, AuthError> {
        let access_token = self.signer.sign(&user, TokenKind::Access)?;
        let refresh_token = self.signer.sign(&user, TokenKind::Refresh)?;

        Ok(AuthTokensResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.signer.access_ttl_seconds(),
            user: user.into(),
        })
    }

    /// Token signer, for the authentication extractor
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }
}
