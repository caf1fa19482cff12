//! Request authentication
//!
//! Handlers take an [`AuthenticatedUser`] argument; the extractor
//! verifies the Bearer access token and rejects the request before the
//! handler runs when the token is missing, expired, or not an access
//! token.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthService, TokenError, TokenKind};
use crate::error::ApiError;

/// The caller, as proven by their access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub token_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                    .into_response()
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = auth_service
            .signer()
            .verify(bearer.token(), TokenKind::Access)
            .map_err(|e| {
                let message = match e {
                    TokenError::Expired => "Access token has expired",
                    TokenError::WrongKind(_) => "A refresh token cannot be used for API access",
                    _ => "Invalid access token",
                };
                ApiError::Unauthorized(message.to_string()).into_response()
            })?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            email: claims.email,
            token_id: claims.jti,
        })
    }
}
