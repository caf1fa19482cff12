//! Access and refresh token signing
//!
//! Both token kinds are HMAC-signed with the same secret; the `kind`
//! claim keeps a refresh token from passing as an access token.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

/// Token signing and verification errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is malformed or its signature does not verify")]
    Invalid,

    #[error("Token is a {0} token, which is not accepted here")]
    WrongKind(TokenKind),

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Whether a token grants API access or only a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried by both token kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Account email at issue time
    pub email: String,
    /// Unique token ID
    pub jti: Uuid,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
    /// Access or refresh
    pub kind: TokenKind,
}

/// Issues and verifies the access/refresh token pair.
///
/// Holds the shared secret and the per-kind lifetimes so call sites
/// never handle raw key material.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: String, access_ttl_seconds: i64, refresh_ttl_days: i64) -> Self {
        Self {
            secret,
            access_ttl: Duration::seconds(access_ttl_seconds),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    /// Access token lifetime in seconds, for `expires_in` fields
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Sign a token of the given kind for a user
    pub fn sign(&self, user: &User, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            kind,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and require it to be of the expected kind
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        if data.claims.kind != expected {
            return Err(TokenError::WrongKind(data.claims.kind));
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            password_hash: "$2b$12$irrelevant".to_string(),
            display_name: "Test User".to_string(),
            location: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret-key".to_string(), 900, 7)
    }

    #[test]
    fn test_access_token_round_trip() {
        let user = test_user();
        let token = signer().sign(&user, TokenKind::Access).unwrap();
        assert!(!token.is_empty());

        let claims = signer().verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let user = test_user();
        let token = signer().sign(&user, TokenKind::Refresh).unwrap();

        let err = signer().verify(&token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, TokenError::WrongKind(TokenKind::Refresh)));

        // But it does verify as what it is
        let claims = signer().verify(&token, TokenKind::Refresh).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = signer()
            .verify("not.a.token", TokenKind::Access)
            .unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let user = test_user();
        let token = signer().sign(&user, TokenKind::Access).unwrap();

        let other = TokenSigner::new("different-secret".to_string(), 900, 7);
        let err = other.verify(&token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn test_each_token_gets_its_own_jti() {
        let user = test_user();
        let s = signer();
        let a = s.sign(&user, TokenKind::Access).unwrap();
        let b = s.sign(&user, TokenKind::Access).unwrap();

        let ca = s.verify(&a, TokenKind::Access).unwrap();
        let cb = s.verify(&b, TokenKind::Access).unwrap();
        assert_ne!(ca.jti, cb.jti);
    }
}
