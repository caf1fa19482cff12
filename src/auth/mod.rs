//! Authentication module for BorrowPal
//!
//! Provides email/password authentication:
//! - bcrypt password hashing
//! - JWT access and refresh token generation and validation

mod jwt;
mod service;

pub use jwt::{Claims, TokenError, TokenKind, TokenSigner};
pub use service::{AuthError, AuthService, AuthTokensResponse};
