//! Middleware for the BorrowPal API
//!
//! Request tracing, security headers, and authentication extraction.

pub mod auth;
mod security;
mod tracing;

pub use auth::AuthenticatedUser;
pub use security::security_headers;
pub use tracing::request_tracing;
