//! Authentication module for JWT-based auth with email and password login.
//!
//! This module provides:
//! - Argon2 password hashing
//! - JWT token creation and validation
//! - Register, login, logout and `me` handlers
//! - `require_auth` middleware for protecting routes

mod handlers;
mod jwt;
mod middleware;
mod password;
pub mod types;

pub use handlers::{login, logout, me, register};
pub use middleware::{build_auth_cookie, build_logout_cookie, require_auth};
pub use types::{AuthConfig, AuthUser};

#[cfg(test)]
pub(crate) use jwt::create_token;
