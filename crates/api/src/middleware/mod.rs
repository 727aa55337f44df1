//! Request-boundary authentication.
//!
//! - [`auth::AuthUser`] -- Validates the bearer token and exposes the caller's
//!   user and session to handlers.

pub mod auth;
