//! Authentication and session-lifecycle core.
//!
//! - [`password`] -- Argon2id hashing and the [`password::CredentialVerifier`].
//! - [`jwt`] -- bearer-token minting/verification ([`jwt::TokenIssuer`]).
//! - [`session`] -- the [`session::SessionLifecycleManager`] state machine.
//! - [`error`] -- the caller-facing [`error::AuthError`] taxonomy.

pub mod error;
pub mod jwt;
pub mod password;
pub mod session;

pub use error::{AuthError, AuthResult};
pub use session::{AuthenticatedSession, LoginOutcome, SessionIdentity, SessionLifecycleManager};
