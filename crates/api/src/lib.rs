//! BizHub API server library.
//!
//! Exposes the authentication core (credential verification, token issuance,
//! session lifecycle, cleanup sweep) together with the HTTP building blocks
//! (config, state, error handling, routes) so integration tests and the
//! binary entrypoint can both access them.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
