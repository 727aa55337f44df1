//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row plus the input DTOs used when writing it.

pub mod session;
pub mod user;
