//! Shared types and domain errors used by every BizHub crate.

pub mod error;
pub mod types;
