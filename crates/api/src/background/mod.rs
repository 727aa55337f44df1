//! Background tasks and scheduled jobs.
//!
//! Each task is owned by an explicit lifecycle object created in `main`
//! and stopped there during graceful shutdown via a [`CancellationToken`].
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod session_cleanup;

pub use session_cleanup::SessionCleanup;
