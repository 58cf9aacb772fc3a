//! Core type definitions for polysync.
//!
//! This crate defines the plain, integration-agnostic data model shared by
//! the engine and by source integrations:
//! - Entity identity (`commonType` / `commonId`) and source identity
//! - Source roles and scopes
//! - Per-source synchronization results and aggregated run results
//!
//! Nothing here performs I/O. Orchestration lives in `polysync-engine`.

mod ids;
mod result;
mod role;

pub use ids::{EntityIdentity, EntityRef, RunId, SourceInfo};
pub use result::{RunResult, SourceError, SourceLocalEntity, SyncEntityResult, SyncStatus};
pub use role::{SourceRole, SourceScope};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid entity identity: {0}")]
    InvalidIdentity(String),

    #[error("unknown source role: {0}")]
    UnknownRole(String),
}
