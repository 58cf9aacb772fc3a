//! Per-source and per-run synchronization results.

use crate::{EntityIdentity, RunId, SourceInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A source's own representation of an entity, kept for traceability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocalEntity {
    /// The source-local id. `None` when the source failed before it could
    /// resolve one.
    pub local_id: Option<String>,
    pub identity: EntityIdentity,
    pub source: SourceInfo,
}

impl SourceLocalEntity {
    pub fn new(local_id: impl Into<String>, identity: EntityIdentity, source: SourceInfo) -> Self {
        Self {
            local_id: Some(local_id.into()),
            identity,
            source,
        }
    }

    /// Best-effort entity for when the source-local id is not known.
    pub fn unknown(identity: EntityIdentity, source: SourceInfo) -> Self {
        Self {
            local_id: None,
            identity,
            source,
        }
    }
}

impl fmt::Display for SourceLocalEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.local_id {
            Some(local) => write!(f, "{} @ {} [{}]", self.identity, self.source.id, local),
            None => write!(f, "{} @ {}", self.identity, self.source.id),
        }
    }
}

/// Outcome of one source invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    NoChange,
    Synchronized,
    Deleted,
    /// The source ran and reported that it could not synchronize.
    Failed,
    /// The source raised an error; captured by the engine.
    Error,
}

impl SyncStatus {
    /// Returns true for `Failed` and `Error`.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoChange => "nochange",
            Self::Synchronized => "synchronized",
            Self::Deleted => "deleted",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by, or captured from, a source.
///
/// Cloneable and serializable so it can travel inside results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum SourceError {
    /// The remote system rejected the operation.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The remote system could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The source future panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

impl SourceError {
    /// Wraps any displayable error.
    pub fn other(err: impl fmt::Display) -> Self {
        Self::Other(err.to_string())
    }
}

/// Result of synchronizing one entity against one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEntityResult {
    pub entity: SourceLocalEntity,
    pub status: SyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SourceError>,
}

impl SyncEntityResult {
    pub fn new(entity: SourceLocalEntity, status: SyncStatus) -> Self {
        Self {
            entity,
            status,
            error: None,
        }
    }

    pub fn no_change(entity: SourceLocalEntity) -> Self {
        Self::new(entity, SyncStatus::NoChange)
    }

    pub fn synchronized(entity: SourceLocalEntity) -> Self {
        Self::new(entity, SyncStatus::Synchronized)
    }

    pub fn deleted(entity: SourceLocalEntity) -> Self {
        Self::new(entity, SyncStatus::Deleted)
    }

    pub fn failed(entity: SourceLocalEntity, reason: impl Into<String>) -> Self {
        Self {
            entity,
            status: SyncStatus::Failed,
            error: Some(SourceError::Rejected(reason.into())),
        }
    }

    pub fn error(entity: SourceLocalEntity, error: SourceError) -> Self {
        Self {
            entity,
            status: SyncStatus::Error,
            error: Some(error),
        }
    }

    /// The id of the source that produced this result.
    pub fn source_id(&self) -> &str {
        &self.entity.source.id
    }
}

/// Ordered outcome of one reconciliation run: primary first, then
/// secondaries in flow order, then replicas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: RunId,
    pub target: EntityIdentity,
    pub results: Vec<SyncEntityResult>,
    /// True when a secondary forced a delete restart; `results` then holds
    /// only the restarted pass.
    #[serde(default)]
    pub restarted: bool,
}

impl RunResult {
    /// The primary source's result. Absent only for hand-built values.
    pub fn primary(&self) -> Option<&SyncEntityResult> {
        self.results.first()
    }

    /// True when the primary reported the entity as deleted.
    pub fn is_deleted(&self) -> bool {
        self.primary()
            .is_some_and(|r| r.status == SyncStatus::Deleted)
    }

    /// Results with a `Failed` or `Error` status. After a successful run
    /// these can only come from replicas.
    pub fn failures(&self) -> impl Iterator<Item = &SyncEntityResult> {
        self.results.iter().filter(|r| r.status.is_failure())
    }

    /// First result produced by the given source.
    pub fn result_for(&self, source_id: &str) -> Option<&SyncEntityResult> {
        self.results.iter().find(|r| r.source_id() == source_id)
    }

    pub fn statuses(&self) -> Vec<SyncStatus> {
        self.results.iter().map(|r| r.status).collect()
    }
}
