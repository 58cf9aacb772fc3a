//! Error types for the reconciliation engine.

use polysync_types::{EntityIdentity, SourceError, SourceLocalEntity, SyncStatus};
use std::time::Duration;
use thiserror::Error;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a reconciliation run or reject a configuration.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No engine is registered for the requested common type.
    #[error("unregistered common type: {0}")]
    UnregisteredCommonType(String),

    /// No relevant source resolved to the primary role.
    #[error("no primary source for {entity}")]
    NoPrimarySource { entity: EntityIdentity },

    /// More than one relevant source resolved to the primary role.
    #[error("multiple primary sources for {entity}: {}", sources.join(", "))]
    MultiplePrimarySources {
        entity: EntityIdentity,
        sources: Vec<String>,
    },

    /// A primary or secondary source reported `failed` or `error`.
    #[error("synchronization failed for {entity}: source reported {status}")]
    SynchronizationFailed {
        entity: Box<SourceLocalEntity>,
        status: SyncStatus,
        #[source]
        cause: Option<SourceError>,
    },

    /// Two source descriptors share an id.
    #[error("duplicate source id: {0}")]
    DuplicateSource(String),

    /// Two engines were registered for the same common type.
    #[error("duplicate common type: {0}")]
    DuplicateCommonType(String),

    /// An identity was routed to an engine for another common type.
    #[error("common type mismatch: engine handles {expected}, got {actual}")]
    CommonTypeMismatch {
        expected: String,
        actual: EntityIdentity,
    },

    /// The context loader could not describe the relevant sources.
    #[error("context load failed for {entity}: {reason}")]
    ContextLoad {
        entity: EntityIdentity,
        reason: SourceError,
    },

    /// A source could not be instantiated for this run.
    #[error("instantiation of source {source_id} failed: {reason}")]
    Instantiation {
        source_id: String,
        reason: SourceError,
    },

    /// The run did not finish within the configured timeout.
    #[error("synchronization of {entity} timed out after {timeout:?}")]
    Timeout {
        entity: EntityIdentity,
        timeout: Duration,
    },

    /// Invalid engine configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Misconfiguration that must not be retried without operator action.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnregisteredCommonType(_)
                | Self::NoPrimarySource { .. }
                | Self::MultiplePrimarySources { .. }
                | Self::DuplicateSource(_)
                | Self::DuplicateCommonType(_)
                | Self::CommonTypeMismatch { .. }
                | Self::Config(_)
                | Self::Serialization(_)
        )
    }

    /// Failures a caller may reasonably retry later by re-invoking the run.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SynchronizationFailed { .. }
                | Self::ContextLoad { .. }
                | Self::Instantiation { .. }
                | Self::Timeout { .. }
        )
    }
}
