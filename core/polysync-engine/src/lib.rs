//! Multi-source entity reconciliation for polysync.
//!
//! One logical entity, addressed by (`commonType`, `commonId`), may live in
//! several independent systems at once: an internal database, a CRM, a
//! third-party API. This crate keeps those representations consistent
//! under a fixed precedence scheme.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Source**: integration-provided descriptor and per-run instance
//! - **Registry**: the static sources configured for a common type
//! - **Context**: per-entity relevance of sources, with context payloads
//! - **Flow**: role resolution and stable processing order
//! - **Engine**: the reconciliation run itself
//! - **Type registry**: routes a common type to its engine
//!
//! ## Run
//!
//! 1. **Resolve**: ask the context loader which sources apply, resolve roles
//! 2. **Instantiate**: create a live handle for every relevant source
//! 3. **Primary**: synchronize the single primary source
//! 4. **Secondaries**: synchronize each secondary in order; a secondary
//!    delete the primary did not agree with restarts the run in delete mode
//! 5. **Replicas**: synchronize replicas concurrently, failures are kept as data
//!
//! # Example
//!
//! ```
//! use polysync_engine::source::mock::{CallLog, ScriptedSource};
//! use polysync_engine::{AllGlobalSources, Reconciler, SourceRegistry, TypeRegistry};
//! use polysync_types::{SourceRole, SyncStatus};
//! use std::sync::Arc;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
//! # rt.block_on(async {
//! let log = CallLog::new();
//! let sources = SourceRegistry::new(vec![
//!     ScriptedSource::global("db", log.clone())
//!         .with_default_role(SourceRole::Primary)
//!         .into_arc(),
//!     ScriptedSource::global("crm", log.clone())
//!         .with_default_role(SourceRole::Secondary)
//!         .into_arc(),
//! ])
//! .unwrap();
//! let loader = Arc::new(AllGlobalSources::from_registry(&sources));
//! let registry = TypeRegistry::new([Reconciler::new("contact", sources, loader)]).unwrap();
//!
//! let run = registry.synchronize("contact", "42").await.unwrap();
//! assert_eq!(run.statuses(), vec![SyncStatus::Synchronized, SyncStatus::Synchronized]);
//! # });
//! ```

pub mod config;
pub mod context;
mod engine;
mod error;
pub mod flow;
pub mod instantiate;
mod invoke;
pub mod registry;
pub mod source;
mod type_registry;

pub use config::{DEFAULT_REPLICA_CONCURRENCY, EngineConfig, RestartPolicy};
pub use context::{
    AllGlobalSources, ContextLoader, ContextRelevance, FnContextLoader, GlobalRelevance,
    RelevanceDescriptor,
};
pub use engine::Reconciler;
pub use error::{SyncError, SyncResult};
pub use flow::{FlowEntry, resolve_flow};
pub use instantiate::{LiveSource, instantiate_flow};
pub use registry::SourceRegistry;
pub use source::{SourceContext, SourceDescriptor, SourceInstance};
pub use type_registry::TypeRegistry;
