//! Type registry: the external entry point, routing by common type.

use crate::engine::Reconciler;
use crate::error::{SyncError, SyncResult};
use polysync_types::{EntityRef, RunResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Immutable mapping from common type to its reconciliation engine.
///
/// Built once at startup and shared by reference (or `Arc`).
#[derive(Clone, Default)]
pub struct TypeRegistry {
    engines: HashMap<String, Arc<Reconciler>>,
}

impl TypeRegistry {
    /// Builds the registry, keyed by each engine's common type.
    /// Fails if two engines claim the same common type.
    pub fn new(engines: impl IntoIterator<Item = Reconciler>) -> SyncResult<Self> {
        let mut map = HashMap::new();
        for engine in engines {
            let common_type = engine.common_type().to_string();
            if map.contains_key(&common_type) {
                return Err(SyncError::DuplicateCommonType(common_type));
            }
            map.insert(common_type, Arc::new(engine));
        }
        Ok(Self { engines: map })
    }

    /// Synchronizes one entity.
    ///
    /// `entity` may be a bare common id or a full identity. A full identity
    /// must belong to `common_type`. When the engine has a run timeout the
    /// whole run is cancelled once it expires.
    pub async fn synchronize(
        &self,
        common_type: &str,
        entity: impl Into<EntityRef>,
    ) -> SyncResult<RunResult> {
        let engine = self
            .get(common_type)
            .ok_or_else(|| SyncError::UnregisteredCommonType(common_type.to_string()))?;
        let identity = entity.into().into_identity(common_type);
        debug!("Dispatching {} to its engine", identity);

        match engine.config().run_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, engine.reconcile(&identity))
                .await
                .map_err(|_| SyncError::Timeout {
                    entity: identity.clone(),
                    timeout,
                })?,
            None => engine.reconcile(&identity).await,
        }
    }

    pub fn get(&self, common_type: &str) -> Option<&Arc<Reconciler>> {
        self.engines.get(common_type)
    }

    pub fn contains(&self, common_type: &str) -> bool {
        self.engines.contains_key(common_type)
    }

    /// Registered common types, sorted.
    pub fn common_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}
