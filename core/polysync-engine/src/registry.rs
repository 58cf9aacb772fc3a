//! Source registry: the static set of sources configured for one common type.

use crate::error::{SyncError, SyncResult};
use crate::source::SourceDescriptor;
use polysync_types::SourceScope;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Source descriptors for one common type, partitioned by scope.
///
/// Declaration order is kept within each partition; flow resolution relies
/// on it for tie-breaking.
#[derive(Clone)]
pub struct SourceRegistry {
    global: Vec<Arc<dyn SourceDescriptor>>,
    context: Vec<Arc<dyn SourceDescriptor>>,
}

impl SourceRegistry {
    /// Builds the registry. Fails on duplicate source ids.
    pub fn new(sources: Vec<Arc<dyn SourceDescriptor>>) -> SyncResult<Self> {
        let mut seen = HashSet::new();
        let mut global = Vec::new();
        let mut context = Vec::new();

        for source in sources {
            let id = source.info().id.clone();
            if !seen.insert(id.clone()) {
                return Err(SyncError::DuplicateSource(id));
            }
            match source.scope() {
                SourceScope::Global => global.push(source),
                SourceScope::Context => context.push(source),
            }
        }

        Ok(Self { global, context })
    }

    /// Sources that need no per-entity context.
    pub fn global(&self) -> &[Arc<dyn SourceDescriptor>] {
        &self.global
    }

    /// Sources that need per-entity context.
    pub fn context(&self) -> &[Arc<dyn SourceDescriptor>] {
        &self.context
    }

    /// Looks a source up by id, in either partition.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn SourceDescriptor>> {
        self.global
            .iter()
            .chain(self.context.iter())
            .find(|d| d.info().id == id)
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.context.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids = |v: &[Arc<dyn SourceDescriptor>]| -> Vec<String> {
            v.iter().map(|d| d.info().id.clone()).collect()
        };
        f.debug_struct("SourceRegistry")
            .field("global", &ids(&self.global))
            .field("context", &ids(&self.context))
            .finish()
    }
}
