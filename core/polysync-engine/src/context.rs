//! Context loading: which sources are relevant for one entity.
//!
//! The embedding application supplies a [`ContextLoader`] per common type.
//! Per run it returns a [`RelevanceDescriptor`] naming the global sources
//! that apply to the entity and, for context-scoped sources, the payload
//! each one needs.

use crate::registry::SourceRegistry;
use crate::source::SourceContext;
use async_trait::async_trait;
use polysync_types::{EntityIdentity, SourceError, SourceRole};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A global source that applies to the entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRelevance {
    pub source_id: String,
    /// Overrides the source's default role for this run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<SourceRole>,
}

/// A context source that applies to the entity, with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRelevance {
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<SourceRole>,
    pub context: SourceContext,
}

/// Per-entity, per-run description of the relevant sources.
///
/// Sources not listed here do not take part in the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceDescriptor {
    #[serde(default)]
    pub global_sources: Vec<GlobalRelevance>,
    #[serde(default)]
    pub context_sources: Vec<ContextRelevance>,
}

impl RelevanceDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a global source using its default role.
    pub fn with_global(mut self, source_id: impl Into<String>) -> Self {
        self.global_sources.push(GlobalRelevance {
            source_id: source_id.into(),
            role: None,
        });
        self
    }

    /// Adds a global source with an explicit role.
    pub fn with_global_role(mut self, source_id: impl Into<String>, role: SourceRole) -> Self {
        self.global_sources.push(GlobalRelevance {
            source_id: source_id.into(),
            role: Some(role),
        });
        self
    }

    /// Adds a context source using its default role.
    pub fn with_context(mut self, source_id: impl Into<String>, context: SourceContext) -> Self {
        self.context_sources.push(ContextRelevance {
            source_id: source_id.into(),
            role: None,
            context,
        });
        self
    }

    /// Adds a context source with an explicit role.
    pub fn with_context_role(
        mut self,
        source_id: impl Into<String>,
        context: SourceContext,
        role: SourceRole,
    ) -> Self {
        self.context_sources.push(ContextRelevance {
            source_id: source_id.into(),
            role: Some(role),
            context,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.global_sources.is_empty() && self.context_sources.is_empty()
    }
}

/// Describes which sources are relevant for an entity.
///
/// Called once per run, or every time sources are needed when the engine
/// runs with `dynamic_sources`, so it must be safe to call repeatedly.
#[async_trait]
pub trait ContextLoader: Send + Sync {
    async fn load(&self, entity: &EntityIdentity) -> Result<RelevanceDescriptor, SourceError>;
}

/// Marks every configured global source relevant with its default role.
/// Context sources never apply.
#[derive(Debug, Clone, Default)]
pub struct AllGlobalSources {
    source_ids: Vec<String>,
}

impl AllGlobalSources {
    pub fn from_registry(registry: &SourceRegistry) -> Self {
        Self {
            source_ids: registry
                .global()
                .iter()
                .map(|d| d.info().id.clone())
                .collect(),
        }
    }
}

#[async_trait]
impl ContextLoader for AllGlobalSources {
    async fn load(&self, _entity: &EntityIdentity) -> Result<RelevanceDescriptor, SourceError> {
        Ok(self
            .source_ids
            .iter()
            .fold(RelevanceDescriptor::new(), |d, id| d.with_global(id.as_str())))
    }
}

/// Adapts an async closure into a [`ContextLoader`].
pub struct FnContextLoader<F>(F);

impl<F, Fut> FnContextLoader<F>
where
    F: Fn(EntityIdentity) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RelevanceDescriptor, SourceError>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> ContextLoader for FnContextLoader<F>
where
    F: Fn(EntityIdentity) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RelevanceDescriptor, SourceError>> + Send + 'static,
{
    async fn load(&self, entity: &EntityIdentity) -> Result<RelevanceDescriptor, SourceError> {
        (self.0)(entity.clone()).await
    }
}
