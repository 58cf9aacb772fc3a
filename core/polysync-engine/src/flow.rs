//! Flow resolution: effective role and processing order of relevant sources.
//!
//! Given the registry and a relevance descriptor, each relevant source gets
//! its role (explicit override, else the source default, else `unset`) and
//! the result is stably sorted primary, secondary, then replica/unset.
//! Equal ranks keep global-before-context, then declaration order.

use crate::context::RelevanceDescriptor;
use crate::registry::SourceRegistry;
use crate::source::{SourceContext, SourceDescriptor};
use polysync_types::{SourceInfo, SourceRole, SourceScope};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// One relevant source with its resolved role for a run.
#[derive(Clone)]
pub struct FlowEntry {
    pub descriptor: Arc<dyn SourceDescriptor>,
    pub role: SourceRole,
    /// Present for context-scoped sources only.
    pub context: Option<SourceContext>,
}

impl FlowEntry {
    pub fn info(&self) -> &SourceInfo {
        self.descriptor.info()
    }
}

impl fmt::Debug for FlowEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowEntry")
            .field("source", &self.info().id)
            .field("role", &self.role)
            .field("context", &self.context)
            .finish()
    }
}

fn resolve_role(descriptor: &dyn SourceDescriptor, explicit: Option<SourceRole>) -> SourceRole {
    explicit
        .or_else(|| descriptor.default_role())
        .unwrap_or(SourceRole::Unset)
}

/// Resolves roles and order for the sources relevant to one entity.
pub fn resolve_flow(registry: &SourceRegistry, relevance: &RelevanceDescriptor) -> Vec<FlowEntry> {
    warn_on_mismatched_entries(registry, relevance);

    let mut flow = Vec::new();

    for descriptor in registry.global() {
        let id = &descriptor.info().id;
        let mut matches = relevance.global_sources.iter().filter(|g| &g.source_id == id);
        let Some(entry) = matches.next() else {
            continue;
        };
        if matches.next().is_some() {
            warn!("Global source {} listed more than once, using first entry", id);
        }
        flow.push(FlowEntry {
            descriptor: descriptor.clone(),
            role: resolve_role(descriptor.as_ref(), entry.role),
            context: None,
        });
    }

    for descriptor in registry.context() {
        let id = &descriptor.info().id;
        for entry in relevance.context_sources.iter().filter(|c| &c.source_id == id) {
            flow.push(FlowEntry {
                descriptor: descriptor.clone(),
                role: resolve_role(descriptor.as_ref(), entry.role),
                context: Some(entry.context.clone()),
            });
        }
    }

    // sort_by_key is stable
    flow.sort_by_key(|e| e.role.rank());

    for entry in &flow {
        debug!("Flow: {} as {}", entry.info().id, entry.role);
    }
    flow
}

fn warn_on_mismatched_entries(registry: &SourceRegistry, relevance: &RelevanceDescriptor) {
    let expect = |id: &str, scope: SourceScope| match registry.get(id) {
        None => warn!("Relevance names unknown source {}, ignoring", id),
        Some(d) if d.scope() != scope => {
            warn!("Relevance lists {} as {:?} but it is {:?}, ignoring", id, scope, d.scope())
        }
        Some(_) => {}
    };
    for g in &relevance.global_sources {
        expect(&g.source_id, SourceScope::Global);
    }
    for c in &relevance.context_sources {
        expect(&c.source_id, SourceScope::Context);
    }
}
