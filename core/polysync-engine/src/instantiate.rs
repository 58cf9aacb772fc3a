//! Source instantiation: turns a resolved flow into live per-run handles.

use crate::error::{SyncError, SyncResult};
use crate::flow::FlowEntry;
use crate::source::SourceInstance;
use futures::future::try_join_all;
use polysync_types::{EntityIdentity, SourceInfo, SourceRole};
use std::fmt;
use tracing::debug;

/// A live source handle for one run, in flow order.
pub struct LiveSource {
    pub info: SourceInfo,
    pub role: SourceRole,
    pub instance: Box<dyn SourceInstance>,
}

impl fmt::Debug for LiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSource")
            .field("source", &self.info.id)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Instantiates every entry of the flow, `unset` ones included.
///
/// All instances are created before any of them is invoked. The first
/// failure aborts with [`SyncError::Instantiation`]; order is preserved.
pub async fn instantiate_flow(
    entity: &EntityIdentity,
    flow: &[FlowEntry],
) -> SyncResult<Vec<LiveSource>> {
    try_join_all(flow.iter().map(|entry| async move {
        let info = entry.info().clone();
        debug!("Instantiating {} as {}", info.id, entry.role);
        let instance = entry
            .descriptor
            .instantiate(entity, entry.role, entry.context.as_ref())
            .await
            .map_err(|reason| SyncError::Instantiation {
                source_id: info.id.clone(),
                reason,
            })?;
        Ok::<_, SyncError>(LiveSource {
            info,
            role: entry.role,
            instance,
        })
    }))
    .await
}
