//! Per-source invocation wrapper.
//!
//! Whatever a source does (return `Err`, or panic) comes back as a
//! [`SyncEntityResult`]. Deciding whether a failure aborts the run is the
//! engine's job, not the source's.

use crate::instantiate::LiveSource;
use futures::FutureExt;
use polysync_types::{EntityIdentity, SourceError, SourceLocalEntity, SyncEntityResult};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

/// Which source operation to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyncMode {
    Update,
    Delete,
}

impl SyncMode {
    pub(crate) fn delete_if(delete: bool) -> Self {
        if delete { Self::Delete } else { Self::Update }
    }
}

pub(crate) async fn invoke(
    source: &LiveSource,
    entity: &EntityIdentity,
    mode: SyncMode,
) -> SyncEntityResult {
    debug!("Invoking {} ({}) mode={:?}", source.info.id, source.role, mode);

    let call = match mode {
        SyncMode::Update => source.instance.synchronize(),
        SyncMode::Delete => source.instance.synchronize_delete(),
    };

    let error = match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(result)) => {
            debug!("{} -> {}", source.info.id, result.status);
            return result;
        }
        Ok(Err(err)) => err,
        Err(payload) => SourceError::Panicked(panic_message(&*payload)),
    };

    warn!("Source {} raised an error: {}", source.info.id, error);
    SyncEntityResult::error(
        SourceLocalEntity::unknown(entity.clone(), source.info.clone()),
        error,
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
