//! Reconciliation engine: drives one entity through all of its sources.
//!
//! A run resolves the relevant sources, instantiates them, then invokes:
//! 1. the single primary source,
//! 2. every secondary source, one at a time in flow order,
//! 3. every replica source, concurrently up to `replica_concurrency`.
//!
//! A primary `deleted` result turns every later call into a delete. A
//! secondary `deleted` result the primary did not agree with restarts the
//! run in delete mode, subject to the [`RestartPolicy`]. Only primary and
//! secondary failures abort the run; replica failures are data.

use crate::config::{EngineConfig, RestartPolicy};
use crate::context::ContextLoader;
use crate::error::{SyncError, SyncResult};
use crate::flow::{FlowEntry, resolve_flow};
use crate::instantiate::{LiveSource, instantiate_flow};
use crate::invoke::{SyncMode, invoke};
use crate::registry::SourceRegistry;
use futures::stream::{self, StreamExt};
use polysync_types::{
    EntityIdentity, RunId, RunResult, SourceRole, SyncEntityResult, SyncStatus,
};
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};

/// Reconciliation engine for one common type.
pub struct Reconciler {
    /// The common type this engine handles.
    common_type: String,
    /// Statically configured sources.
    sources: SourceRegistry,
    /// Decides which sources apply to a given entity.
    loader: Arc<dyn ContextLoader>,
    config: EngineConfig,
}

impl Reconciler {
    /// Creates an engine with the default configuration.
    pub fn new(
        common_type: impl Into<String>,
        sources: SourceRegistry,
        loader: Arc<dyn ContextLoader>,
    ) -> Self {
        Self {
            common_type: common_type.into(),
            sources,
            loader,
            config: EngineConfig::default(),
        }
    }

    /// Creates an engine with a custom, validated configuration.
    pub fn with_config(
        common_type: impl Into<String>,
        sources: SourceRegistry,
        loader: Arc<dyn ContextLoader>,
        config: EngineConfig,
    ) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(common_type, sources, loader)
        })
    }

    pub fn common_type(&self) -> &str {
        &self.common_type
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    // ── Flow ─────────────────────────────────────────────────────

    /// Resolves the ordered flow for an entity without instantiating or
    /// invoking anything.
    pub async fn resolve_flow(&self, entity: &EntityIdentity) -> SyncResult<Vec<FlowEntry>> {
        self.check_type(entity)?;
        let relevance = self
            .loader
            .load(entity)
            .await
            .map_err(|reason| SyncError::ContextLoad {
                entity: entity.clone(),
                reason,
            })?;
        Ok(resolve_flow(&self.sources, &relevance))
    }

    fn check_type(&self, entity: &EntityIdentity) -> SyncResult<()> {
        if entity.common_type != self.common_type {
            return Err(SyncError::CommonTypeMismatch {
                expected: self.common_type.clone(),
                actual: entity.clone(),
            });
        }
        Ok(())
    }

    // ── Reconcile ────────────────────────────────────────────────

    /// Runs reconciliation for one entity.
    ///
    /// Returns the ordered results of the final pass, or the first fatal
    /// error. No partial result is returned on failure.
    pub async fn reconcile(&self, entity: &EntityIdentity) -> SyncResult<RunResult> {
        self.check_type(entity)?;
        let run_id = RunId::new();
        let span = info_span!(
            "reconcile",
            run_id = %run_id,
            common_type = %entity.common_type,
            common_id = %entity.common_id,
        );

        async move {
            info!("Reconciling {}", entity);
            let mut run = Run {
                engine: self,
                entity,
                cached: None,
            };
            let outcome = run.execute().await;
            match &outcome {
                Ok((results, restarted)) => info!(
                    "Reconciled {}: {} result(s), restarted={}",
                    entity,
                    results.len(),
                    restarted
                ),
                Err(e) => warn!("Reconciliation of {} failed: {}", entity, e),
            }
            let (results, restarted) = outcome?;
            Ok::<_, SyncError>(RunResult {
                run_id,
                target: entity.clone(),
                results,
                restarted,
            })
        }
        .instrument(span)
        .await
    }
}

/// What one pass over the sources ended with.
enum Pass {
    Done(Vec<SyncEntityResult>),
    /// A secondary signalled a delete the primary did not agree with.
    Restart,
}

/// State of a single run.
struct Run<'a> {
    engine: &'a Reconciler,
    entity: &'a EntityIdentity,
    /// Live sources kept for the whole run unless `dynamic_sources` is set.
    cached: Option<Arc<Vec<LiveSource>>>,
}

impl Run<'_> {
    async fn execute(&mut self) -> SyncResult<(Vec<SyncEntityResult>, bool)> {
        let mut depth = 0;
        let mut force_delete = false;
        loop {
            match self.pass(depth, force_delete).await? {
                Pass::Done(results) => return Ok((results, depth > 0)),
                Pass::Restart => {
                    depth += 1;
                    force_delete = true;
                    info!("Restarting {} in delete mode (depth {})", self.entity, depth);
                }
            }
        }
    }

    async fn live_sources(&mut self) -> SyncResult<Arc<Vec<LiveSource>>> {
        if let Some(cached) = &self.cached {
            return Ok(cached.clone());
        }
        let flow = self.engine.resolve_flow(self.entity).await?;
        let live = Arc::new(instantiate_flow(self.entity, &flow).await?);
        if !self.engine.config.dynamic_sources {
            self.cached = Some(live.clone());
        }
        Ok(live)
    }

    async fn pass(&mut self, depth: u32, force_delete: bool) -> SyncResult<Pass> {
        let sources = self.live_sources().await?;
        let primaries = with_role(&sources, SourceRole::Primary);
        let secondaries = with_role(&sources, SourceRole::Secondary);
        let replicas = with_role(&sources, SourceRole::Replica);

        let primary = match primaries.as_slice() {
            [] => {
                return Err(SyncError::NoPrimarySource {
                    entity: self.entity.clone(),
                });
            }
            [primary] => *primary,
            many => {
                return Err(SyncError::MultiplePrimarySources {
                    entity: self.entity.clone(),
                    sources: many.iter().map(|s| s.info.id.clone()).collect(),
                });
            }
        };

        let mut results = Vec::with_capacity(1 + secondaries.len() + replicas.len());

        let result = invoke(primary, self.entity, SyncMode::delete_if(force_delete)).await;
        let primary_deleted = result.status == SyncStatus::Deleted;
        results.push(ensure_ok(result)?);

        let mode = SyncMode::delete_if(primary_deleted);

        for secondary in secondaries {
            let result = ensure_ok(invoke(secondary, self.entity, mode).await)?;
            let wants_delete = result.status == SyncStatus::Deleted && !primary_deleted;
            results.push(result);

            if wants_delete {
                if self.restart_policy().allows_restart(depth) {
                    info!(
                        "Secondary {} reported {} deleted, primary did not",
                        secondary.info.id, self.entity
                    );
                    return Ok(Pass::Restart);
                }
                debug!(
                    "Secondary {} reported deleted, restart not allowed at depth {}",
                    secondary.info.id, depth
                );
            }
        }

        let limit = self.engine.config.replica_concurrency.max(1);
        let entity = self.entity;
        let mut replica_results: Vec<(usize, SyncEntityResult)> = stream::iter(replicas)
            .enumerate()
            .map(|(index, replica)| async move { (index, invoke(replica, entity, mode).await) })
            .buffer_unordered(limit)
            .collect()
            .await;
        replica_results.sort_unstable_by_key(|(index, _)| *index);

        // `error` results were already logged by `invoke`.
        for (_, failed) in replica_results
            .iter()
            .filter(|(_, r)| r.status == SyncStatus::Failed)
        {
            warn!(
                "Replica {} reported failed for {}",
                failed.source_id(),
                entity
            );
        }
        results.extend(replica_results.into_iter().map(|(_, result)| result));

        Ok(Pass::Done(results))
    }

    fn restart_policy(&self) -> RestartPolicy {
        self.engine.config.restart_policy
    }
}

/// Sources holding `role`, in flow order. `unset` sources are never selected.
fn with_role(sources: &[LiveSource], role: SourceRole) -> Vec<&LiveSource> {
    sources.iter().filter(|s| s.role == role).collect()
}

/// Escalates a primary/secondary failure into a run abort.
fn ensure_ok(result: SyncEntityResult) -> SyncResult<SyncEntityResult> {
    if result.status.is_failure() {
        return Err(SyncError::SynchronizationFailed {
            status: result.status,
            cause: result.error,
            entity: Box::new(result.entity),
        });
    }
    Ok(result)
}
