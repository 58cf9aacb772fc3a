//! Source abstraction.
//!
//! A source is one independent system holding its own representation of an
//! entity. Integrations implement [`SourceDescriptor`] once per system; the
//! engine asks it for a per-run [`SourceInstance`] and only ever talks to
//! that instance.

use async_trait::async_trait;
use polysync_types::{
    EntityIdentity, SourceError, SourceInfo, SourceRole, SourceScope, SyncEntityResult,
};

/// Per-entity data a context-scoped source needs (e.g. a user credential).
pub type SourceContext = serde_json::Value;

/// A live, per-run handle onto one source for one entity.
///
/// Errors returned here are captured by the engine and reported as an
/// `error` result; they never propagate on their own.
#[async_trait]
pub trait SourceInstance: Send + Sync {
    /// Reconciles the entity against this source.
    async fn synchronize(&self) -> Result<SyncEntityResult, SourceError>;

    /// Reconciles the entity against this source, telling it the entity is
    /// being removed.
    async fn synchronize_delete(&self) -> Result<SyncEntityResult, SourceError>;
}

/// Static, process-lifetime description of a source.
#[async_trait]
pub trait SourceDescriptor: Send + Sync {
    /// Identity of the source.
    fn info(&self) -> &SourceInfo;

    /// Whether the source needs per-entity context.
    fn scope(&self) -> SourceScope;

    /// Role used when the context loader does not override it.
    fn default_role(&self) -> Option<SourceRole> {
        None
    }

    /// Produces a live handle for one run. May perform I/O.
    async fn instantiate(
        &self,
        entity: &EntityIdentity,
        role: SourceRole,
        context: Option<&SourceContext>,
    ) -> Result<Box<dyn SourceInstance>, SourceError>;
}

/// A scripted source for testing.
pub mod mock {
    use super::*;
    use polysync_types::{SourceLocalEntity, SyncStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;

    /// What a scripted call does.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Outcome {
        /// Returns a result with this status.
        Status(SyncStatus),
        /// Returns `Err` from the source.
        Fail(SourceError),
        /// Panics inside the source future.
        Panic(String),
    }

    impl From<SyncStatus> for Outcome {
        fn from(status: SyncStatus) -> Self {
            Self::Status(status)
        }
    }

    /// Kind of a recorded call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum CallKind {
        Instantiate,
        Synchronize,
        SynchronizeDelete,
    }

    /// A recorded call against a scripted source.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Call {
        pub source_id: String,
        pub kind: CallKind,
        pub role: SourceRole,
        pub context: Option<SourceContext>,
    }

    /// Call log shared by any number of scripted sources, in call order.
    #[derive(Debug, Default)]
    pub struct CallLog {
        calls: Mutex<Vec<Call>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CallLog {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn record(&self, call: Call) {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(call);
        }

        /// All calls so far.
        pub fn calls(&self) -> Vec<Call> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// `(source_id, kind)` pairs, in call order.
        pub fn sequence(&self) -> Vec<(String, CallKind)> {
            self.calls()
                .into_iter()
                .map(|c| (c.source_id, c.kind))
                .collect()
        }

        /// Calls of the given kind made against one source.
        pub fn count(&self, source_id: &str, kind: CallKind) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.source_id == source_id && c.kind == kind)
                .count()
        }

        /// Highest number of synchronize calls observed in flight at once.
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        fn enter(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Picks outcome `i` of a script; the last one repeats forever.
    fn pick(outcomes: &[Outcome], i: usize) -> Outcome {
        outcomes
            .get(i.min(outcomes.len().saturating_sub(1)))
            .cloned()
            .unwrap_or(Outcome::Status(SyncStatus::NoChange))
    }

    /// Script positions, shared by every instance of one source so that
    /// sequences continue across runs.
    #[derive(Debug, Default)]
    struct Cursor {
        sync: AtomicUsize,
        delete: AtomicUsize,
    }

    /// A source whose results are scripted up front.
    #[derive(Debug)]
    pub struct ScriptedSource {
        info: SourceInfo,
        scope: SourceScope,
        default_role: Option<SourceRole>,
        log: Arc<CallLog>,
        on_sync: Vec<Outcome>,
        on_delete: Vec<Outcome>,
        delay: Option<Duration>,
        instantiate_error: Option<SourceError>,
        cursor: Arc<Cursor>,
    }

    impl ScriptedSource {
        /// A source that answers `synchronized` to `synchronize` and
        /// `deleted` to `synchronize_delete`.
        pub fn new(id: &str, scope: SourceScope, log: Arc<CallLog>) -> Self {
            Self {
                info: SourceInfo::new(id, id.to_uppercase()),
                scope,
                default_role: None,
                log,
                on_sync: vec![SyncStatus::Synchronized.into()],
                on_delete: vec![SyncStatus::Deleted.into()],
                delay: None,
                instantiate_error: None,
                cursor: Arc::default(),
            }
        }

        pub fn global(id: &str, log: Arc<CallLog>) -> Self {
            Self::new(id, SourceScope::Global, log)
        }

        pub fn contextual(id: &str, log: Arc<CallLog>) -> Self {
            Self::new(id, SourceScope::Context, log)
        }

        pub fn with_default_role(mut self, role: SourceRole) -> Self {
            self.default_role = Some(role);
            self
        }

        /// Outcome of every `synchronize` call.
        pub fn on_sync(mut self, outcome: impl Into<Outcome>) -> Self {
            self.on_sync = vec![outcome.into()];
            self
        }

        /// Outcomes of successive `synchronize` calls.
        pub fn on_sync_sequence(mut self, outcomes: Vec<Outcome>) -> Self {
            self.on_sync = outcomes;
            self
        }

        /// Outcome of every `synchronize_delete` call.
        pub fn on_delete(mut self, outcome: impl Into<Outcome>) -> Self {
            self.on_delete = vec![outcome.into()];
            self
        }

        /// Sleeps before answering each call.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn fail_instantiate(mut self, error: SourceError) -> Self {
            self.instantiate_error = Some(error);
            self
        }

        pub fn into_arc(self) -> Arc<dyn SourceDescriptor> {
            Arc::new(self)
        }
    }

    #[async_trait]
    impl SourceDescriptor for ScriptedSource {
        fn info(&self) -> &SourceInfo {
            &self.info
        }

        fn scope(&self) -> SourceScope {
            self.scope
        }

        fn default_role(&self) -> Option<SourceRole> {
            self.default_role
        }

        async fn instantiate(
            &self,
            entity: &EntityIdentity,
            role: SourceRole,
            context: Option<&SourceContext>,
        ) -> Result<Box<dyn SourceInstance>, SourceError> {
            self.log.record(Call {
                source_id: self.info.id.clone(),
                kind: CallKind::Instantiate,
                role,
                context: context.cloned(),
            });
            if let Some(err) = &self.instantiate_error {
                return Err(err.clone());
            }
            Ok(Box::new(ScriptedInstance {
                info: self.info.clone(),
                entity: entity.clone(),
                role,
                context: context.cloned(),
                log: self.log.clone(),
                on_sync: self.on_sync.clone(),
                on_delete: self.on_delete.clone(),
                delay: self.delay,
                cursor: self.cursor.clone(),
            }))
        }
    }

    struct ScriptedInstance {
        info: SourceInfo,
        entity: EntityIdentity,
        role: SourceRole,
        context: Option<SourceContext>,
        log: Arc<CallLog>,
        on_sync: Vec<Outcome>,
        on_delete: Vec<Outcome>,
        delay: Option<Duration>,
        cursor: Arc<Cursor>,
    }

    impl ScriptedInstance {
        async fn run(&self, kind: CallKind) -> Result<SyncEntityResult, SourceError> {
            self.log.record(Call {
                source_id: self.info.id.clone(),
                kind,
                role: self.role,
                context: self.context.clone(),
            });
            let outcome = if kind == CallKind::SynchronizeDelete {
                pick(&self.on_delete, self.cursor.delete.fetch_add(1, Ordering::SeqCst))
            } else {
                pick(&self.on_sync, self.cursor.sync.fetch_add(1, Ordering::SeqCst))
            };

            self.log.enter();
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.log.exit();

            let local = SourceLocalEntity::new(
                format!("{}-{}", self.info.id, self.entity.common_id),
                self.entity.clone(),
                self.info.clone(),
            );
            match outcome {
                Outcome::Status(SyncStatus::Failed) => {
                    Ok(SyncEntityResult::failed(local, "scripted failure"))
                }
                Outcome::Status(status) => Ok(SyncEntityResult::new(local, status)),
                Outcome::Fail(err) => Err(err),
                Outcome::Panic(msg) => panic!("{msg}"),
            }
        }
    }

    #[async_trait]
    impl SourceInstance for ScriptedInstance {
        async fn synchronize(&self) -> Result<SyncEntityResult, SourceError> {
            self.run(CallKind::Synchronize).await
        }

        async fn synchronize_delete(&self) -> Result<SyncEntityResult, SourceError> {
            self.run(CallKind::SynchronizeDelete).await
        }
    }
}
