use polysync_engine::source::mock::{CallKind, CallLog, ScriptedSource};
use polysync_engine::{
    AllGlobalSources, EngineConfig, Reconciler, SourceDescriptor, SourceRegistry, SyncError,
    TypeRegistry,
};
use polysync_types::{EntityIdentity, SourceRole, SourceScope, SyncStatus};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn contact_engine(log: &Arc<CallLog>) -> Reconciler {
    let sources = SourceRegistry::new(vec![
        ScriptedSource::global("db", log.clone())
            .with_default_role(SourceRole::Primary)
            .into_arc(),
        ScriptedSource::global("crm", log.clone())
            .with_default_role(SourceRole::Secondary)
            .into_arc(),
    ])
    .unwrap();
    let loader = Arc::new(AllGlobalSources::from_registry(&sources));
    Reconciler::new("contact", sources, loader)
}

fn invoice_engine(log: &Arc<CallLog>, config: EngineConfig) -> Reconciler {
    let sources = SourceRegistry::new(vec![
        ScriptedSource::global("ledger", log.clone())
            .with_default_role(SourceRole::Primary)
            .with_delay(Duration::from_millis(500))
            .into_arc(),
    ])
    .unwrap();
    let loader = Arc::new(AllGlobalSources::from_registry(&sources));
    Reconciler::with_config("invoice", sources, loader, config).unwrap()
}

// ── SourceRegistry ───────────────────────────────────────────────

#[test]
fn source_registry_partitions_by_scope() {
    let log = CallLog::new();
    let registry = SourceRegistry::new(vec![
        ScriptedSource::global("db", log.clone()).into_arc(),
        ScriptedSource::contextual("mailbox", log.clone()).into_arc(),
        ScriptedSource::global("crm", log.clone()).into_arc(),
    ])
    .unwrap();

    let global: Vec<&str> = registry.global().iter().map(|d| d.info().id.as_str()).collect();
    let context: Vec<&str> = registry.context().iter().map(|d| d.info().id.as_str()).collect();
    assert_eq!(global, vec!["db", "crm"]);
    assert_eq!(context, vec!["mailbox"]);
    assert_eq!(registry.len(), 3);
    assert!(!registry.is_empty());
}

#[test]
fn source_registry_lookup() {
    let log = CallLog::new();
    let registry = SourceRegistry::new(vec![
        ScriptedSource::global("db", log.clone()).into_arc(),
        ScriptedSource::contextual("mailbox", log.clone()).into_arc(),
    ])
    .unwrap();

    assert_eq!(registry.get("mailbox").unwrap().scope(), SourceScope::Context);
    assert_eq!(registry.get("db").unwrap().info().name, "DB");
    assert!(registry.get("nope").is_none());
}

#[test]
fn source_registry_rejects_duplicate_ids() {
    let log = CallLog::new();
    let result = SourceRegistry::new(vec![
        ScriptedSource::global("db", log.clone()).into_arc(),
        ScriptedSource::contextual("db", log.clone()).into_arc(),
    ]);
    assert!(matches!(result, Err(SyncError::DuplicateSource(ref id)) if id == "db"));
}

#[test]
fn empty_source_registry() {
    let registry = SourceRegistry::new(vec![]).unwrap();
    assert!(registry.is_empty());
    assert!(format!("{registry:?}").contains("SourceRegistry"));
}

// ── TypeRegistry construction ────────────────────────────────────

#[test]
fn type_registry_lists_common_types() {
    let log = CallLog::new();
    let registry = TypeRegistry::new([
        contact_engine(&log),
        invoice_engine(&log, EngineConfig::default()),
    ])
    .unwrap();

    assert_eq!(registry.common_types(), vec!["contact", "invoice"]);
    assert!(registry.contains("contact"));
    assert!(!registry.contains("order"));
    assert_eq!(registry.get("invoice").unwrap().common_type(), "invoice");
}

#[test]
fn type_registry_rejects_duplicate_common_type() {
    let log = CallLog::new();
    let result = TypeRegistry::new([contact_engine(&log), contact_engine(&log)]);
    assert!(matches!(result, Err(SyncError::DuplicateCommonType(ref t)) if t == "contact"));
}

// ── TypeRegistry dispatch ────────────────────────────────────────

#[tokio::test]
async fn synchronize_with_bare_id() {
    let log = CallLog::new();
    let registry = TypeRegistry::new([contact_engine(&log)]).unwrap();

    let run = registry.synchronize("contact", "42").await.unwrap();

    assert_eq!(run.target, EntityIdentity::new("contact", "42"));
    assert_eq!(run.statuses(), vec![SyncStatus::Synchronized, SyncStatus::Synchronized]);
}

#[tokio::test]
async fn synchronize_with_full_identity() {
    let log = CallLog::new();
    let registry = TypeRegistry::new([contact_engine(&log)]).unwrap();

    let run = registry
        .synchronize("contact", EntityIdentity::new("contact", "7"))
        .await
        .unwrap();

    assert_eq!(run.target.common_id, "7");
    assert_eq!(log.count("db", CallKind::Synchronize), 1);
}

#[tokio::test]
async fn synchronize_unregistered_type_fails() {
    let log = CallLog::new();
    let registry = TypeRegistry::new([contact_engine(&log)]).unwrap();

    let err = registry.synchronize("order", "1").await.unwrap_err();

    assert!(matches!(err, SyncError::UnregisteredCommonType(ref t) if t == "order"));
    assert!(err.is_configuration());
    assert!(!err.is_retryable());
    assert!(log.calls().is_empty());
}

#[tokio::test]
async fn synchronize_rejects_identity_of_other_type() {
    let log = CallLog::new();
    let registry = TypeRegistry::new([contact_engine(&log)]).unwrap();

    let err = registry
        .synchronize("contact", EntityIdentity::new("invoice", "1"))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::CommonTypeMismatch { .. }));
}

#[tokio::test(start_paused = true)]
async fn synchronize_times_out_when_configured() {
    let log = CallLog::new();
    let config = EngineConfig {
        run_timeout_ms: Some(50),
        ..Default::default()
    };
    let registry = TypeRegistry::new([invoice_engine(&log, config)]).unwrap();

    let err = registry.synchronize("invoice", "9").await.unwrap_err();

    match &err {
        SyncError::Timeout { entity, timeout } => {
            assert_eq!(*entity, EntityIdentity::new("invoice", "9"));
            assert_eq!(*timeout, Duration::from_millis(50));
        }
        other => panic!("Expected Timeout, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn synchronize_within_timeout_succeeds() {
    let log = CallLog::new();
    let config = EngineConfig {
        run_timeout_ms: Some(5_000),
        ..Default::default()
    };
    let registry = TypeRegistry::new([invoice_engine(&log, config)]).unwrap();

    let run = registry.synchronize("invoice", "9").await.unwrap();
    assert_eq!(run.statuses(), vec![SyncStatus::Synchronized]);
}
