use polysync_engine::{DEFAULT_REPLICA_CONCURRENCY, EngineConfig, RestartPolicy, SyncError};
use std::time::Duration;

// ── Defaults ─────────────────────────────────────────────────────

#[test]
fn default_config() {
    let config = EngineConfig::default();
    assert!(!config.dynamic_sources);
    assert_eq!(config.replica_concurrency, 3);
    assert_eq!(DEFAULT_REPLICA_CONCURRENCY, 3);
    assert_eq!(config.restart_policy, RestartPolicy::Once);
    assert!(config.run_timeout().is_none());
    assert!(config.validate().is_ok());
}

// ── JSON ─────────────────────────────────────────────────────────

#[test]
fn from_json_fills_missing_fields_with_defaults() {
    let config = EngineConfig::from_json(r#"{"dynamic_sources": true}"#).unwrap();
    assert!(config.dynamic_sources);
    assert_eq!(config.replica_concurrency, 3);
    assert_eq!(config.restart_policy, RestartPolicy::Once);
}

#[test]
fn from_json_full() {
    let config = EngineConfig::from_json(
        r#"{
            "dynamic_sources": false,
            "replica_concurrency": 8,
            "restart_policy": "disabled",
            "run_timeout_ms": 1500
        }"#,
    )
    .unwrap();
    assert_eq!(config.replica_concurrency, 8);
    assert_eq!(config.restart_policy, RestartPolicy::Disabled);
    assert_eq!(config.run_timeout(), Some(Duration::from_millis(1500)));
}

#[test]
fn from_json_rejects_malformed_input() {
    let err = EngineConfig::from_json("{not json").unwrap_err();
    assert!(matches!(err, SyncError::Serialization(_)));
    assert!(err.is_configuration());
}

#[test]
fn from_json_rejects_unknown_restart_policy() {
    assert!(EngineConfig::from_json(r#"{"restart_policy": "always"}"#).is_err());
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn zero_replica_concurrency_is_invalid() {
    let err = EngineConfig::from_json(r#"{"replica_concurrency": 0}"#).unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
}

#[test]
fn zero_timeout_is_invalid() {
    let config = EngineConfig {
        run_timeout_ms: Some(0),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(SyncError::Config(_))));
}

// ── RestartPolicy ────────────────────────────────────────────────

#[test]
fn once_allows_restart_only_from_top_level() {
    assert!(RestartPolicy::Once.allows_restart(0));
    assert!(!RestartPolicy::Once.allows_restart(1));
    assert!(!RestartPolicy::Once.allows_restart(2));
}

#[test]
fn disabled_never_restarts() {
    assert!(!RestartPolicy::Disabled.allows_restart(0));
    assert!(!RestartPolicy::Disabled.allows_restart(1));
}

#[test]
fn config_serde_roundtrip() {
    let config = EngineConfig {
        dynamic_sources: true,
        replica_concurrency: 5,
        restart_policy: RestartPolicy::Disabled,
        run_timeout_ms: Some(250),
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
}
