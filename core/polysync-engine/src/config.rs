//! Engine configuration.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum number of replica invocations in flight at once.
pub const DEFAULT_REPLICA_CONCURRENCY: usize = 3;

/// Whether a secondary reporting `deleted` may restart the run in delete mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    /// Restart at most once, and only from the top-level pass.
    #[default]
    Once,
    /// Never restart; the secondary's result is recorded and the run goes on.
    Disabled,
}

impl RestartPolicy {
    /// Whether a pass at `depth` (0 for the top-level pass) may restart.
    pub fn allows_restart(self, depth: u32) -> bool {
        match self {
            Self::Once => depth == 0,
            Self::Disabled => false,
        }
    }
}

/// Configuration for one reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Recompute relevant sources and instances every time they are needed
    /// within a run instead of caching them for the run.
    pub dynamic_sources: bool,
    /// Maximum concurrent replica invocations.
    pub replica_concurrency: usize,
    /// Restart gate for secondary-signalled deletes.
    pub restart_policy: RestartPolicy,
    /// Timeout applied around a whole run by the type registry (ms).
    pub run_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dynamic_sources: false,
            replica_concurrency: DEFAULT_REPLICA_CONCURRENCY,
            restart_policy: RestartPolicy::default(),
            run_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.replica_concurrency == 0 {
            return Err(SyncError::Config(
                "replica_concurrency must be at least 1".into(),
            ));
        }
        if self.run_timeout_ms == Some(0) {
            return Err(SyncError::Config("run_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_ms.map(Duration::from_millis)
    }
}
