use std::path::PathBuf;

use quire_notify::ScopeStrategy;
use serde::{Deserialize, Serialize};

/// How executions are expected to run relative to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
  /// One execution at a time; all listeners share one bus.
  #[default]
  Sequential,
  /// Executions may overlap; each one gets its own bus.
  Concurrent,
}

impl ExecutionMode {
  pub fn scope_strategy(&self) -> ScopeStrategy {
    match self {
      ExecutionMode::Sequential => ScopeStrategy::Global,
      ExecutionMode::Concurrent => ScopeStrategy::ExecutionScoped,
    }
  }
}

/// Service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
  pub mode: ExecutionMode,
  /// Where staged artifacts are written before flush. Defaults to the
  /// system temp directory.
  pub staging_dir: Option<PathBuf>,
}

impl ServiceConfig {
  pub fn concurrent() -> Self {
    Self {
      mode: ExecutionMode::Concurrent,
      ..Self::default()
    }
  }

  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }
}
