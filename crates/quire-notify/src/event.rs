//! Events published during task execution.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Events emitted during a task execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
  /// The task body reported progress. Informational only.
  ProgressChanged { execution_id: String, percent: u8 },

  /// The execution failed. Terminal.
  Failed {
    execution_id: String,
    kind: FailureKind,
    cause: String,
  },

  /// Outputs were flushed and the execution completed. Terminal.
  Completed {
    execution_id: String,
    outputs: Vec<String>,
  },
}

impl Event {
  pub fn kind(&self) -> EventKind {
    match self {
      Event::ProgressChanged { .. } => EventKind::ProgressChanged,
      Event::Failed { .. } => EventKind::Failed,
      Event::Completed { .. } => EventKind::Completed,
    }
  }

  pub fn execution_id(&self) -> &str {
    match self {
      Event::ProgressChanged { execution_id, .. }
      | Event::Failed { execution_id, .. }
      | Event::Completed { execution_id, .. } => execution_id,
    }
  }

  pub fn is_terminal(&self) -> bool {
    self.kind() != EventKind::ProgressChanged
  }
}

/// Event kind, used by listeners to subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
  ProgressChanged,
  Failed,
  Completed,
}

impl EventKind {
  pub const ALL: [EventKind; 3] = [
    EventKind::ProgressChanged,
    EventKind::Failed,
    EventKind::Completed,
  ];
}

/// Which stage of an execution a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  /// No task matches the parameters.
  Resolution,
  /// Parameters are inconsistent with the source content.
  Validation,
  /// The task body failed.
  Execution,
  /// Staging or flushing outputs failed, including overwrite conflicts.
  Io,
}

impl fmt::Display for FailureKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      FailureKind::Resolution => "resolution",
      FailureKind::Validation => "validation",
      FailureKind::Execution => "execution",
      FailureKind::Io => "io",
    };
    f.write_str(name)
  }
}
