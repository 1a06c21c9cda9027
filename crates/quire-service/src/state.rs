//! Execution lifecycle state with transition validation.
//!
//! ```text
//! Idle -> Resolving -> Validating -> Executing -> Flushing -> Completed
//!   \________\____________\_____________\____________\-----> Failed
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
  Idle,
  Resolving,
  Validating,
  Executing,
  Flushing,
  Completed,
  Failed,
}

impl ExecutionState {
  pub fn as_str(&self) -> &'static str {
    match self {
      ExecutionState::Idle => "idle",
      ExecutionState::Resolving => "resolving",
      ExecutionState::Validating => "validating",
      ExecutionState::Executing => "executing",
      ExecutionState::Flushing => "flushing",
      ExecutionState::Completed => "completed",
      ExecutionState::Failed => "failed",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, ExecutionState::Completed | ExecutionState::Failed)
  }

  /// Whether `self -> target` is a legal step.
  pub fn can_transition(&self, target: ExecutionState) -> bool {
    use ExecutionState::*;
    match (*self, target) {
      (Idle, Resolving)
      | (Resolving, Validating)
      | (Validating, Executing)
      | (Executing, Flushing)
      | (Flushing, Completed) => true,
      (from, Failed) => !from.is_terminal(),
      _ => false,
    }
  }
}

impl fmt::Display for ExecutionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid execution state transition from '{from}' to '{to}'")]
pub struct InvalidTransition {
  pub from: ExecutionState,
  pub to: ExecutionState,
}

/// Tracks one execution through its states.
#[derive(Debug, Clone)]
pub struct ExecutionTracker {
  execution_id: String,
  history: Vec<ExecutionState>,
}

impl ExecutionTracker {
  pub fn new(execution_id: impl Into<String>) -> Self {
    Self {
      execution_id: execution_id.into(),
      history: vec![ExecutionState::Idle],
    }
  }

  pub fn current(&self) -> ExecutionState {
    self
      .history
      .last()
      .copied()
      .unwrap_or(ExecutionState::Idle)
  }

  /// Every state visited, in order.
  pub fn history(&self) -> &[ExecutionState] {
    &self.history
  }

  pub fn transition(&mut self, target: ExecutionState) -> Result<(), InvalidTransition> {
    let from = self.current();
    if !from.can_transition(target) {
      return Err(InvalidTransition { from, to: target });
    }
    debug!(execution_id = %self.execution_id, from = %from, to = %target, "state transition");
    self.history.push(target);
    Ok(())
  }

  /// Move to `Failed` unless the execution already ended.
  pub fn fail(&mut self) {
    if !self.current().is_terminal() {
      debug!(
        execution_id = %self.execution_id,
        from = %self.current(),
        "state transition to failed"
      );
      self.history.push(ExecutionState::Failed);
    }
  }
}
