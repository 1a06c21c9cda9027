use std::io;

use quire_notify::FailureKind;
use quire_output::OutputError;
use quire_task::{ExecutionError, ResolutionError, ValidationError};
use thiserror::Error;

use crate::state::InvalidTransition;

/// Any failure of an execution.
#[derive(Debug, Error)]
pub enum TaskError {
  #[error("task resolution failed: {0}")]
  Resolution(#[from] ResolutionError),

  #[error("task validation failed: {0}")]
  Validation(#[from] ValidationError),

  #[error("task execution failed: {0}")]
  Execution(#[from] ExecutionError),

  #[error("output flush failed: {0}")]
  Io(#[from] OutputError),

  #[error("execution state error: {0}")]
  State(#[from] InvalidTransition),
}

impl TaskError {
  pub fn kind(&self) -> FailureKind {
    match self {
      TaskError::Resolution(_) => FailureKind::Resolution,
      TaskError::Validation(_) => FailureKind::Validation,
      TaskError::Execution(_) | TaskError::State(_) => FailureKind::Execution,
      TaskError::Io(_) => FailureKind::Io,
    }
  }

  /// The flush job was lost before it reported back.
  pub(crate) fn flush_aborted(err: tokio::task::JoinError) -> Self {
    TaskError::Io(OutputError::Io(io::Error::other(err)))
  }
}
