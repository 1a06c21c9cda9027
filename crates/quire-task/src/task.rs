use std::sync::Arc;

use async_trait::async_trait;
use quire_notify::{Event, NotificationBus};
use quire_output::{OutputShape, OutputStaging};
use quire_params::TaskParameters;
use tracing::debug;

use crate::error::{ExecutionError, ValidationError};

/// A unit of work for one operation kind.
///
/// Instances are never reused across executions.
#[async_trait]
pub trait Task: Send {
  /// Whether the task produces one artifact or a set of artifacts.
  fn output_shape(&self) -> OutputShape;

  /// Check the parameters against the actual source content.
  async fn before_execute(&mut self, params: &TaskParameters) -> Result<(), ValidationError>;

  /// Perform the operation, staging artifacts in `cx`.
  async fn execute(
    &mut self,
    params: &TaskParameters,
    cx: &mut TaskContext,
  ) -> Result<(), ExecutionError>;

  /// Release resources. Runs whether or not `execute` succeeded.
  async fn after_execute(&mut self) {}
}

/// Per-execution state handed to [`Task::execute`].
pub struct TaskContext {
  execution_id: String,
  bus: Arc<NotificationBus>,
  outputs: OutputStaging,
}

impl TaskContext {
  pub fn new(
    execution_id: impl Into<String>,
    bus: Arc<NotificationBus>,
    outputs: OutputStaging,
  ) -> Self {
    Self {
      execution_id: execution_id.into(),
      bus,
      outputs,
    }
  }

  pub fn execution_id(&self) -> &str {
    &self.execution_id
  }

  /// Report completion percentage; values above 100 are clamped.
  pub fn progress(&self, percent: u8) {
    let percent = percent.min(100);
    debug!(execution_id = %self.execution_id, percent, "progress");
    self.bus.notify(&Event::ProgressChanged {
      execution_id: self.execution_id.clone(),
      percent,
    });
  }

  /// Report that `done` of `total` steps have completed.
  pub fn step(&self, done: usize, total: usize) {
    let percent = if total == 0 {
      100
    } else {
      (done.min(total) * 100 / total) as u8
    };
    self.progress(percent);
  }

  /// Stage `bytes` as an artifact named `name`.
  pub fn stage_bytes(
    &mut self,
    name: impl Into<String>,
    bytes: &[u8],
  ) -> Result<(), ExecutionError> {
    self.outputs.stage_bytes(name, bytes)?;
    Ok(())
  }

  pub fn outputs(&self) -> &OutputStaging {
    &self.outputs
  }

  pub fn outputs_mut(&mut self) -> &mut OutputStaging {
    &mut self.outputs
  }

  /// Give the staged artifacts back to the caller.
  pub fn into_outputs(self) -> OutputStaging {
    self.outputs
  }
}
