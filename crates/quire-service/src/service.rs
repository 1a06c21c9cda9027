use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use quire_notify::{Event, ExecutionScope, NotificationBus, NotificationContext};
use quire_output::{FlushReport, OutputShape, OutputStaging, open_destination};
use quire_params::TaskParameters;
use quire_task::{ExecutionError, Task, TaskContext, TaskLookup};
use tracing::{Span, debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::TaskError;
use crate::report::ExecutionReport;
use crate::state::{ExecutionState, ExecutionTracker};

/// Drives task executions and owns the notification context.
///
/// `execute` takes `&self`; one service can run any number of executions at
/// once. Under [`ExecutionMode::Concurrent`](crate::ExecutionMode) each
/// execution publishes on its own bus.
pub struct TaskExecutionService {
  config: ServiceConfig,
  lookup: Arc<dyn TaskLookup>,
  notifications: NotificationContext,
}

impl TaskExecutionService {
  /// Create a service. Fails if `lookup` cannot resolve every operation kind.
  pub fn new(config: ServiceConfig, lookup: Arc<dyn TaskLookup>) -> Result<Self, TaskError> {
    lookup.validate()?;
    let notifications = NotificationContext::new(config.mode.scope_strategy());
    Ok(Self {
      config,
      lookup,
      notifications,
    })
  }

  pub fn config(&self) -> &ServiceConfig {
    &self.config
  }

  pub fn notifications(&self) -> &NotificationContext {
    &self.notifications
  }

  /// Open the scope for a future execution, so listeners can be attached
  /// before it starts.
  pub fn open_scope(&self) -> ExecutionScope {
    self.notifications.open_scope()
  }

  /// Run `params` in a freshly opened scope.
  pub async fn execute(&self, params: &TaskParameters) -> Result<ExecutionReport, TaskError> {
    self.execute_in(params, self.open_scope()).await
  }

  /// Run `params` with `scope` bound for the whole execution.
  ///
  /// Returns once the terminal event has been delivered.
  pub async fn execute_in(
    &self,
    params: &TaskParameters,
    scope: ExecutionScope,
  ) -> Result<ExecutionReport, TaskError> {
    let execution_id = Uuid::new_v4().to_string();
    scope.run(self.run(&execution_id, params)).await
  }

  #[instrument(
    name = "task_execution",
    skip(self, params),
    fields(operation = %params.kind(), sources = params.sources.len())
  )]
  async fn run(
    &self,
    execution_id: &str,
    params: &TaskParameters,
  ) -> Result<ExecutionReport, TaskError> {
    let bus = self.notifications.current();
    let mut tracker = ExecutionTracker::new(execution_id);
    info!("execution started");

    let result = self
      .drive(execution_id, params, &bus, &mut tracker)
      .await
      .and_then(|flushed| {
        tracker.transition(ExecutionState::Completed)?;
        Ok(flushed)
      });

    match result {
      Ok(flushed) => {
        info!(outputs = flushed.written.len(), "execution completed");
        bus.notify(&Event::Completed {
          execution_id: execution_id.to_string(),
          outputs: flushed.written.clone(),
        });
        Ok(ExecutionReport {
          execution_id: execution_id.to_string(),
          operation: params.kind(),
          outputs: flushed.written,
        })
      }
      Err(e) => {
        let failed_in = tracker.current();
        tracker.fail();
        error!(error = %e, kind = %e.kind(), state = %failed_in, "execution failed");
        bus.notify(&Event::Failed {
          execution_id: execution_id.to_string(),
          kind: e.kind(),
          cause: e.to_string(),
        });
        Err(e)
      }
    }
  }

  /// Steps from resolution through flush. Staged artifacts are dropped, and
  /// their temp files deleted, on any failure before the flush. A panic in
  /// `before_execute` or `execute` is an execution failure.
  async fn drive(
    &self,
    execution_id: &str,
    params: &TaskParameters,
    bus: &Arc<NotificationBus>,
    tracker: &mut ExecutionTracker,
  ) -> Result<FlushReport, TaskError> {
    tracker.transition(ExecutionState::Resolving)?;
    let mut task = self.lookup.lookup(params)?;

    tracker.transition(ExecutionState::Validating)?;
    let outcome = AssertUnwindSafe(
      self.run_task(task.as_mut(), execution_id, params, bus, tracker),
    )
    .catch_unwind()
    .await
    .unwrap_or_else(|payload| Err(ExecutionError::panicked(payload).into()));
    if let Err(payload) = AssertUnwindSafe(task.after_execute()).catch_unwind().await {
      warn!(error = %ExecutionError::panicked(payload), "after_execute panicked");
    }
    let staging = outcome?;

    tracker.transition(ExecutionState::Flushing)?;
    self.flush(staging, params, task.output_shape()).await
  }

  async fn run_task(
    &self,
    task: &mut dyn Task,
    execution_id: &str,
    params: &TaskParameters,
    bus: &Arc<NotificationBus>,
    tracker: &mut ExecutionTracker,
  ) -> Result<OutputStaging, TaskError> {
    task.before_execute(params).await?;
    tracker.transition(ExecutionState::Executing)?;

    let mut cx = TaskContext::new(execution_id, Arc::clone(bus), self.new_staging());
    task.execute(params, &mut cx).await?;
    Ok(cx.into_outputs())
  }

  fn new_staging(&self) -> OutputStaging {
    match &self.config.staging_dir {
      Some(dir) => OutputStaging::in_dir(dir),
      None => OutputStaging::new(),
    }
  }

  /// Flush on the blocking pool. The staging moves into the job and is
  /// dropped there whatever the outcome.
  async fn flush(
    &self,
    mut staging: OutputStaging,
    params: &TaskParameters,
    shape: OutputShape,
  ) -> Result<FlushReport, TaskError> {
    let target = params.output.clone();
    let overwrite = params.overwrite;
    let compress = params.compress;
    let span = Span::current();

    let report = tokio::task::spawn_blocking(move || {
      let _entered = span.enter();
      let mut destination = open_destination(&target, shape, compress);
      debug!(
        destination = %destination.describe(),
        artifacts = staging.len(),
        overwrite,
        "flushing outputs"
      );
      staging.flush_outputs(destination.as_mut(), overwrite)
    })
    .await
    .map_err(TaskError::flush_aborted)??;

    Ok(report)
  }
}
