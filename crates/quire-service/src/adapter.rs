//! Caller-facing entry point with default listeners.

use std::sync::Arc;

use quire_notify::{
  Event, EventKind, EventListener, ExecutionScope, ListenerError, ListenerId, ScopeStrategy,
};
use quire_params::TaskParameters;
use tracing::{error, info};

use crate::error::TaskError;
use crate::report::ExecutionReport;
use crate::service::TaskExecutionService;

/// Logs progress at `info`.
#[derive(Debug, Default)]
pub struct LoggingProgressListener;

impl LoggingProgressListener {
  pub const ID: &'static str = "quire.logging-progress";

  pub fn new() -> Self {
    Self
  }
}

impl EventListener for LoggingProgressListener {
  fn id(&self) -> ListenerId {
    ListenerId::new(Self::ID)
  }

  fn kinds(&self) -> Vec<EventKind> {
    vec![EventKind::ProgressChanged]
  }

  fn on_event(&self, event: &Event) -> Result<(), ListenerError> {
    if let Event::ProgressChanged {
      execution_id,
      percent,
    } = event
    {
      info!(execution_id = %execution_id, percent, "progress");
    }
    Ok(())
  }
}

/// Logs failures at `error`.
#[derive(Debug, Default)]
pub struct FailureLoggingListener;

impl FailureLoggingListener {
  pub const ID: &'static str = "quire.failure-logging";

  pub fn new() -> Self {
    Self
  }
}

impl EventListener for FailureLoggingListener {
  fn id(&self) -> ListenerId {
    ListenerId::new(Self::ID)
  }

  fn kinds(&self) -> Vec<EventKind> {
    vec![EventKind::Failed]
  }

  fn on_event(&self, event: &Event) -> Result<(), ListenerError> {
    if let Event::Failed {
      execution_id,
      kind,
      cause,
    } = event
    {
      error!(execution_id = %execution_id, kind = %kind, cause = %cause, "task failed");
    }
    Ok(())
  }
}

/// Runs parameters through a [`TaskExecutionService`] with the default
/// listeners attached.
///
/// With a shared bus the listeners are registered once, here. With
/// per-execution buses they are attached to every scope this adapter opens.
pub struct ExecutionAdapter {
  service: Arc<TaskExecutionService>,
  listeners: Vec<Arc<dyn EventListener>>,
}

impl ExecutionAdapter {
  pub fn new(service: Arc<TaskExecutionService>) -> Self {
    let listeners: Vec<Arc<dyn EventListener>> = vec![
      Arc::new(LoggingProgressListener::new()),
      Arc::new(FailureLoggingListener::new()),
    ];
    let notifications = service.notifications();
    if notifications.strategy() == ScopeStrategy::Global {
      for listener in &listeners {
        notifications.global().add_listener(Arc::clone(listener));
      }
    }
    Self { service, listeners }
  }

  pub fn service(&self) -> &Arc<TaskExecutionService> {
    &self.service
  }

  /// Open a scope with the default listeners attached.
  pub fn open_scope(&self) -> ExecutionScope {
    let scope = self.service.open_scope();
    if scope.is_scoped() {
      for listener in &self.listeners {
        scope.add_listener(Arc::clone(listener));
      }
    }
    scope
  }

  pub async fn execute(&self, params: &TaskParameters) -> Result<ExecutionReport, TaskError> {
    self.service.execute_in(params, self.open_scope()).await
  }

  /// Run `params` in `scope`, which should come from [`open_scope`](Self::open_scope).
  pub async fn execute_in(
    &self,
    params: &TaskParameters,
    scope: ExecutionScope,
  ) -> Result<ExecutionReport, TaskError> {
    self.service.execute_in(params, scope).await
  }
}
