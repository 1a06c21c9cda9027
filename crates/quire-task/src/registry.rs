use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use quire_params::{OperationKind, TaskParameters};
use tracing::debug;

use crate::document::DocumentBackend;
use crate::error::ResolutionError;
use crate::task::Task;
use crate::tasks::{ImageConversionTask, MergeTask, RotateTask, SplitTask};

/// Builds a fresh task for one execution.
pub type TaskFactory = Arc<dyn Fn() -> Box<dyn Task> + Send + Sync>;

/// Maps parameters to the task that runs them.
pub trait TaskLookup: Send + Sync {
  /// A new task instance for `params`.
  fn lookup(&self, params: &TaskParameters) -> Result<Box<dyn Task>, ResolutionError>;

  /// Check that every operation kind can be resolved.
  fn validate(&self) -> Result<(), ResolutionError> {
    Ok(())
  }
}

/// Explicit registry from operation kind to task factory.
#[derive(Clone, Default)]
pub struct TaskRegistry {
  factories: HashMap<OperationKind, TaskFactory>,
}

impl TaskRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// The built-in tasks, all sharing `backend`.
  pub fn standard(backend: Arc<dyn DocumentBackend>) -> Self {
    let mut registry = Self::new();

    let b = backend.clone();
    registry.register(OperationKind::Rotate, move || {
      Box::new(RotateTask::new(b.clone()))
    });
    let b = backend.clone();
    registry.register(OperationKind::Split, move || {
      Box::new(SplitTask::new(b.clone()))
    });
    let b = backend.clone();
    registry.register(OperationKind::Merge, move || {
      Box::new(MergeTask::new(b.clone()))
    });
    registry.register(OperationKind::ConvertToImage, move || {
      Box::new(ImageConversionTask::new(backend.clone()))
    });

    registry
  }

  /// Register `factory` for `kind`, replacing any previous one.
  pub fn register<F>(&mut self, kind: OperationKind, factory: F) -> &mut Self
  where
    F: Fn() -> Box<dyn Task> + Send + Sync + 'static,
  {
    self.factories.insert(kind, Arc::new(factory));
    self
  }

  /// Builder form of [`register`](Self::register).
  pub fn with<F>(mut self, kind: OperationKind, factory: F) -> Self
  where
    F: Fn() -> Box<dyn Task> + Send + Sync + 'static,
  {
    self.register(kind, factory);
    self
  }

  pub fn contains(&self, kind: OperationKind) -> bool {
    self.factories.contains_key(&kind)
  }

  /// Operation kinds without a factory, in declaration order.
  pub fn missing(&self) -> Vec<OperationKind> {
    OperationKind::ALL
      .into_iter()
      .filter(|kind| !self.factories.contains_key(kind))
      .collect()
  }
}

impl TaskLookup for TaskRegistry {
  fn lookup(&self, params: &TaskParameters) -> Result<Box<dyn Task>, ResolutionError> {
    let kind = params.kind();
    let factory = self
      .factories
      .get(&kind)
      .ok_or(ResolutionError::Unregistered { kind })?;
    debug!(operation = %kind, "task resolved");
    Ok(factory())
  }

  fn validate(&self) -> Result<(), ResolutionError> {
    let missing = self.missing();
    if missing.is_empty() {
      Ok(())
    } else {
      Err(ResolutionError::Incomplete { missing })
    }
  }
}

impl fmt::Debug for TaskRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut kinds: Vec<_> = self.factories.keys().map(|k| k.as_str()).collect();
    kinds.sort_unstable();
    f.debug_struct("TaskRegistry").field("kinds", &kinds).finish()
  }
}
