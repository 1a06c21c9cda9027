use std::sync::Arc;

use async_trait::async_trait;
use quire_output::OutputShape;
use quire_params::{Operation, OperationKind, TaskParameters};
use tracing::debug;

use crate::document::{DocumentBackend, SaveOptions};
use crate::error::{ExecutionError, ValidationError};
use crate::task::{Task, TaskContext};
use crate::tasks::{OpenedSource, open_sources, selected_pages};

/// Rotates the selected pages of every source.
///
/// One artifact per source, named after the source. Ranges reaching past the
/// end of a source only rotate the pages that exist.
pub struct RotateTask {
  backend: Arc<dyn DocumentBackend>,
  sources: Vec<OpenedSource>,
}

impl RotateTask {
  pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
    Self {
      backend,
      sources: Vec::new(),
    }
  }
}

#[async_trait]
impl Task for RotateTask {
  fn output_shape(&self) -> OutputShape {
    OutputShape::Multiple
  }

  async fn before_execute(&mut self, params: &TaskParameters) -> Result<(), ValidationError> {
    self.sources = open_sources(self.backend.as_ref(), &params.sources)?;
    Ok(())
  }

  async fn execute(
    &mut self,
    params: &TaskParameters,
    cx: &mut TaskContext,
  ) -> Result<(), ExecutionError> {
    let Operation::Rotate { rotation, pages } = &params.operation else {
      return Err(ExecutionError::unexpected(OperationKind::Rotate, params));
    };
    if self.sources.is_empty() {
      return Err(ExecutionError::NotValidated);
    }

    let options = SaveOptions::from_parameters(params);
    let total = self.sources.len();
    for (idx, source) in self.sources.iter_mut().enumerate() {
      let selected = selected_pages(pages, source.document.page_count());
      debug!(
        source = %source.name,
        pages = selected.len(),
        degrees = rotation.degrees(),
        "rotating"
      );

      for page in selected {
        source
          .document
          .rotate_page(page, *rotation)
          .map_err(|e| ExecutionError::document(&source.name, e))?;
      }
      let bytes = source
        .document
        .save(&options)
        .map_err(|e| ExecutionError::document(&source.name, e))?;
      cx.stage_bytes(params.prefixed(&source.name), &bytes)?;
      cx.step(idx + 1, total);
    }
    Ok(())
  }

  async fn after_execute(&mut self) {
    self.sources.clear();
  }
}

#[cfg(test)]
mod tests {
  use quire_params::{OutputTarget, PageRange, Rotation};

  use super::*;
  use crate::tasks::testing::{MemoryBackend, context, pages, staged};

  #[tokio::test]
  async fn test_rotates_existing_pages_of_every_source() {
    let params = TaskParameters::new(
      Operation::Rotate {
        rotation: Rotation::Degrees90,
        pages: vec![PageRange::new(2, 3)],
      },
      OutputTarget::directory("out"),
    )
    .with_source(pages(3, "long.mem"))
    .with_source(pages(1, "short.mem"))
    .with_output_prefix("r_");

    let mut task = RotateTask::new(MemoryBackend::shared());
    let mut cx = context();

    task.before_execute(&params).await.unwrap();
    task.execute(&params, &mut cx).await.unwrap();
    task.after_execute().await;

    assert_eq!(
      staged(&cx),
      vec![
        ("r_long.mem".to_string(), "p1@0,p2@90,p3@90".to_string()),
        ("r_short.mem".to_string(), "p1@0".to_string()),
      ]
    );
  }

  #[tokio::test]
  async fn test_execute_without_validation_fails() {
    let params = TaskParameters::new(
      Operation::Rotate {
        rotation: Rotation::Degrees180,
        pages: Vec::new(),
      },
      OutputTarget::directory("out"),
    );
    let mut task = RotateTask::new(MemoryBackend::shared());
    let mut cx = context();

    let err = task.execute(&params, &mut cx).await.unwrap_err();
    assert!(matches!(err, ExecutionError::NotValidated));
    assert!(cx.outputs().is_empty());
  }

  #[tokio::test]
  async fn test_rejects_other_operations() {
    let params = TaskParameters::new(Operation::Merge, OutputTarget::file("out.mem"))
      .with_source(pages(1, "a.mem"));
    let mut task = RotateTask::new(MemoryBackend::shared());
    let mut cx = context();

    task.before_execute(&params).await.unwrap();
    let err = task.execute(&params, &mut cx).await.unwrap_err();
    assert!(matches!(
      err,
      ExecutionError::UnexpectedOperation {
        expected: OperationKind::Rotate,
        actual: OperationKind::Merge
      }
    ));
  }
}
