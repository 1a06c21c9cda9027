use std::sync::Arc;

use async_trait::async_trait;
use quire_output::OutputShape;
use quire_params::{Operation, OperationKind, TaskParameters};
use tracing::debug;

use crate::document::{DocumentBackend, SaveOptions};
use crate::error::{ExecutionError, ValidationError};
use crate::task::{Task, TaskContext};
use crate::tasks::{OpenedSource, open_sources};

/// Concatenates all sources, in order, into a single document.
pub struct MergeTask {
  backend: Arc<dyn DocumentBackend>,
  sources: Vec<OpenedSource>,
}

impl MergeTask {
  pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
    Self {
      backend,
      sources: Vec::new(),
    }
  }
}

#[async_trait]
impl Task for MergeTask {
  fn output_shape(&self) -> OutputShape {
    OutputShape::Single
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
    if !matches!(params.operation, Operation::Merge) {
      return Err(ExecutionError::unexpected(OperationKind::Merge, params));
    }
    let Some((first, rest)) = self.sources.split_first() else {
      return Err(ExecutionError::NotValidated);
    };

    let all: Vec<u32> = (1..=first.document.page_count()).collect();
    let mut merged = first
      .document
      .extract(&all)
      .map_err(|e| ExecutionError::document(&first.name, e))?;

    let total = self.sources.len() + 1;
    cx.step(1, total);
    for (idx, source) in rest.iter().enumerate() {
      debug!(source = %source.name, pages = source.document.page_count(), "appending");
      merged
        .append(&*source.document)
        .map_err(|e| ExecutionError::document(&source.name, e))?;
      cx.step(idx + 2, total);
    }

    let bytes = merged
      .save(&SaveOptions::from_parameters(params))
      .map_err(|e| ExecutionError::document(&first.name, e))?;
    let name = format!("merged.{}", merged.extension());
    cx.stage_bytes(params.prefixed(&name), &bytes)?;
    cx.step(total, total);
    Ok(())
  }

  async fn after_execute(&mut self) {
    self.sources.clear();
  }
}
