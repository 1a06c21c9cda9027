use std::sync::Arc;

use async_trait::async_trait;
use quire_output::OutputShape;
use quire_params::{Operation, OperationKind, TaskParameters};
use tracing::debug;

use crate::document::DocumentBackend;
use crate::error::{ExecutionError, ValidationError};
use crate::task::{Task, TaskContext};
use crate::tasks::{OpenedSource, check_ranges, open_sources, selected_pages};

/// Renders pages of a single source, one image per page named `page-{n}.{ext}`.
pub struct ImageConversionTask {
  backend: Arc<dyn DocumentBackend>,
  source: Option<OpenedSource>,
}

impl ImageConversionTask {
  pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
    Self {
      backend,
      source: None,
    }
  }
}

#[async_trait]
impl Task for ImageConversionTask {
  fn output_shape(&self) -> OutputShape {
    OutputShape::Multiple
  }

  async fn before_execute(&mut self, params: &TaskParameters) -> Result<(), ValidationError> {
    if params.sources.len() > 1 {
      return Err(ValidationError::SourceCount {
        kind: OperationKind::ConvertToImage,
        count: params.sources.len(),
      });
    }
    let source = open_sources(self.backend.as_ref(), &params.sources)?
      .into_iter()
      .next()
      .ok_or(ValidationError::NoSources)?;
    if let Operation::ConvertToImage { pages, .. } = &params.operation {
      check_ranges(&source, pages)?;
    }
    self.source = Some(source);
    Ok(())
  }

  async fn execute(
    &mut self,
    params: &TaskParameters,
    cx: &mut TaskContext,
  ) -> Result<(), ExecutionError> {
    let Operation::ConvertToImage { format, pages } = &params.operation else {
      return Err(ExecutionError::unexpected(OperationKind::ConvertToImage, params));
    };
    let source = self.source.as_ref().ok_or(ExecutionError::NotValidated)?;

    let selected = selected_pages(pages, source.document.page_count());
    debug!(source = %source.name, pages = selected.len(), format = format.extension(), "rendering");

    let total = selected.len();
    for (idx, page) in selected.into_iter().enumerate() {
      let image = source
        .document
        .render_page(page, *format)
        .map_err(|e| ExecutionError::document(&source.name, e))?;
      let name = format!("page-{}.{}", page, format.extension());
      cx.stage_bytes(params.prefixed(&name), &image)?;
      cx.step(idx + 1, total);
    }
    Ok(())
  }

  async fn after_execute(&mut self) {
    self.source = None;
  }
}
