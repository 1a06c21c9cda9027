use std::sync::Arc;

use async_trait::async_trait;
use quire_output::OutputShape;
use quire_params::{Operation, OperationKind, TaskParameters};
use tracing::debug;

use crate::document::{DocumentBackend, SaveOptions};
use crate::error::{ExecutionError, ValidationError};
use crate::task::{Task, TaskContext};
use crate::tasks::{OpenedSource, open_sources};

/// Splits every source after the given pages.
///
/// Parts are named `{n}_{source name}`, numbered from 1 per source.
pub struct SplitTask {
  backend: Arc<dyn DocumentBackend>,
  sources: Vec<OpenedSource>,
}

impl SplitTask {
  pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
    Self {
      backend,
      sources: Vec::new(),
    }
  }
}

/// Page groups for a document of `page_count` pages split after `split_after`.
fn parts(split_after: &[u32], page_count: u32) -> Vec<Vec<u32>> {
  let mut bounds: Vec<u32> = split_after
    .iter()
    .copied()
    .filter(|page| *page < page_count)
    .collect();
  bounds.sort_unstable();
  bounds.dedup();
  bounds.push(page_count);

  let mut start = 1;
  bounds
    .into_iter()
    .map(|end| {
      let part = (start..=end).collect();
      start = end + 1;
      part
    })
    .collect()
}

#[async_trait]
impl Task for SplitTask {
  fn output_shape(&self) -> OutputShape {
    OutputShape::Multiple
  }

  async fn before_execute(&mut self, params: &TaskParameters) -> Result<(), ValidationError> {
    let sources = open_sources(self.backend.as_ref(), &params.sources)?;
    if let Operation::Split { split_after } = &params.operation {
      for source in &sources {
        let pages = source.document.page_count();
        if let Some(page) = split_after.iter().find(|p| **p == 0 || **p > pages) {
          return Err(ValidationError::PageOutOfBounds {
            source_name: source.name.clone(),
            page: *page,
            pages,
          });
        }
      }
    }
    self.sources = sources;
    Ok(())
  }

  async fn execute(
    &mut self,
    params: &TaskParameters,
    cx: &mut TaskContext,
  ) -> Result<(), ExecutionError> {
    let Operation::Split { split_after } = &params.operation else {
      return Err(ExecutionError::unexpected(OperationKind::Split, params));
    };
    if self.sources.is_empty() {
      return Err(ExecutionError::NotValidated);
    }

    let options = SaveOptions::from_parameters(params);
    let plan: Vec<_> = self
      .sources
      .iter()
      .map(|source| parts(split_after, source.document.page_count()))
      .collect();
    let total: usize = plan.iter().map(Vec::len).sum();
    let mut done = 0;

    for (source, groups) in self.sources.iter().zip(plan) {
      debug!(source = %source.name, parts = groups.len(), "splitting");
      for (idx, group) in groups.iter().enumerate() {
        let bytes = source
          .document
          .extract(group)
          .and_then(|part| part.save(&options))
          .map_err(|e| ExecutionError::document(&source.name, e))?;
        let name = format!("{}_{}", idx + 1, source.name);
        cx.stage_bytes(params.prefixed(&name), &bytes)?;
        done += 1;
        cx.step(done, total);
      }
    }
    Ok(())
  }

  async fn after_execute(&mut self) {
    self.sources.clear();
  }
}

#[cfg(test)]
mod tests {
  use quire_params::OutputTarget;

  use super::*;
  use crate::tasks::testing::{MemoryBackend, context, pages, staged};

  fn split(after: Vec<u32>) -> TaskParameters {
    TaskParameters::new(
      Operation::Split { split_after: after },
      OutputTarget::directory("out"),
    )
  }

  #[test]
  fn test_parts() {
    assert_eq!(parts(&[2], 4), vec![vec![1, 2], vec![3, 4]]);
    assert_eq!(parts(&[3, 1, 3], 4), vec![vec![1], vec![2, 3], vec![4]]);
    assert_eq!(parts(&[4], 4), vec![vec![1, 2, 3, 4]]);
    assert_eq!(parts(&[], 2), vec![vec![1, 2]]);
  }

  #[tokio::test]
  async fn test_split_names_parts_per_source() {
    let params = split(vec![1])
      .with_source(pages(3, "a.mem"))
      .with_source(pages(2, "b.mem"));
    let mut task = SplitTask::new(MemoryBackend::shared());
    let mut cx = context();

    task.before_execute(&params).await.unwrap();
    task.execute(&params, &mut cx).await.unwrap();

    assert_eq!(
      staged(&cx),
      vec![
        ("1_a.mem".to_string(), "p1@0".to_string()),
        ("2_a.mem".to_string(), "p2@0,p3@0".to_string()),
        ("1_b.mem".to_string(), "p1@0".to_string()),
        ("2_b.mem".to_string(), "p2@0".to_string()),
      ]
    );
  }

  #[tokio::test]
  async fn test_split_page_out_of_bounds() {
    let params = split(vec![5]).with_source(pages(4, "a.mem"));
    let mut task = SplitTask::new(MemoryBackend::shared());

    let err = task.before_execute(&params).await.unwrap_err();
    assert_eq!(
      err.to_string(),
      "page 5 is outside the bounds of 'a.mem' (4 pages)"
    );
  }
}
