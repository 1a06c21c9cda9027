mod image;
mod merge;
mod rotate;
mod split;

pub use image::ImageConversionTask;
pub use merge::MergeTask;
pub use rotate::RotateTask;
pub use split::SplitTask;

use std::collections::BTreeSet;

use quire_params::{PageRange, Source};

use crate::document::{Document, DocumentBackend};
use crate::error::ValidationError;

/// A source opened during `before_execute`.
pub(crate) struct OpenedSource {
  pub name: String,
  pub document: Box<dyn Document>,
}

pub(crate) fn open_sources(
  backend: &dyn DocumentBackend,
  sources: &[Source],
) -> Result<Vec<OpenedSource>, ValidationError> {
  if sources.is_empty() {
    return Err(ValidationError::NoSources);
  }
  sources
    .iter()
    .map(|source| {
      let document = backend
        .open(source)
        .map_err(|e| ValidationError::Unreadable {
          source_name: source.name.clone(),
          source: e,
        })?;
      Ok(OpenedSource {
        name: source.name.clone(),
        document,
      })
    })
    .collect()
}

/// Ascending, de-duplicated pages selected by `ranges`; all pages when empty.
pub(crate) fn selected_pages(ranges: &[PageRange], page_count: u32) -> Vec<u32> {
  if ranges.is_empty() {
    return (1..=page_count).collect();
  }
  ranges
    .iter()
    .flat_map(|range| range.pages(page_count))
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}

/// Fail on the first range that does not fit in `source`.
pub(crate) fn check_ranges(
  source: &OpenedSource,
  ranges: &[PageRange],
) -> Result<(), ValidationError> {
  let pages = source.document.page_count();
  match ranges.iter().find(|range| !range.fits(pages)) {
    Some(range) => Err(ValidationError::PageRangeOutOfBounds {
      source_name: source.name.clone(),
      range: *range,
      pages,
    }),
    None => Ok(()),
  }
}
