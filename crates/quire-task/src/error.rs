use std::any::Any;

use quire_output::OutputError;
use quire_params::{OperationKind, PageRange, TaskParameters};
use thiserror::Error;

use crate::document::DocumentError;

/// No task can run the requested parameters.
#[derive(Debug, Error)]
pub enum ResolutionError {
  /// Nothing is registered for the operation kind.
  #[error("no task registered for operation '{kind}'")]
  Unregistered { kind: OperationKind },

  /// The registry does not cover every operation kind.
  #[error("task registry has no factory for: {}", format_kinds(missing))]
  Incomplete { missing: Vec<OperationKind> },
}

fn format_kinds(kinds: &[OperationKind]) -> String {
  kinds
    .iter()
    .map(|k| k.as_str())
    .collect::<Vec<_>>()
    .join(", ")
}

/// The parameters are inconsistent with the source content.
#[derive(Debug, Error)]
pub enum ValidationError {
  #[error("no input sources")]
  NoSources,

  #[error("operation '{kind}' takes exactly one source, got {count}")]
  SourceCount { kind: OperationKind, count: usize },

  #[error("page range {range} is outside the bounds of '{source_name}' ({pages} pages)")]
  PageRangeOutOfBounds {
    source_name: String,
    range: PageRange,
    pages: u32,
  },

  #[error("page {page} is outside the bounds of '{source_name}' ({pages} pages)")]
  PageOutOfBounds {
    source_name: String,
    page: u32,
    pages: u32,
  },

  /// The source could not be opened, e.g. encrypted without a correct password.
  #[error("source '{source_name}' cannot be read: {source}")]
  Unreadable {
    source_name: String,
    #[source]
    source: DocumentError,
  },
}

/// The task body failed.
#[derive(Debug, Error)]
pub enum ExecutionError {
  #[error("document operation failed on '{source_name}': {source}")]
  Document {
    source_name: String,
    #[source]
    source: DocumentError,
  },

  #[error("failed to stage output: {0}")]
  Staging(#[from] OutputError),

  /// `execute` ran without a successful `before_execute`.
  #[error("task executed before validation")]
  NotValidated,

  #[error("task for '{expected}' received '{actual}' parameters")]
  UnexpectedOperation {
    expected: OperationKind,
    actual: OperationKind,
  },

  /// The task body panicked.
  #[error("task panicked: {message}")]
  Panicked { message: String },
}

impl ExecutionError {
  pub fn document(source_name: impl Into<String>, source: DocumentError) -> Self {
    Self::Document {
      source_name: source_name.into(),
      source,
    }
  }

  pub fn unexpected(expected: OperationKind, params: &TaskParameters) -> Self {
    Self::UnexpectedOperation {
      expected,
      actual: params.kind(),
    }
  }

  /// Build from a caught panic payload.
  pub fn panicked(payload: Box<dyn Any + Send>) -> Self {
    let message = match payload.downcast::<String>() {
      Ok(message) => *message,
      Err(payload) => match payload.downcast::<&'static str>() {
        Ok(message) => message.to_string(),
        Err(_) => "unknown panic payload".to_string(),
      },
    };
    Self::Panicked { message }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_range_error_names_the_range() {
    let err = ValidationError::PageRangeOutOfBounds {
      source_name: "test_file.txt".to_string(),
      range: PageRange::single(10),
      pages: 4,
    };
    assert_eq!(
      err.to_string(),
      "page range 10-10 is outside the bounds of 'test_file.txt' (4 pages)"
    );
  }

  #[test]
  fn test_incomplete_lists_kinds() {
    let err = ResolutionError::Incomplete {
      missing: vec![OperationKind::Merge, OperationKind::Split],
    };
    assert_eq!(err.to_string(), "task registry has no factory for: merge, split");
  }

  #[test]
  fn test_panic_payload_message() {
    let err = ExecutionError::panicked(Box::new("boom"));
    assert_eq!(err.to_string(), "task panicked: boom");

    let err = ExecutionError::panicked(Box::new(format!("page {}", 3)));
    assert_eq!(err.to_string(), "task panicked: page 3");

    let err = ExecutionError::panicked(Box::new(7_u32));
    assert_eq!(err.to_string(), "task panicked: unknown panic payload");
  }
}
