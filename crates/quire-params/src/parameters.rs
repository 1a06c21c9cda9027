use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operation::{Operation, OperationKind};
use crate::output::OutputTarget;
use crate::source::Source;

/// Target format version for written documents, e.g. `"1.4"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatVersion(pub String);

impl fmt::Display for FormatVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A request to run one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskParameters {
  #[serde(flatten)]
  pub operation: Operation,
  #[serde(default)]
  pub sources: Vec<Source>,
  pub output: OutputTarget,
  /// Replace existing destination entries instead of failing.
  #[serde(default)]
  pub overwrite: bool,
  #[serde(default)]
  pub compress: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<FormatVersion>,
  /// Prepended to the name of every produced artifact.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub output_prefix: Option<String>,
}

impl TaskParameters {
  pub fn new(operation: Operation, output: OutputTarget) -> Self {
    Self {
      operation,
      sources: Vec::new(),
      output,
      overwrite: false,
      compress: false,
      version: None,
      output_prefix: None,
    }
  }

  pub fn kind(&self) -> OperationKind {
    self.operation.kind()
  }

  pub fn with_source(mut self, source: Source) -> Self {
    self.sources.push(source);
    self
  }

  pub fn with_overwrite(mut self, overwrite: bool) -> Self {
    self.overwrite = overwrite;
    self
  }

  pub fn with_compress(mut self, compress: bool) -> Self {
    self.compress = compress;
    self
  }

  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.version = Some(FormatVersion(version.into()));
    self
  }

  pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.output_prefix = Some(prefix.into());
    self
  }

  /// `name` with the configured output prefix prepended.
  pub fn prefixed(&self, name: &str) -> String {
    match &self.output_prefix {
      Some(prefix) => format!("{}{}", prefix, name),
      None => name.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{PageRange, Rotation, SourceLocation};

  #[test]
  fn test_parameters_from_json() {
    let json = r#"{
      "operation": "rotate",
      "rotation": "degrees90",
      "pages": [{"start": 2, "end": 4}],
      "sources": [{"name": "test_file.txt", "path": "in/test_file.txt"}],
      "output": {"type": "directory", "path": "out"},
      "overwrite": true,
      "version": "1.4",
      "output_prefix": "test_prefix_"
    }"#;

    let params: TaskParameters = serde_json::from_str(json).unwrap();
    assert_eq!(params.kind(), OperationKind::Rotate);
    assert_eq!(
      params.operation,
      Operation::Rotate {
        rotation: Rotation::Degrees90,
        pages: vec![PageRange::new(2, 4)],
      }
    );
    assert!(params.overwrite);
    assert!(!params.compress);
    assert_eq!(params.version, Some(FormatVersion("1.4".to_string())));
    assert!(matches!(
      params.sources[0].location,
      SourceLocation::File { .. }
    ));
    assert_eq!(params.prefixed("test_file.txt"), "test_prefix_test_file.txt");
  }

  #[test]
  fn test_builder_defaults() {
    let params = TaskParameters::new(Operation::Merge, OutputTarget::file("out.txt"))
      .with_source(Source::inline("a", "x"))
      .with_source(Source::inline("b", "y"));

    assert_eq!(params.sources.len(), 2);
    assert!(!params.overwrite);
    assert_eq!(params.prefixed("merged.txt"), "merged.txt");
  }
}
