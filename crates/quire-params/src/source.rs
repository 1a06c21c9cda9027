use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// An input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
  /// Logical name, used when naming outputs derived from this source.
  pub name: String,
  #[serde(flatten)]
  pub location: SourceLocation,
  /// Credential for encrypted documents.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
}

/// Where the bytes of a [`Source`] come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceLocation {
  File { path: PathBuf },
  Inline { bytes: Vec<u8> },
}

impl Source {
  /// A source read from a file; the name defaults to the file name.
  pub fn file(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.to_string_lossy().into_owned());
    Self {
      name,
      location: SourceLocation::File { path },
      password: None,
    }
  }

  /// A source held in memory.
  pub fn inline(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
    Self {
      name: name.into(),
      location: SourceLocation::Inline {
        bytes: bytes.into(),
      },
      password: None,
    }
  }

  pub fn with_password(mut self, password: impl Into<String>) -> Self {
    self.password = Some(password.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_file_source_takes_file_name() {
    let source = Source::file("/tmp/docs/report.txt");
    assert_eq!(source.name, "report.txt");
    assert_eq!(
      source.location,
      SourceLocation::File {
        path: PathBuf::from("/tmp/docs/report.txt")
      }
    );
  }

  #[test]
  fn test_location_deserializes_untagged() {
    let source: Source =
      serde_json::from_str(r#"{"name": "a.txt", "path": "in/a.txt", "password": "test"}"#)
        .unwrap();
    assert_eq!(source.password.as_deref(), Some("test"));
    assert!(matches!(source.location, SourceLocation::File { .. }));

    let source: Source = serde_json::from_str(r#"{"name": "b.txt", "bytes": [104, 105]}"#).unwrap();
    assert_eq!(
      source.location,
      SourceLocation::Inline {
        bytes: b"hi".to_vec()
      }
    );
  }
}
