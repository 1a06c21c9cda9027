use std::fs::File;
use std::io;
use std::path::Path;

use tempfile::{NamedTempFile, TempPath};

/// A produced output waiting to be flushed: a temporary file and the name it
/// should have at the destination.
///
/// The temporary file is deleted when the artifact is dropped, so discarded
/// artifacts are cleaned up on a best-effort basis.
#[derive(Debug)]
pub struct OutputArtifact {
  name: String,
  path: TempPath,
}

impl OutputArtifact {
  pub fn new(name: impl Into<String>, file: NamedTempFile) -> Self {
    Self::from_temp_path(name, file.into_temp_path())
  }

  pub fn from_temp_path(name: impl Into<String>, path: TempPath) -> Self {
    Self {
      name: name.into(),
      path,
    }
  }

  /// Logical name at the destination.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Location of the backing temporary file.
  pub fn path(&self) -> &Path {
    &self.path
  }

  pub(crate) fn open(&self) -> io::Result<File> {
    File::open(&self.path)
  }

  /// Delete the backing file, reporting failure instead of ignoring it.
  pub(crate) fn delete(self) -> io::Result<()> {
    self.path.close()
  }
}
