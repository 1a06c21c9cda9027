use std::io::Read;
use std::path::{Path, PathBuf};

use crate::destination::{OutputDestination, persist};
use crate::error::OutputError;

/// A single output file. The artifact's logical name is not used.
#[derive(Debug, Clone)]
pub struct FileDestination {
  path: PathBuf,
}

impl FileDestination {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl OutputDestination for FileDestination {
  fn accepts_multiple(&self) -> bool {
    false
  }

  fn write(
    &mut self,
    _name: &str,
    content: &mut dyn Read,
    overwrite: bool,
  ) -> Result<(), OutputError> {
    persist(&self.path, content, overwrite)
  }

  fn describe(&self) -> String {
    format!("file {}", self.path.display())
  }
}
