use std::io::Read;
use std::path::{Path, PathBuf};

use crate::destination::{OutputDestination, persist};
use crate::error::OutputError;

/// A directory; each artifact becomes a file named after it.
///
/// The overwrite policy applies to each entry independently.
#[derive(Debug, Clone)]
pub struct DirectoryDestination {
  root: PathBuf,
}

impl DirectoryDestination {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl OutputDestination for DirectoryDestination {
  fn accepts_multiple(&self) -> bool {
    true
  }

  fn write(
    &mut self,
    name: &str,
    content: &mut dyn Read,
    overwrite: bool,
  ) -> Result<(), OutputError> {
    persist(&self.root.join(name), content, overwrite)
  }

  fn describe(&self) -> String {
    format!("directory {}", self.root.display())
  }
}
