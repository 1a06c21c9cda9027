//! Output destinations.

mod archive;
mod directory;
mod file;
mod stream;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use quire_params::OutputTarget;
use tempfile::NamedTempFile;

use crate::error::OutputError;

pub use archive::ArchiveDestination;
pub use directory::DirectoryDestination;
pub use file::FileDestination;
pub use stream::StreamDestination;

/// Whether an operation produces one artifact or a set of artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
  Single,
  Multiple,
}

/// A place staged artifacts are flushed to.
pub trait OutputDestination: Send {
  /// Whether more than one artifact can be written.
  fn accepts_multiple(&self) -> bool;

  /// Write one artifact under `name`.
  ///
  /// With `overwrite == false` an existing entry fails with
  /// [`OutputError::Conflict`].
  fn write(&mut self, name: &str, content: &mut dyn Read, overwrite: bool)
  -> Result<(), OutputError>;

  /// Complete the destination after the last write.
  fn finish(&mut self, _overwrite: bool) -> Result<(), OutputError> {
    Ok(())
  }

  /// Human-readable description for logs.
  fn describe(&self) -> String;
}

/// Open the destination described by `target`.
///
/// Stream targets receive the raw artifact for single-output operations and a
/// zip archive for multiple-output operations.
pub fn open_destination(
  target: &OutputTarget,
  shape: OutputShape,
  compress: bool,
) -> Box<dyn OutputDestination> {
  match target {
    OutputTarget::File { path } => Box::new(FileDestination::new(path)),
    OutputTarget::Directory { path } => Box::new(DirectoryDestination::new(path)),
    OutputTarget::Archive { path } => Box::new(ArchiveDestination::to_file(path, compress)),
    OutputTarget::Stream(sink) => match shape {
      OutputShape::Single => Box::new(StreamDestination::new(sink.clone())),
      OutputShape::Multiple => Box::new(ArchiveDestination::to_stream(sink.clone(), compress)),
    },
  }
}

/// Write `content` to `path` through a sibling temporary file.
///
/// Without overwrite the final rename refuses to replace an existing file, so
/// an entry created concurrently is still reported as a conflict.
pub(crate) fn persist(
  path: &Path,
  content: &mut dyn Read,
  overwrite: bool,
) -> Result<(), OutputError> {
  check_vacant(path, overwrite)?;
  let mut temp = sibling_temp(path)?;
  io::copy(content, &mut temp)?;
  commit(temp, path, overwrite)
}

/// Fail early when `path` exists and may not be replaced.
pub(crate) fn check_vacant(path: &Path, overwrite: bool) -> Result<(), OutputError> {
  if !overwrite && path.exists() {
    return Err(OutputError::Conflict {
      path: path.to_path_buf(),
    });
  }
  Ok(())
}

/// A temporary file in the directory `path` will be renamed into.
pub(crate) fn sibling_temp(path: &Path) -> Result<NamedTempFile, OutputError> {
  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  fs::create_dir_all(dir)?;
  Ok(tempfile::Builder::new().prefix(".quire-").tempfile_in(dir)?)
}

/// Sync `temp` and rename it to `path`.
pub(crate) fn commit(temp: NamedTempFile, path: &Path, overwrite: bool) -> Result<(), OutputError> {
  temp.as_file().sync_all()?;
  if overwrite {
    temp.persist(path).map_err(|e| OutputError::Io(e.error))?;
  } else {
    temp.persist_noclobber(path).map_err(|e| {
      if e.error.kind() == io::ErrorKind::AlreadyExists {
        OutputError::Conflict {
          path: path.to_path_buf(),
        }
      } else {
        OutputError::Io(e.error)
      }
    })?;
  }
  Ok(())
}
