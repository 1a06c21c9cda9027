use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while staging or flushing outputs.
#[derive(Debug, Error)]
pub enum OutputError {
  /// The destination entry exists and overwrite was not allowed.
  #[error("destination already exists: {}", path.display())]
  Conflict { path: PathBuf },

  /// Two staged artifacts share a logical name.
  #[error("duplicate output name: {name}")]
  DuplicateName { name: String },

  /// A logical name cannot be used as a destination entry.
  #[error("invalid output name: '{name}'")]
  InvalidName { name: String },

  /// Flush was requested with nothing staged.
  #[error("no outputs to flush")]
  NothingToFlush,

  /// Several artifacts were staged for a destination that holds one.
  #[error("{count} outputs cannot be written to a single-output destination")]
  MultipleOutputsForSingleDestination { count: usize },

  /// Writing the archive failed.
  #[error("archive error: {0}")]
  Archive(#[from] zip::result::ZipError),

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}
