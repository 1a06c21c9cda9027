//! Document backend seam.
//!
//! Tasks never touch document bytes directly; they open sources through a
//! [`DocumentBackend`] and manipulate pages through [`Document`].

use std::io;

use quire_params::{FormatVersion, ImageFormat, Rotation, Source, TaskParameters};
use thiserror::Error;

/// Errors reported by a document backend.
#[derive(Debug, Error)]
pub enum DocumentError {
  #[error("document is encrypted and no password was given")]
  PasswordRequired,

  #[error("wrong password")]
  WrongPassword,

  #[error("malformed document: {message}")]
  Malformed { message: String },

  #[error("page {page} does not exist")]
  NoSuchPage { page: u32 },

  #[error("'{operation}' is not supported by this backend")]
  Unsupported { operation: &'static str },

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

/// Settings applied when a document is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
  pub version: Option<FormatVersion>,
  pub compress: bool,
}

impl SaveOptions {
  pub fn from_parameters(params: &TaskParameters) -> Self {
    Self {
      version: params.version.clone(),
      compress: params.compress,
    }
  }
}

/// An opened document. Pages are 1-based.
pub trait Document: Send {
  fn page_count(&self) -> u32;

  fn rotate_page(&mut self, page: u32, rotation: Rotation) -> Result<(), DocumentError>;

  /// A new document made of `pages`, in the given order.
  fn extract(&self, pages: &[u32]) -> Result<Box<dyn Document>, DocumentError>;

  /// Append every page of `other`.
  fn append(&mut self, other: &dyn Document) -> Result<(), DocumentError>;

  fn render_page(&self, page: u32, format: ImageFormat) -> Result<Vec<u8>, DocumentError>;

  fn save(&self, options: &SaveOptions) -> Result<Vec<u8>, DocumentError>;

  /// File extension for documents written by this backend.
  fn extension(&self) -> &'static str;
}

/// Opens sources as documents.
pub trait DocumentBackend: Send + Sync {
  fn open(&self, source: &Source) -> Result<Box<dyn Document>, DocumentError>;
}
