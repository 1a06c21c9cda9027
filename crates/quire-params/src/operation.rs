use std::fmt;

use serde::{Deserialize, Serialize};

use crate::page::PageRange;

/// The requested operation and its operation-specific settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
  /// Rotate the selected pages of every source.
  Rotate {
    rotation: Rotation,
    /// Pages to rotate. Empty means all pages.
    #[serde(default)]
    pages: Vec<PageRange>,
  },
  /// Split every source into several documents.
  Split {
    /// Page numbers after which a new document starts.
    split_after: Vec<u32>,
  },
  /// Concatenate all sources into one document.
  Merge,
  /// Render pages of a single source to images, one artifact per page.
  ConvertToImage {
    format: ImageFormat,
    /// Pages to render. Empty means all pages.
    #[serde(default)]
    pages: Vec<PageRange>,
  },
}

impl Operation {
  /// The kind tag used to look up the task that runs this operation.
  pub fn kind(&self) -> OperationKind {
    match self {
      Operation::Rotate { .. } => OperationKind::Rotate,
      Operation::Split { .. } => OperationKind::Split,
      Operation::Merge => OperationKind::Merge,
      Operation::ConvertToImage { .. } => OperationKind::ConvertToImage,
    }
  }
}

/// Kind tag for an [`Operation`], without its settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
  Rotate,
  Split,
  Merge,
  ConvertToImage,
}

impl OperationKind {
  /// Every operation kind. Task registries are checked against this list.
  pub const ALL: [OperationKind; 4] = [
    OperationKind::Rotate,
    OperationKind::Split,
    OperationKind::Merge,
    OperationKind::ConvertToImage,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OperationKind::Rotate => "rotate",
      OperationKind::Split => "split",
      OperationKind::Merge => "merge",
      OperationKind::ConvertToImage => "convert_to_image",
    }
  }
}

impl fmt::Display for OperationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Clockwise page rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
  Degrees90,
  Degrees180,
  Degrees270,
}

impl Rotation {
  pub fn degrees(&self) -> u16 {
    match self {
      Rotation::Degrees90 => 90,
      Rotation::Degrees180 => 180,
      Rotation::Degrees270 => 270,
    }
  }
}

/// Image encoding for page conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
  Png,
  Jpeg,
  Tiff,
}

impl ImageFormat {
  /// File extension used when naming rendered pages.
  pub fn extension(&self) -> &'static str {
    match self {
      ImageFormat::Png => "png",
      ImageFormat::Jpeg => "jpg",
      ImageFormat::Tiff => "tiff",
    }
  }
}
