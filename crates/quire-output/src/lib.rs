//! Quire Output
//!
//! Task bodies produce named artifacts without knowing where they end up.
//! Each artifact is a temporary file plus a logical name, collected in an
//! [`OutputStaging`] in production order. Once the body has finished, the
//! execution service flushes the staging to an [`OutputDestination`]:
//!
//! ```text
//!  task body ──stage_bytes("page-1.png", ..)──▶ OutputStaging
//!                                                   │ flush_outputs(dest, overwrite)
//!                                                   ▼
//!            FileDestination | StreamDestination | DirectoryDestination | ArchiveDestination
//! ```
//!
//! Destinations accept either a single artifact or many. Files and
//! directory entries are written through a sibling temporary file and
//! renamed into place, so a reader never observes a half-written entry.
//! Flushing many artifacts is not transactional: if entry N fails, entries
//! before it stay written.

mod artifact;
mod destination;
mod error;
mod staging;

pub use artifact::OutputArtifact;
pub use destination::{
  ArchiveDestination, DirectoryDestination, FileDestination, OutputDestination, OutputShape,
  StreamDestination, open_destination,
};
pub use error::OutputError;
pub use staging::{FlushReport, OutputStaging};
