use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::artifact::OutputArtifact;
use crate::destination::OutputDestination;
use crate::error::OutputError;

/// Result of a successful flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
  /// Logical names written, in flush order.
  pub written: Vec<String>,
}

/// Ordered collection of artifacts produced by one execution.
///
/// A staging belongs to exactly one execution and is never shared.
#[derive(Debug, Default)]
pub struct OutputStaging {
  artifacts: Vec<OutputArtifact>,
  staging_dir: Option<PathBuf>,
}

impl OutputStaging {
  /// Stage temporary files in the system temp directory.
  pub fn new() -> Self {
    Self::default()
  }

  /// Stage temporary files in `dir`.
  pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
    Self {
      artifacts: Vec::new(),
      staging_dir: Some(dir.into()),
    }
  }

  /// Append an artifact. Insertion order is the flush order.
  pub fn add_output(&mut self, artifact: OutputArtifact) {
    debug!(name = %artifact.name(), "output staged");
    self.artifacts.push(artifact);
  }

  /// Create an empty temporary file in the staging directory, for bodies that
  /// stream their output before calling [`add_output`](Self::add_output).
  pub fn temp_file(&self) -> Result<NamedTempFile, OutputError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("quire-").suffix(".tmp");
    let file = match &self.staging_dir {
      Some(dir) => {
        std::fs::create_dir_all(dir)?;
        builder.tempfile_in(dir)?
      }
      None => builder.tempfile()?,
    };
    Ok(file)
  }

  /// Write `bytes` to a new temporary file and stage it as `name`.
  pub fn stage_bytes(&mut self, name: impl Into<String>, bytes: &[u8]) -> Result<(), OutputError> {
    let mut file = self.temp_file()?;
    file.write_all(bytes)?;
    file.flush()?;
    self.add_output(OutputArtifact::new(name, file));
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.artifacts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.artifacts.is_empty()
  }

  /// Logical names in insertion order.
  pub fn names(&self) -> Vec<&str> {
    self.artifacts.iter().map(|a| a.name()).collect()
  }

  /// Backing files in insertion order.
  pub fn paths(&self) -> Vec<&Path> {
    self.artifacts.iter().map(|a| a.path()).collect()
  }

  /// Drop every staged artifact, deleting the temporary files.
  pub fn discard(&mut self) {
    if !self.artifacts.is_empty() {
      debug!(count = self.artifacts.len(), "discarding staged outputs");
    }
    self.artifacts.clear();
  }

  /// Write every staged artifact to `destination`.
  ///
  /// Name checks and shape checks happen before anything is written. On
  /// success the temporary files are deleted and the staging is empty. On
  /// failure, entries already written stay at the destination and the
  /// staging must not be flushed again.
  pub fn flush_outputs(
    &mut self,
    destination: &mut dyn OutputDestination,
    overwrite: bool,
  ) -> Result<FlushReport, OutputError> {
    if self.artifacts.is_empty() {
      return Err(OutputError::NothingToFlush);
    }
    self.check_names()?;
    if !destination.accepts_multiple() && self.artifacts.len() > 1 {
      return Err(OutputError::MultipleOutputsForSingleDestination {
        count: self.artifacts.len(),
      });
    }

    debug!(
      destination = %destination.describe(),
      count = self.artifacts.len(),
      overwrite,
      "flushing outputs"
    );

    for artifact in &self.artifacts {
      let mut content = artifact.open()?;
      destination.write(artifact.name(), &mut content, overwrite)?;
    }
    destination.finish(overwrite)?;

    let mut report = FlushReport::default();
    for artifact in self.artifacts.drain(..) {
      report.written.push(artifact.name().to_string());
      let path = artifact.path().to_path_buf();
      if let Err(e) = artifact.delete() {
        warn!(path = %path.display(), error = %e, "failed to delete flushed temporary file");
      }
    }

    Ok(report)
  }

  fn check_names(&self) -> Result<(), OutputError> {
    let mut seen = HashSet::new();
    for artifact in &self.artifacts {
      let name = artifact.name();
      if !is_valid_name(name) {
        return Err(OutputError::InvalidName {
          name: name.to_string(),
        });
      }
      if !seen.insert(name) {
        return Err(OutputError::DuplicateName {
          name: name.to_string(),
        });
      }
    }
    Ok(())
  }
}

/// A name must denote a single entry directly under the destination.
fn is_valid_name(name: &str) -> bool {
  !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
