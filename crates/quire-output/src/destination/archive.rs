use std::io::{self, Read, Seek};
use std::path::PathBuf;

use quire_params::StreamSink;
use tempfile::NamedTempFile;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::destination::{OutputDestination, check_vacant, commit, sibling_temp};
use crate::error::OutputError;

#[derive(Debug)]
enum ArchiveTarget {
  Stream(StreamSink),
  File(PathBuf),
}

enum ArchiveState {
  Idle,
  Writing(ZipWriter<NamedTempFile>),
  Finished,
}

/// A zip archive; each artifact becomes an entry, in write order.
///
/// The archive is spooled to a temporary file, next to the final path for a
/// file target, and emitted on [`finish`]. Entries are never in conflict
/// because the archive is always fresh; for a file target the overwrite
/// policy applies to the archive file itself.
///
/// [`finish`]: OutputDestination::finish
pub struct ArchiveDestination {
  target: ArchiveTarget,
  state: ArchiveState,
  options: SimpleFileOptions,
}

impl ArchiveDestination {
  fn with_target(target: ArchiveTarget, compress: bool) -> Self {
    let method = if compress {
      CompressionMethod::Deflated
    } else {
      CompressionMethod::Stored
    };
    Self {
      target,
      state: ArchiveState::Idle,
      options: SimpleFileOptions::default()
        .compression_method(method)
        .large_file(true),
    }
  }

  /// Emit the archive to a caller-provided stream.
  pub fn to_stream(sink: StreamSink, compress: bool) -> Self {
    Self::with_target(ArchiveTarget::Stream(sink), compress)
  }

  /// Emit the archive to a file.
  pub fn to_file(path: impl Into<PathBuf>, compress: bool) -> Self {
    Self::with_target(ArchiveTarget::File(path.into()), compress)
  }

  /// The zip writer, creating the spool file on first use.
  fn writer(&mut self, overwrite: bool) -> Result<&mut ZipWriter<NamedTempFile>, OutputError> {
    if let ArchiveState::Idle = self.state {
      let spool = match &self.target {
        ArchiveTarget::Stream(_) => NamedTempFile::new()?,
        ArchiveTarget::File(path) => {
          check_vacant(path, overwrite)?;
          sibling_temp(path)?
        }
      };
      self.state = ArchiveState::Writing(ZipWriter::new(spool));
    }
    match &mut self.state {
      ArchiveState::Writing(writer) => Ok(writer),
      _ => Err(finished()),
    }
  }
}

fn finished() -> OutputError {
  OutputError::Io(io::Error::other("archive already finished"))
}

impl OutputDestination for ArchiveDestination {
  fn accepts_multiple(&self) -> bool {
    true
  }

  fn write(
    &mut self,
    name: &str,
    content: &mut dyn Read,
    overwrite: bool,
  ) -> Result<(), OutputError> {
    let options = self.options.clone();
    let writer = self.writer(overwrite)?;
    writer.start_file(name.to_string(), options)?;
    io::copy(content, writer)?;
    Ok(())
  }

  fn finish(&mut self, overwrite: bool) -> Result<(), OutputError> {
    self.writer(overwrite)?;
    let ArchiveState::Writing(writer) = std::mem::replace(&mut self.state, ArchiveState::Finished)
    else {
      return Err(finished());
    };
    let mut spool = writer.finish()?;

    match &self.target {
      ArchiveTarget::Stream(sink) => {
        spool.rewind()?;
        let mut sink = sink.clone();
        io::copy(&mut spool, &mut sink)?;
        sink.flush()?;
      }
      ArchiveTarget::File(path) => commit(spool, path, overwrite)?,
    }
    Ok(())
  }

  fn describe(&self) -> String {
    match &self.target {
      ArchiveTarget::Stream(_) => "archive stream".to_string(),
      ArchiveTarget::File(path) => format!("archive {}", path.display()),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::io::Cursor;

  use super::*;

  fn entries(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
      .map(|i| {
        let mut file = archive.by_index(i).unwrap();
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        (file.name().to_string(), content)
      })
      .collect()
  }

  #[test]
  fn test_stream_archive_entries_in_order() {
    let sink = StreamSink::in_memory();
    let mut dest = ArchiveDestination::to_stream(sink.clone(), true);

    dest.write("b.txt", &mut &b"second"[..], false).unwrap();
    dest.write("a.txt", &mut &b"first"[..], false).unwrap();
    dest.finish(false).unwrap();

    assert_eq!(
      entries(sink.contents()),
      vec![
        ("b.txt".to_string(), b"second".to_vec()),
        ("a.txt".to_string(), b"first".to_vec()),
      ]
    );
  }

  #[test]
  fn test_archive_file_obeys_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.zip");
    fs::write(&path, b"not a zip").unwrap();

    let mut dest = ArchiveDestination::to_file(&path, false);
    let err = dest.write("a.txt", &mut &b"a"[..], false).unwrap_err();
    assert!(matches!(err, OutputError::Conflict { .. }));
    assert_eq!(fs::read(&path).unwrap(), b"not a zip");

    let mut dest = ArchiveDestination::to_file(&path, false);
    dest.write("a.txt", &mut &b"a"[..], true).unwrap();
    dest.finish(true).unwrap();
    assert_eq!(entries(fs::read(&path).unwrap()).len(), 1);
  }

  #[test]
  fn test_archive_file_spools_next_to_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.zip");

    let mut dest = ArchiveDestination::to_file(&path, true);
    dest.write("a.txt", &mut &b"a"[..], false).unwrap();
    // Only the spool file exists until finish.
    let spooled: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(spooled.len(), 1);
    assert!(!path.exists());

    dest.write("b.txt", &mut &b"b"[..], false).unwrap();
    dest.finish(false).unwrap();
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    assert_eq!(
      entries(fs::read(&path).unwrap()),
      vec![
        ("a.txt".to_string(), b"a".to_vec()),
        ("b.txt".to_string(), b"b".to_vec()),
      ]
    );
  }

  #[test]
  fn test_write_after_finish_fails() {
    let mut dest = ArchiveDestination::to_stream(StreamSink::in_memory(), false);
    dest.finish(false).unwrap();
    assert!(dest.write("late.txt", &mut &b"x"[..], false).is_err());
  }
}
