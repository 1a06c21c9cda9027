use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Where the outputs of an execution are delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputTarget {
  /// A single file. Only operations producing one artifact can target it.
  File { path: PathBuf },
  /// A directory; each artifact becomes a file named after it.
  Directory { path: PathBuf },
  /// A zip archive file; each artifact becomes an entry.
  Archive { path: PathBuf },
  /// A caller-provided stream. Produces the raw artifact for a single output,
  /// or a zip archive when the operation produces several artifacts.
  #[serde(skip)]
  Stream(StreamSink),
}

impl OutputTarget {
  pub fn file(path: impl Into<PathBuf>) -> Self {
    OutputTarget::File { path: path.into() }
  }

  pub fn directory(path: impl Into<PathBuf>) -> Self {
    OutputTarget::Directory { path: path.into() }
  }

  pub fn archive(path: impl Into<PathBuf>) -> Self {
    OutputTarget::Archive { path: path.into() }
  }

  pub fn stream(sink: StreamSink) -> Self {
    OutputTarget::Stream(sink)
  }
}

enum SinkInner {
  Memory(Vec<u8>),
  Writer(Box<dyn Write + Send>),
}

/// A shared, writable byte stream used as an output target.
///
/// Clones share the same underlying stream, so a caller can keep one handle
/// and read back what an execution wrote through the other.
#[derive(Clone)]
pub struct StreamSink {
  inner: Arc<Mutex<SinkInner>>,
}

impl StreamSink {
  /// A sink that accumulates bytes in memory.
  pub fn in_memory() -> Self {
    Self {
      inner: Arc::new(Mutex::new(SinkInner::Memory(Vec::new()))),
    }
  }

  /// A sink forwarding to an arbitrary writer.
  pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
    Self {
      inner: Arc::new(Mutex::new(SinkInner::Writer(Box::new(writer)))),
    }
  }

  pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
    let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    match &mut *inner {
      SinkInner::Memory(buffer) => {
        buffer.extend_from_slice(bytes);
        Ok(())
      }
      SinkInner::Writer(writer) => writer.write_all(bytes),
    }
  }

  pub fn flush(&self) -> io::Result<()> {
    let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    match &mut *inner {
      SinkInner::Memory(_) => Ok(()),
      SinkInner::Writer(writer) => writer.flush(),
    }
  }

  /// Bytes written so far. Always empty for writer-backed sinks.
  pub fn contents(&self) -> Vec<u8> {
    let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    match &*inner {
      SinkInner::Memory(buffer) => buffer.clone(),
      SinkInner::Writer(_) => Vec::new(),
    }
  }
}

impl Write for StreamSink {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    StreamSink::write_all(&*self, buf)?;
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    StreamSink::flush(&*self)
  }
}

impl fmt::Debug for StreamSink {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    match &*inner {
      SinkInner::Memory(buffer) => write!(f, "StreamSink::Memory({} bytes)", buffer.len()),
      SinkInner::Writer(_) => f.write_str("StreamSink::Writer"),
    }
  }
}
