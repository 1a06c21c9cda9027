use std::io::{self, Read};

use quire_params::StreamSink;

use crate::destination::OutputDestination;
use crate::error::OutputError;

/// A caller-provided stream receiving exactly one artifact.
///
/// The stream is fresh, so there is nothing to conflict with and the
/// overwrite policy does not apply.
#[derive(Debug, Clone)]
pub struct StreamDestination {
  sink: StreamSink,
}

impl StreamDestination {
  pub fn new(sink: StreamSink) -> Self {
    Self { sink }
  }
}

impl OutputDestination for StreamDestination {
  fn accepts_multiple(&self) -> bool {
    false
  }

  fn write(
    &mut self,
    _name: &str,
    content: &mut dyn Read,
    _overwrite: bool,
  ) -> Result<(), OutputError> {
    io::copy(content, &mut self.sink)?;
    Ok(())
  }

  fn finish(&mut self, _overwrite: bool) -> Result<(), OutputError> {
    self.sink.flush()?;
    Ok(())
  }

  fn describe(&self) -> String {
    "stream".to_string()
  }
}
