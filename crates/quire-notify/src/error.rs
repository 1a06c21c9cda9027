use thiserror::Error;

/// A listener callback failed.
///
/// Listener errors are isolated by the bus: they are logged and never reach
/// the execution or other listeners.
#[derive(Debug, Error)]
pub enum ListenerError {
  /// The callback reported a failure.
  #[error("listener callback failed: {message}")]
  Callback { message: String },

  /// The receiving end of a channel listener was dropped.
  #[error("listener channel closed")]
  ChannelClosed,
}

impl ListenerError {
  pub fn callback(message: impl Into<String>) -> Self {
    Self::Callback {
      message: message.into(),
    }
  }
}
