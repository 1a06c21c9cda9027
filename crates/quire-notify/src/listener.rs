//! Listener trait and stock implementations.

use std::fmt;

use tokio::sync::mpsc;

use crate::error::ListenerError;
use crate::event::{Event, EventKind};

/// Stable identity of a listener.
///
/// The bus compares listeners by id, never by the callback itself:
/// registering a listener whose id is already present replaces the earlier
/// registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(String);

impl ListenerId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  /// A fresh, random id.
  pub fn unique() -> Self {
    Self(uuid::Uuid::new_v4().to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ListenerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Receives events from a [`NotificationBus`](crate::NotificationBus).
pub trait EventListener: Send + Sync {
  /// Identity used for de-duplication and removal.
  fn id(&self) -> ListenerId;

  /// Event kinds this listener subscribes to. Read once, at registration.
  fn kinds(&self) -> Vec<EventKind> {
    EventKind::ALL.to_vec()
  }

  /// Called synchronously for each subscribed event.
  fn on_event(&self, event: &Event) -> Result<(), ListenerError>;
}

/// A listener backed by a closure.
pub struct FnListener<F> {
  id: ListenerId,
  kinds: Vec<EventKind>,
  callback: F,
}

impl<F> FnListener<F>
where
  F: Fn(&Event) -> Result<(), ListenerError> + Send + Sync,
{
  /// Listen to every event kind.
  pub fn new(id: ListenerId, callback: F) -> Self {
    Self {
      id,
      kinds: EventKind::ALL.to_vec(),
      callback,
    }
  }

  /// Listen to the given event kinds only.
  pub fn for_kinds(id: ListenerId, kinds: &[EventKind], callback: F) -> Self {
    Self {
      id,
      kinds: kinds.to_vec(),
      callback,
    }
  }
}

impl<F> EventListener for FnListener<F>
where
  F: Fn(&Event) -> Result<(), ListenerError> + Send + Sync,
{
  fn id(&self) -> ListenerId {
    self.id.clone()
  }

  fn kinds(&self) -> Vec<EventKind> {
    self.kinds.clone()
  }

  fn on_event(&self, event: &Event) -> Result<(), ListenerError> {
    (self.callback)(event)
  }
}

/// A listener that forwards events to an unbounded channel.
///
/// Use this to consume events asynchronously (stream to a UI, persist, or
/// assert on them in tests).
#[derive(Debug, Clone)]
pub struct ChannelListener {
  id: ListenerId,
  // Unbounded so delivery never waits on a slow consumer; event volume per
  // execution is small (progress steps plus one terminal event).
  sender: mpsc::UnboundedSender<Event>,
}

impl ChannelListener {
  pub fn new(id: ListenerId, sender: mpsc::UnboundedSender<Event>) -> Self {
    Self { id, sender }
  }
}

impl EventListener for ChannelListener {
  fn id(&self) -> ListenerId {
    self.id.clone()
  }

  fn on_event(&self, event: &Event) -> Result<(), ListenerError> {
    self
      .sender
      .send(event.clone())
      .map_err(|_| ListenerError::ChannelClosed)
  }
}

/// A listener that discards all events.
#[derive(Debug, Clone)]
pub struct NoopListener {
  id: ListenerId,
}

impl NoopListener {
  pub fn new(id: ListenerId) -> Self {
    Self { id }
  }
}

impl EventListener for NoopListener {
  fn id(&self) -> ListenerId {
    self.id.clone()
  }

  fn on_event(&self, _event: &Event) -> Result<(), ListenerError> {
    Ok(())
  }
}
