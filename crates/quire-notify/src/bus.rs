//! Listener registry and synchronous event delivery.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{trace, warn};

use crate::event::{Event, EventKind};
use crate::listener::{EventListener, ListenerId};

struct Registration {
  id: ListenerId,
  kinds: Vec<EventKind>,
  listener: Arc<dyn EventListener>,
}

/// Outcome of delivering one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
  /// Listeners that handled the event.
  pub delivered: usize,
  /// Listeners that returned an error or panicked.
  pub failed: usize,
}

/// A set of listeners and the events published to them.
///
/// Registration and delivery never overlap on the registry itself: `notify`
/// snapshots the matching listeners under the lock and delivers after
/// releasing it, so a listener may add or remove listeners while handling an
/// event. Such changes apply from the next event on.
#[derive(Default)]
pub struct NotificationBus {
  registrations: Mutex<Vec<Registration>>,
}

impl NotificationBus {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, Vec<Registration>> {
    // Listeners run outside the lock, so a poisoned registry only means a
    // panic during add/remove; the Vec is still consistent.
    self
      .registrations
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  /// Register a listener for subsequent events.
  ///
  /// A listener with the same id is removed first, so each listener receives
  /// an event at most once no matter how often it was added.
  pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
    let id = listener.id();
    let kinds = listener.kinds();
    let mut registrations = self.lock();
    registrations.retain(|r| r.id != id);
    trace!(listener = %id, ?kinds, "listener registered");
    registrations.push(Registration {
      id,
      kinds,
      listener,
    });
  }

  /// Remove a listener. Returns false if it was not registered.
  pub fn remove_listener(&self, id: &ListenerId) -> bool {
    let mut registrations = self.lock();
    let before = registrations.len();
    registrations.retain(|r| &r.id != id);
    before != registrations.len()
  }

  pub fn contains(&self, id: &ListenerId) -> bool {
    self.lock().iter().any(|r| &r.id == id)
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  pub fn clear(&self) {
    self.lock().clear();
  }

  /// Deliver `event` to every listener subscribed to its kind.
  ///
  /// A failing listener does not prevent delivery to the ones after it.
  pub fn notify(&self, event: &Event) -> Delivery {
    let kind = event.kind();
    let targets: Vec<(ListenerId, Arc<dyn EventListener>)> = self
      .lock()
      .iter()
      .filter(|r| r.kinds.contains(&kind))
      .map(|r| (r.id.clone(), Arc::clone(&r.listener)))
      .collect();

    let mut delivery = Delivery::default();
    for (id, listener) in targets {
      match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
        Ok(Ok(())) => delivery.delivered += 1,
        Ok(Err(e)) => {
          warn!(
            listener = %id,
            execution_id = %event.execution_id(),
            error = %e,
            "listener failed"
          );
          delivery.failed += 1;
        }
        Err(_) => {
          warn!(
            listener = %id,
            execution_id = %event.execution_id(),
            "listener panicked"
          );
          delivery.failed += 1;
        }
      }
    }

    delivery
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::error::ListenerError;
  use crate::event::FailureKind;
  use crate::listener::FnListener;

  fn progress(percent: u8) -> Event {
    Event::ProgressChanged {
      execution_id: "exec-1".to_string(),
      percent,
    }
  }

  fn counting_listener(id: &str, counter: Arc<AtomicUsize>) -> Arc<dyn EventListener> {
    Arc::new(FnListener::new(ListenerId::new(id), move |_| {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }))
  }

  #[test]
  fn test_same_id_registered_twice_delivers_once() {
    let bus = NotificationBus::new();
    let count = Arc::new(AtomicUsize::new(0));

    bus.add_listener(counting_listener("log", count.clone()));
    bus.add_listener(counting_listener("log", count.clone()));

    let delivery = bus.notify(&progress(10));
    assert_eq!(delivery.delivered, 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(bus.len(), 1);
  }

  #[test]
  fn test_remove_absent_listener_is_noop() {
    let bus = NotificationBus::new();
    assert!(!bus.remove_listener(&ListenerId::new("missing")));

    bus.add_listener(counting_listener("a", Arc::new(AtomicUsize::new(0))));
    assert!(bus.remove_listener(&ListenerId::new("a")));
    assert!(bus.is_empty());
  }

  #[test]
  fn test_delivery_in_registration_order() {
    let bus = NotificationBus::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second", "third"] {
      let order = order.clone();
      bus.add_listener(Arc::new(FnListener::new(ListenerId::new(name), move |_| {
        order.lock().unwrap().push(name);
        Ok(())
      })));
    }

    bus.notify(&progress(1));
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
  }

  #[test]
  fn test_readding_moves_listener_to_end() {
    let bus = NotificationBus::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let make = |name: &'static str| -> Arc<dyn EventListener> {
      let order = order.clone();
      Arc::new(FnListener::new(ListenerId::new(name), move |_| {
        order.lock().unwrap().push(name);
        Ok(())
      }))
    };

    bus.add_listener(make("a"));
    bus.add_listener(make("b"));
    bus.add_listener(make("a"));

    bus.notify(&progress(1));
    assert_eq!(*order.lock().unwrap(), vec!["b", "a"]);
  }

  #[test]
  fn test_failing_listener_does_not_block_others() {
    let bus = NotificationBus::new();
    let count = Arc::new(AtomicUsize::new(0));

    bus.add_listener(Arc::new(FnListener::new(ListenerId::new("err"), |_| {
      Err(ListenerError::callback("boom"))
    })));
    bus.add_listener(Arc::new(FnListener::new(ListenerId::new("panic"), |_| {
      panic!("listener panic")
    })));
    bus.add_listener(counting_listener("ok", count.clone()));

    let delivery = bus.notify(&progress(5));
    assert_eq!(delivery.failed, 2);
    assert_eq!(delivery.delivered, 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // The bus stays usable after a panicking listener.
    bus.notify(&progress(6));
    assert_eq!(count.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn test_only_subscribed_kinds_are_delivered() {
    let bus = NotificationBus::new();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();

    bus.add_listener(Arc::new(FnListener::for_kinds(
      ListenerId::new("failures"),
      &[EventKind::Failed],
      move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
      },
    )));

    bus.notify(&progress(50));
    assert_eq!(count.load(Ordering::SeqCst), 0);

    bus.notify(&Event::Failed {
      execution_id: "exec-1".to_string(),
      kind: FailureKind::Execution,
      cause: "broken".to_string(),
    });
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_listener_can_register_during_delivery() {
    let bus = Arc::new(NotificationBus::new());
    let late_count = Arc::new(AtomicUsize::new(0));

    let bus_ref = bus.clone();
    let late = late_count.clone();
    bus.add_listener(Arc::new(FnListener::new(ListenerId::new("adder"), move |_| {
      bus_ref.add_listener(counting_listener("late", late.clone()));
      Ok(())
    })));

    bus.notify(&progress(1));
    assert_eq!(late_count.load(Ordering::SeqCst), 0);

    bus.notify(&progress(2));
    assert_eq!(late_count.load(Ordering::SeqCst), 1);
  }
}
