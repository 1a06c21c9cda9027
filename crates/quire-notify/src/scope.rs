//! Notification scoping for concurrent executions.
//!
//! An [`ExecutionScope`] is opened from a [`NotificationContext`] at the start
//! of an execution. Under [`ScopeStrategy::ExecutionScoped`] the scope owns a
//! fresh bus, which [`ExecutionScope::run`] binds as tokio task-local storage
//! for the duration of the execution future. The binding is released when the
//! future completes, fails or is dropped. Code running inside the future can
//! reach the bound bus with [`current`].

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bus::NotificationBus;
use crate::listener::{EventListener, ListenerId};

tokio::task_local! {
  static SCOPED_BUS: Arc<NotificationBus>;
}

/// The bus bound by the enclosing [`ExecutionScope::run`], if any.
pub fn current() -> Option<Arc<NotificationBus>> {
  SCOPED_BUS.try_with(Arc::clone).ok()
}

/// How executions are mapped to buses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeStrategy {
  /// All executions share the context's bus.
  #[default]
  Global,
  /// Each execution gets its own bus.
  ExecutionScoped,
}

/// Owner of the process-wide bus and of the scoping strategy.
pub struct NotificationContext {
  strategy: ScopeStrategy,
  global: Arc<NotificationBus>,
}

impl NotificationContext {
  pub fn new(strategy: ScopeStrategy) -> Self {
    Self {
      strategy,
      global: Arc::new(NotificationBus::new()),
    }
  }

  pub fn strategy(&self) -> ScopeStrategy {
    self.strategy
  }

  /// The bus shared across executions.
  ///
  /// Under [`ScopeStrategy::ExecutionScoped`] nothing publishes here; it is
  /// an independent delivery domain.
  pub fn global(&self) -> &Arc<NotificationBus> {
    &self.global
  }

  /// Open the scope for one execution.
  pub fn open_scope(&self) -> ExecutionScope {
    match self.strategy {
      ScopeStrategy::Global => ExecutionScope {
        bus: Arc::clone(&self.global),
        scoped: false,
      },
      ScopeStrategy::ExecutionScoped => ExecutionScope::isolated(),
    }
  }

  /// The bus for the calling task: the bound scope bus inside
  /// [`ExecutionScope::run`], the global bus otherwise.
  pub fn current(&self) -> Arc<NotificationBus> {
    current().unwrap_or_else(|| Arc::clone(&self.global))
  }
}

impl Default for NotificationContext {
  fn default() -> Self {
    Self::new(ScopeStrategy::default())
  }
}

/// The bus one execution publishes on.
pub struct ExecutionScope {
  bus: Arc<NotificationBus>,
  scoped: bool,
}

impl ExecutionScope {
  /// A scope with its own, initially empty bus.
  pub fn isolated() -> Self {
    Self {
      bus: Arc::new(NotificationBus::new()),
      scoped: true,
    }
  }

  pub fn bus(&self) -> &Arc<NotificationBus> {
    &self.bus
  }

  /// Whether this scope owns its bus (as opposed to sharing the global one).
  pub fn is_scoped(&self) -> bool {
    self.scoped
  }

  pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
    self.bus.add_listener(listener);
  }

  pub fn remove_listener(&self, id: &ListenerId) -> bool {
    self.bus.remove_listener(id)
  }

  /// Run `fut` with this scope bound.
  ///
  /// Scoped buses are bound as task-local storage for exactly the lifetime
  /// of `fut`. Shared scopes bind nothing.
  pub async fn run<F>(&self, fut: F) -> F::Output
  where
    F: Future,
  {
    if self.scoped {
      SCOPED_BUS.scope(Arc::clone(&self.bus), fut).await
    } else {
      fut.await
    }
  }
}
