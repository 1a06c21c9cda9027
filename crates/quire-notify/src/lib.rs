//! Quire Notify
//!
//! Event delivery for task executions. Executions publish [`Event`]s on a
//! [`NotificationBus`]; listeners registered on that bus receive them
//! synchronously, in registration order.
//!
//! # Scoping
//!
//! A [`NotificationContext`] owns the process-wide bus and decides, through its
//! [`ScopeStrategy`], which bus an execution publishes on:
//!
//! - [`ScopeStrategy::Global`]: every execution shares the context's bus.
//!   Suitable when executions run one after another.
//! - [`ScopeStrategy::ExecutionScoped`]: every execution gets a fresh bus,
//!   bound as task-local storage while the execution runs (see [`scope`]).
//!   Listeners registered on one execution's scope never observe events from
//!   another execution.
//!
//! ```ignore
//! let context = NotificationContext::new(ScopeStrategy::ExecutionScoped);
//! let scope = context.open_scope();
//! scope.add_listener(Arc::new(ChannelListener::new(ListenerId::new("ui"), tx)));
//! scope.run(async { /* execution publishes on scope.bus() */ }).await;
//! ```

mod bus;
mod error;
mod event;
mod listener;
pub mod scope;

pub use bus::{Delivery, NotificationBus};
pub use error::ListenerError;
pub use event::{Event, EventKind, FailureKind};
pub use listener::{ChannelListener, EventListener, FnListener, ListenerId, NoopListener};
pub use scope::{ExecutionScope, NotificationContext, ScopeStrategy};
