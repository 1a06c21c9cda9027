//! Quire Service
//!
//! Runs [`TaskParameters`](quire_params::TaskParameters) end to end:
//! resolve the task, bind a notification scope, validate, execute, flush the
//! staged outputs, and emit exactly one terminal event.
//!
//! [`ExecutionAdapter`] is the caller-facing entry point; it wires the default
//! logging listeners onto the service's notification buses.

pub mod adapter;
mod config;
mod error;
mod report;
mod service;
mod state;

pub use adapter::{ExecutionAdapter, FailureLoggingListener, LoggingProgressListener};
pub use config::{ExecutionMode, ServiceConfig};
pub use error::TaskError;
pub use report::ExecutionReport;
pub use service::TaskExecutionService;
pub use state::{ExecutionState, ExecutionTracker, InvalidTransition};
