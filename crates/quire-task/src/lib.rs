//! Quire Task
//!
//! The unit of work behind every operation. A [`Task`] is created fresh for
//! each execution by the factory registered for the operation kind in a
//! [`TaskRegistry`], and is driven through three hooks:
//!
//! 1. `before_execute` checks the parameters against the actual sources
//!    (page bounds, credentials) and fails with a [`ValidationError`].
//! 2. `execute` does the work, staging artifacts and reporting progress
//!    through the [`TaskContext`]; it fails with an [`ExecutionError`].
//! 3. `after_execute` releases whatever the task holds.
//!
//! Page-level document manipulation is delegated to a [`DocumentBackend`].
//! [`PlainTextBackend`] is a minimal backend for form-feed paginated text.

mod document;
mod error;
mod registry;
mod task;
mod tasks;
mod text;

pub use document::{Document, DocumentBackend, DocumentError, SaveOptions};
pub use error::{ExecutionError, ResolutionError, ValidationError};
pub use registry::{TaskFactory, TaskLookup, TaskRegistry};
pub use task::{Task, TaskContext};
pub use tasks::{ImageConversionTask, MergeTask, RotateTask, SplitTask};
pub use text::PlainTextBackend;
