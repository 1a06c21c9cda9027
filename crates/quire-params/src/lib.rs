//! Quire Params
//!
//! This crate contains the serializable parameter types for quire. A
//! [`TaskParameters`] value describes one requested document operation: which
//! operation to run, the input sources, the output destination and a handful
//! of behavior flags.
//!
//! Parameters can be loaded from:
//! - JSON files (via CLI with `quire run params.json`)
//! - Code, using the builder methods on [`TaskParameters`]
//!
//! The execution service never mutates parameters. It resolves them to a task
//! through the operation kind tag ([`OperationKind`]) and hands them to the
//! task by reference for the duration of one execution.

mod operation;
mod output;
mod page;
mod parameters;
mod source;

pub use operation::{ImageFormat, Operation, OperationKind, Rotation};
pub use output::{OutputTarget, StreamSink};
pub use page::PageRange;
pub use parameters::{FormatVersion, TaskParameters};
pub use source::{Source, SourceLocation};
