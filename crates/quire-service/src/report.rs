use quire_params::OperationKind;
use serde::Serialize;

/// Outcome of a completed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
  pub execution_id: String,
  pub operation: OperationKind,
  /// Logical names of the flushed artifacts, in flush order.
  pub outputs: Vec<String>,
}
