//! Execution trace recording.
//!
//! When [`InterpreterConfig::trace_enabled`](super::InterpreterConfig) is set,
//! the interpreter records a [`TraceEntry`] for every operation it executes.
//! Operations inside an untaken branch are not recorded.

use serde::Serialize;
use taxpap_core::Value;

/// One executed operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    /// Method whose body holds the operation.
    pub method: String,
    /// Position of the operation within that body.
    pub index: usize,
    /// The operation as it reads in the document, e.g. `EVAL Y = X * 2`.
    pub op_description: String,
    /// Value written by EVAL or COMPARE, or the condition of an IF.
    pub output: Option<Value>,
}
