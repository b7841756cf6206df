//! Runtime error types for the procedure interpreter.
//!
//! [`RuntimeError`] names what went wrong. [`ExecutionError`] adds where: the
//! method, operation index and operation kind of the innermost operation that
//! failed, so a bug in an authority document can be found without a debugger.
//! Every runtime error aborts the calculation; there are no partial results.

use std::fmt;

use serde::{Deserialize, Serialize};
use taxpap_core::OpKind;

/// Conditions that halt a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum RuntimeError {
    #[error("unresolved variable '{name}'")]
    UnresolvedVariable { name: String },

    #[error("unknown method '{name}'")]
    UnknownMethod { name: String },

    #[error("division by zero: '{dividend}' / '{divisor}'")]
    DivisionByZero { dividend: String, divisor: String },

    #[error("modulo by zero: '{dividend}' MOD '{divisor}'")]
    ModuloByZero { dividend: String, divisor: String },

    #[error("type mismatch: cannot apply '{op}' to '{left}' and '{right}'")]
    TypeMismatch {
        left: String,
        right: String,
        op: String,
    },

    #[error("integer overflow: '{left}' {op} '{right}' does not fit in 64 bits")]
    IntegerOverflow {
        left: String,
        right: String,
        op: String,
    },

    #[error("output '{name}' does not fit in 64 bits after scaling to minor units")]
    OutputOverflow { name: String },

    #[error("method call depth limit ({limit}) exceeded entering '{method}'")]
    MethodRecursionLimitExceeded { method: String, limit: usize },
}

/// Where in the procedure an error happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub method: String,
    /// Zero-based position of the operation within its method body.
    pub index: usize,
    pub operation: OpKind,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at operation #{} of method '{}'",
            self.operation, self.index, self.method
        )
    }
}

/// A [`RuntimeError`] together with the operation that raised it.
///
/// `location` is `None` only for errors raised after MAIN returned, while
/// scaling outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{}{cause}", location_prefix(.location))]
pub struct ExecutionError {
    pub location: Option<Location>,
    #[source]
    pub cause: RuntimeError,
}

fn location_prefix(location: &Option<Location>) -> String {
    location
        .as_ref()
        .map(|location| format!("{location}: "))
        .unwrap_or_default()
}

impl ExecutionError {
    pub fn at(location: Location, cause: RuntimeError) -> Self {
        ExecutionError {
            location: Some(location),
            cause,
        }
    }

    pub fn unlocated(cause: RuntimeError) -> Self {
        ExecutionError {
            location: None,
            cause,
        }
    }
}
