//! Interpreter for loaded tax calculation procedures.

pub mod interpreter;

pub use interpreter::{
    calculate, ExecutionError, Inputs, Interpreter, InterpreterConfig, Location, Outputs,
    RuntimeError, TraceEntry,
};
