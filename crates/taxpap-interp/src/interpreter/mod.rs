//! Procedure interpreter.
//!
//! Executes a loaded [`Procedure`](taxpap_core::Procedure) for one set of
//! inputs and returns its outputs, with monetary amounts in minor currency
//! units.
//!
//! # Architecture
//!
//! - [`Interpreter`] walks method bodies in document order, following
//!   `EXECUTE` into other methods and tracking conditional blocks.
//! - [`context::ExecutionContext`] holds the inputs, outputs and internals of
//!   one call and resolves operand references.
//! - [`blocks::BlockTracker`] rebuilds nested `IF`/`THEN`/`ELSE` blocks from
//!   the flat markers of a method body.
//! - [`eval`] implements the arithmetic and comparison operators.
//! - [`RuntimeError`] names what failed; [`ExecutionError`] adds where.
//! - [`TraceEntry`] records each executed operation when tracing is enabled.
//!
//! # Usage
//!
//! ```ignore
//! let procedure = taxpap_core::load_file("Lohnsteuer2024.xml")?;
//! let mut inputs = Inputs::new();
//! inputs.insert("RE4".into(), Value::Integer(5_000_000));
//! let outputs = calculate(&procedure, &inputs)?;
//! ```

pub mod blocks;
pub mod context;
pub mod error;
pub mod eval;
pub mod state;
pub mod trace;

pub use error::{ExecutionError, Location, RuntimeError};
pub use state::{calculate, Inputs, Interpreter, InterpreterConfig, Outputs};
pub use trace::TraceEntry;
