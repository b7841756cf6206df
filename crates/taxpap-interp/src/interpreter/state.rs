//! The execution driver.
//!
//! [`Interpreter`] walks method bodies in order against one
//! [`ExecutionContext`]. `EXECUTE` recurses into the called method with the
//! same context; conditional blocks are tracked per body by a
//! [`BlockTracker`]. The first error aborts the calculation and carries the
//! location of the operation that raised it.

use indexmap::IndexMap;
use taxpap_core::{Operation, Procedure, Value, ENTRY_POINT};

use super::blocks::BlockTracker;
use super::context::ExecutionContext;
use super::error::{ExecutionError, Location, RuntimeError};
use super::eval::{eval_arith, eval_compare, to_minor_units};
use super::trace::TraceEntry;

/// Caller-supplied inputs, by variable name.
pub type Inputs = IndexMap<String, Value>;

/// Calculated outputs in declaration order. Monetary outputs are integer
/// minor units.
pub type Outputs = IndexMap<String, Value>;

/// Configuration for the interpreter.
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Whether to record execution traces.
    pub trace_enabled: bool,
    /// Maximum nesting of method calls, counting MAIN. Default: 256.
    pub max_call_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            trace_enabled: false,
            max_call_depth: 256,
        }
    }
}

/// Runs calculations against one loaded [`Procedure`].
///
/// An interpreter can be reused for any number of calls; each call starts
/// from a fresh context. The procedure is only borrowed, so many interpreters
/// (one per thread, say) may share it.
pub struct Interpreter<'p> {
    procedure: &'p Procedure,
    config: InterpreterConfig,
    /// Trace of the most recent call (when enabled).
    trace: Option<Vec<TraceEntry>>,
}

impl<'p> Interpreter<'p> {
    pub fn new(procedure: &'p Procedure, config: InterpreterConfig) -> Self {
        let trace = config.trace_enabled.then(Vec::new);
        Interpreter {
            procedure,
            config,
            trace,
        }
    }

    /// Runs `MAIN` with the given inputs and returns the outputs.
    ///
    /// Inputs are coerced to their declared types. Names the procedure does
    /// not declare are still made available to the methods.
    pub fn calculate(&mut self, inputs: &Inputs) -> Result<Outputs, ExecutionError> {
        if let Some(trace) = self.trace.as_mut() {
            trace.clear();
        }

        let procedure = self.procedure;
        let mut context = ExecutionContext::new(procedure);
        for (name, value) in inputs {
            context.seed_input(name, value.clone());
        }

        tracing::debug!(
            procedure = %procedure.name,
            version = %procedure.version,
            inputs = inputs.len(),
            "starting calculation"
        );

        let main = procedure.entry_point().ok_or_else(|| {
            ExecutionError::unlocated(RuntimeError::UnknownMethod {
                name: ENTRY_POINT.to_string(),
            })
        })?;
        self.run_method(&mut context, ENTRY_POINT, main, 1)?;

        finalize(context.into_outputs())
    }

    /// The trace of the most recent call, if tracing is enabled.
    pub fn trace(&self) -> Option<&[TraceEntry]> {
        self.trace.as_deref()
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn procedure(&self) -> &'p Procedure {
        self.procedure
    }

    fn run_method(
        &mut self,
        context: &mut ExecutionContext<'p>,
        method: &str,
        body: &'p [Operation],
        depth: usize,
    ) -> Result<(), ExecutionError> {
        tracing::debug!(method, depth, operations = body.len(), "entering method");

        let procedure = self.procedure;
        let mut blocks = BlockTracker::new();

        for (index, operation) in body.iter().enumerate() {
            let locate = |cause| {
                ExecutionError::at(
                    Location {
                        method: method.to_string(),
                        index,
                        operation: operation.kind(),
                    },
                    cause,
                )
            };

            if !operation.is_structural() && !blocks.is_live() {
                tracing::trace!(method, index, "skipping operation in untaken branch");
                continue;
            }

            let output = match operation {
                Operation::Then => {
                    blocks.enter_then();
                    continue;
                }
                Operation::Else => {
                    blocks.enter_else();
                    continue;
                }
                Operation::BausteinFinish => {
                    blocks.close();
                    continue;
                }
                Operation::If { left, right, op } => {
                    if !blocks.is_live() {
                        blocks.open(false);
                        continue;
                    }
                    let lhs = context.resolve(left).map_err(locate)?;
                    let rhs = context.resolve(right).map_err(locate)?;
                    let condition = eval_compare(*op, &lhs, &rhs, left, right).map_err(locate)?;
                    blocks.open(condition);
                    Some(Value::Boolean(condition))
                }
                Operation::Compare {
                    target,
                    left,
                    right,
                    op,
                } => {
                    let lhs = context.resolve(left).map_err(locate)?;
                    let rhs = context.resolve(right).map_err(locate)?;
                    let result = eval_compare(*op, &lhs, &rhs, left, right).map_err(locate)?;
                    context.assign(target, Value::Boolean(result));
                    Some(Value::Boolean(result))
                }
                Operation::Eval {
                    target,
                    left,
                    right,
                    op,
                } => {
                    let value = match left {
                        Some(left) => {
                            let lhs = context.resolve(left).map_err(locate)?;
                            let rhs = context.resolve(right).map_err(locate)?;
                            eval_arith(*op, &lhs, &rhs, left, right).map_err(locate)?
                        }
                        None => context.resolve(right).map_err(locate)?,
                    };
                    let namespace = context.assign(target, value);
                    context.get(namespace, target).cloned()
                }
                Operation::Execute { method: callee } => {
                    if depth >= self.config.max_call_depth {
                        return Err(locate(RuntimeError::MethodRecursionLimitExceeded {
                            method: callee.clone(),
                            limit: self.config.max_call_depth,
                        }));
                    }
                    let callee_body = procedure.method(callee).ok_or_else(|| {
                        locate(RuntimeError::UnknownMethod {
                            name: callee.clone(),
                        })
                    })?;
                    self.record(method, index, operation, None);
                    self.run_method(context, callee, callee_body, depth + 1)?;
                    continue;
                }
            };

            self.record(method, index, operation, output);
        }

        if blocks.depth() > 0 {
            tracing::debug!(method, open = blocks.depth(), "discarding unclosed conditional blocks");
        }
        Ok(())
    }

    fn record(&mut self, method: &str, index: usize, operation: &Operation, output: Option<Value>) {
        if let Some(trace) = self.trace.as_mut() {
            trace.push(TraceEntry {
                method: method.to_string(),
                index,
                op_description: operation.to_string(),
                output,
            });
        }
    }
}

/// Scales every decimal output to integer minor units.
fn finalize(outputs: Outputs) -> Result<Outputs, ExecutionError> {
    outputs
        .into_iter()
        .map(|(name, value)| match value {
            Value::Decimal(amount) => match to_minor_units(&amount) {
                Some(units) => Ok((name, Value::Integer(units))),
                None => Err(ExecutionError::unlocated(RuntimeError::OutputOverflow { name })),
            },
            other => Ok((name, other)),
        })
        .collect()
}

/// Runs a calculation with the default configuration.
pub fn calculate(procedure: &Procedure, inputs: &Inputs) -> Result<Outputs, ExecutionError> {
    Interpreter::new(procedure, InterpreterConfig::default()).calculate(inputs)
}
