//! Tax procedure interpreter CLI.
//!
//! Provides the `taxpap` binary for running authority procedure documents
//! from the command line: `run` executes a procedure with explicit inputs,
//! `inspect` summarises a document, and `wage` runs a wage-tax procedure for
//! an income and tax class.
//!
//! Results go to stdout as JSON; diagnostics go to stderr. Set `RUST_LOG` to
//! see the interpreter's log output.

mod wage;

use std::path::{Path, PathBuf};
use std::process;

use bigdecimal::BigDecimal;
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use taxpap_core::{Namespace, Procedure, Value, VariableDeclaration};
use taxpap_interp::{Inputs, Interpreter, InterpreterConfig, TraceEntry};

use wage::{PaymentPeriod, TaxSummary, WageRequest};

/// Interpreter for tax calculation procedure documents.
#[derive(Parser)]
#[command(name = "taxpap", about = "Interpreter for tax calculation procedure documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run a procedure with the given inputs and print its outputs.
    Run {
        /// Path to the procedure XML document.
        file: PathBuf,

        /// Input value, repeatable.
        #[arg(short, long = "input", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        inputs: Vec<(String, String)>,

        /// Include the execution trace in the output.
        #[arg(long)]
        trace: bool,

        /// Maximum nesting of method calls.
        #[arg(long, env = "TAXPAP_MAX_CALL_DEPTH", default_value_t = 256)]
        max_call_depth: usize,
    },

    /// Print the declarations, constants and methods of a procedure.
    Inspect {
        /// Path to the procedure XML document.
        file: PathBuf,
    },

    /// Calculate wage tax for a gross income.
    Wage {
        /// Path to the wage-tax procedure XML document.
        file: PathBuf,

        /// Gross income for the period, in euros.
        #[arg(long)]
        income: BigDecimal,

        /// Tax class (1-6).
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
        class: u8,

        /// Payment period of the income.
        #[arg(long, value_enum, default_value_t = PaymentPeriod::Year)]
        period: PaymentPeriod,

        /// Maximum nesting of method calls.
        #[arg(long, env = "TAXPAP_MAX_CALL_DEPTH", default_value_t = 256)]
        max_call_depth: usize,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Run {
            file,
            inputs,
            trace,
            max_call_depth,
        } => run_procedure(&file, inputs, trace, max_call_depth),
        Commands::Inspect { file } => run_inspect(&file),
        Commands::Wage {
            file,
            income,
            class,
            period,
            max_call_depth,
        } => run_wage(
            &file,
            WageRequest {
                income,
                tax_class: class,
                period,
            },
            max_call_depth,
        ),
    };
    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Serialize)]
struct RunReport<'a> {
    outputs: &'a IndexMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<&'a [TraceEntry]>,
}

/// Execute the run subcommand.
///
/// Returns exit code: 0 = success, 1 = calculation error, 3 = load error.
fn run_procedure(
    file: &Path,
    assignments: Vec<(String, String)>,
    trace: bool,
    max_call_depth: usize,
) -> i32 {
    let procedure = match load(file) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let inputs: Inputs = assignments
        .into_iter()
        .map(|(name, raw)| {
            let value = Value::infer_literal(&raw).unwrap_or(Value::Text(raw));
            (name, value)
        })
        .collect();

    let config = InterpreterConfig {
        trace_enabled: trace,
        max_call_depth,
    };
    let mut interpreter = Interpreter::new(&procedure, config);
    match interpreter.calculate(&inputs) {
        Ok(outputs) => {
            print_json(&RunReport {
                outputs: &outputs,
                trace: interpreter.trace(),
            });
            0
        }
        Err(e) => {
            eprintln!("Calculation error: {}", e);
            1
        }
    }
}

#[derive(Serialize)]
struct ProcedureSummary<'a> {
    name: &'a str,
    version: &'a str,
    inputs: Vec<&'a VariableDeclaration>,
    outputs: Vec<&'a VariableDeclaration>,
    internals: Vec<&'a VariableDeclaration>,
    constants: &'a IndexMap<String, Value>,
    /// Operation count per method.
    methods: IndexMap<&'a str, usize>,
}

impl<'a> ProcedureSummary<'a> {
    fn of(procedure: &'a Procedure) -> Self {
        ProcedureSummary {
            name: &procedure.name,
            version: &procedure.version,
            inputs: procedure.declarations(Namespace::Inputs).collect(),
            outputs: procedure.declarations(Namespace::Outputs).collect(),
            internals: procedure.declarations(Namespace::Internals).collect(),
            constants: procedure.constants(),
            methods: procedure
                .methods()
                .map(|(name, body)| (name, body.len()))
                .collect(),
        }
    }
}

/// Execute the inspect subcommand. Returns 0 or 3.
fn run_inspect(file: &Path) -> i32 {
    match load(file) {
        Ok(procedure) => {
            print_json(&ProcedureSummary::of(&procedure));
            0
        }
        Err(code) => code,
    }
}

/// Execute the wage subcommand.
///
/// Returns exit code: 0 = success, 1 = calculation error, 2 = invalid
/// income, 3 = load error.
fn run_wage(file: &Path, request: WageRequest, max_call_depth: usize) -> i32 {
    let procedure = match load(file) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let inputs = match request.to_inputs(&procedure) {
        Ok(inputs) => inputs,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return 2;
        }
    };

    let config = InterpreterConfig {
        max_call_depth,
        ..InterpreterConfig::default()
    };
    match Interpreter::new(&procedure, config).calculate(&inputs) {
        Ok(outputs) => {
            print_json(&TaxSummary::from_outputs(&request.income, &outputs));
            0
        }
        Err(e) => {
            eprintln!("Calculation error: {}", e);
            1
        }
    }
}

/// Load a procedure, reporting failures on stderr as exit code 3.
fn load(file: &Path) -> Result<Procedure, i32> {
    taxpap_core::load_file(file).map_err(|e| {
        eprintln!("Error: failed to load '{}': {}", file.display(), e);
        3
    })
}

fn print_json<T: Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
}

/// Parse a `NAME=VALUE` input assignment.
fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("invalid input '{}', expected NAME=VALUE", s)),
    }
}
