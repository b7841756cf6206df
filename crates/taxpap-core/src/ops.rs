//! Operation vocabulary of procedure method bodies.
//!
//! A method body is a flat, ordered list of [`Operation`] markers. Conditional
//! structure is not nested in the document: an `IF` is followed by `THEN` and
//! `ELSE` markers and the block ends implicitly at the next structural marker.
//! The interpreter reconstructs the blocks at execution time.
//!
//! Operands are kept as the authored strings. Whether an operand names an
//! input, an internal, a constant, an output or is a literal number is only
//! decided when the operation runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Binary operators accepted by `EVAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalOp {
    /// `=`: plain assignment of the right operand.
    Assign,
    Add,
    Sub,
    Mul,
    /// `/`: exact decimal division.
    Div,
    /// `DIV`: quotient truncated toward zero.
    IntDiv,
    /// `MOD`: remainder of the truncated operands.
    Mod,
}

impl EvalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            EvalOp::Assign => "=",
            EvalOp::Add => "+",
            EvalOp::Sub => "-",
            EvalOp::Mul => "*",
            EvalOp::Div => "/",
            EvalOp::IntDiv => "DIV",
            EvalOp::Mod => "MOD",
        }
    }
}

impl FromStr for EvalOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(EvalOp::Assign),
            "+" => Ok(EvalOp::Add),
            "-" => Ok(EvalOp::Sub),
            "*" => Ok(EvalOp::Mul),
            "/" => Ok(EvalOp::Div),
            "DIV" => Ok(EvalOp::IntDiv),
            "MOD" => Ok(EvalOp::Mod),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EvalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Comparison operators accepted by `IF` and `COMPARE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "LT",
            CmpOp::Le => "LE",
            CmpOp::Gt => "GT",
            CmpOp::Ge => "GE",
            CmpOp::Eq => "EQ",
            CmpOp::Ne => "NE",
        }
    }

    /// Whether the operator is defined for two booleans.
    pub fn is_equality(self) -> bool {
        matches!(self, CmpOp::Eq | CmpOp::Ne)
    }
}

impl FromStr for CmpOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "LT" => Ok(CmpOp::Lt),
            "LE" => Ok(CmpOp::Le),
            "GT" => Ok(CmpOp::Gt),
            "GE" => Ok(CmpOp::Ge),
            "EQ" => Ok(CmpOp::Eq),
            "NE" => Ok(CmpOp::Ne),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One step of a method body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Runs another method against the shared context.
    Execute { method: String },
    /// `target = left op right`. `left` is absent for plain assignment.
    Eval {
        target: String,
        left: Option<String>,
        right: String,
        op: EvalOp,
    },
    /// Opens a conditional block on `left op right`.
    If {
        left: String,
        right: String,
        op: CmpOp,
    },
    /// Stores the Boolean result of `left op right` into `target`.
    Compare {
        target: String,
        left: String,
        right: String,
        op: CmpOp,
    },
    Then,
    Else,
    /// Building-block boundary. Closes the innermost open conditional block.
    BausteinFinish,
}

/// Operation kinds, used for diagnostics and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Execute,
    Eval,
    If,
    Compare,
    Then,
    Else,
    BausteinFinish,
}

impl OpKind {
    /// The element name used for this kind in procedure documents.
    pub fn element_name(self) -> &'static str {
        match self {
            OpKind::Execute => "EXECUTE",
            OpKind::Eval => "EVAL",
            OpKind::If => "IF",
            OpKind::Compare => "COMPARE",
            OpKind::Then => "THEN",
            OpKind::Else => "ELSE",
            OpKind::BausteinFinish => "BAUSTEINFINISH",
        }
    }

    pub fn from_element_name(name: &str) -> Option<OpKind> {
        match name {
            "EXECUTE" => Some(OpKind::Execute),
            "EVAL" => Some(OpKind::Eval),
            "IF" => Some(OpKind::If),
            "COMPARE" => Some(OpKind::Compare),
            "THEN" => Some(OpKind::Then),
            "ELSE" => Some(OpKind::Else),
            "BAUSTEINFINISH" => Some(OpKind::BausteinFinish),
            _ => None,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Execute { .. } => OpKind::Execute,
            Operation::Eval { .. } => OpKind::Eval,
            Operation::If { .. } => OpKind::If,
            Operation::Compare { .. } => OpKind::Compare,
            Operation::Then => OpKind::Then,
            Operation::Else => OpKind::Else,
            Operation::BausteinFinish => OpKind::BausteinFinish,
        }
    }

    /// Whether this marker shapes conditional blocks rather than doing work.
    ///
    /// Structural markers are interpreted even inside an untaken branch so the
    /// block structure stays in step with the document.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Operation::If { .. } | Operation::Then | Operation::Else | Operation::BausteinFinish
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Execute { method } => write!(f, "EXECUTE {method}"),
            Operation::Eval {
                target,
                left: None,
                right,
                ..
            } => write!(f, "EVAL {target} = {right}"),
            Operation::Eval {
                target,
                left: Some(left),
                right,
                op,
            } => write!(f, "EVAL {target} = {left} {op} {right}"),
            Operation::If { left, right, op } => write!(f, "IF {left} {op} {right}"),
            Operation::Compare {
                target,
                left,
                right,
                op,
            } => write!(f, "COMPARE {target} = {left} {op} {right}"),
            Operation::Then => f.write_str("THEN"),
            Operation::Else => f.write_str("ELSE"),
            Operation::BausteinFinish => f.write_str("BAUSTEINFINISH"),
        }
    }
}
