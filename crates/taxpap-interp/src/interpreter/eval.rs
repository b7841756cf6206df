//! Arithmetic and comparison semantics of `EVAL`, `IF` and `COMPARE`.
//!
//! Operands are promoted to [`BigDecimal`] before any arithmetic: booleans
//! count as 0 and 1, integers widen exactly, text is rejected. Results are
//! exact except for `/`, which carries `bigdecimal`'s default precision of
//! 100 significant digits. When both operands were integers the result is
//! truncated back to an integer.
//!
//! `DIV` and `MOD` are computed exactly on the decimal values and always yield
//! integers.

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};
use taxpap_core::value::truncate_to_i64;
use taxpap_core::{CmpOp, EvalOp, Value};

use super::error::RuntimeError;

/// Evaluates `lhs op rhs` for an `EVAL` operation.
///
/// `left` and `right` are the operand references as authored and only feed
/// error messages.
///
/// # Errors
///
/// - [`RuntimeError::TypeMismatch`] if an operand is Text
/// - [`RuntimeError::DivisionByZero`] for `/` or `DIV` by zero
/// - [`RuntimeError::ModuloByZero`] for `MOD` by a divisor that truncates to zero
/// - [`RuntimeError::IntegerOverflow`] if an integer result leaves the i64 range
pub fn eval_arith(
    op: EvalOp,
    lhs: &Value,
    rhs: &Value,
    left: &str,
    right: &str,
) -> Result<Value, RuntimeError> {
    if op == EvalOp::Assign {
        return Ok(rhs.clone());
    }

    let (a, b) = promote(lhs, rhs).ok_or_else(|| type_mismatch(op.symbol(), lhs, rhs, left, right))?;
    let integer_result = |value: BigDecimal| {
        truncate_to_i64(&value)
            .map(Value::Integer)
            .ok_or_else(|| RuntimeError::IntegerOverflow {
                left: left.to_string(),
                right: right.to_string(),
                op: op.symbol().to_string(),
            })
    };

    let result = match op {
        EvalOp::Assign => return Ok(rhs.clone()),
        EvalOp::Add => &a + &b,
        EvalOp::Sub => &a - &b,
        EvalOp::Mul => &a * &b,
        EvalOp::Div => {
            if b.is_zero() {
                return Err(division_by_zero(left, right));
            }
            &a / &b
        }
        EvalOp::IntDiv => {
            if b.is_zero() {
                return Err(division_by_zero(left, right));
            }
            return integer_result(&a / &b);
        }
        EvalOp::Mod => {
            let a = a.with_scale_round(0, RoundingMode::Down);
            let b = b.with_scale_round(0, RoundingMode::Down);
            if b.is_zero() {
                return Err(RuntimeError::ModuloByZero {
                    dividend: left.to_string(),
                    divisor: right.to_string(),
                });
            }
            let quotient = (&a / &b).with_scale_round(0, RoundingMode::Down);
            return integer_result(&a - &(&b * &quotient));
        }
    };

    match (lhs, rhs) {
        (Value::Integer(_), Value::Integer(_)) => integer_result(result),
        _ => Ok(Value::Decimal(result)),
    }
}

/// Evaluates the comparison of an `IF` or `COMPARE` operation.
///
/// Numeric operands (including booleans mixed with numbers) compare by value.
/// Two booleans support only `EQ` and `NE`.
pub fn eval_compare(
    op: CmpOp,
    lhs: &Value,
    rhs: &Value,
    left: &str,
    right: &str,
) -> Result<bool, RuntimeError> {
    if let (Value::Boolean(a), Value::Boolean(b)) = (lhs, rhs) {
        if !op.is_equality() {
            return Err(type_mismatch(op.symbol(), lhs, rhs, left, right));
        }
        return Ok((a == b) == (op == CmpOp::Eq));
    }

    let (a, b) = promote(lhs, rhs).ok_or_else(|| type_mismatch(op.symbol(), lhs, rhs, left, right))?;
    let ordering = a.cmp(&b);
    Ok(match op {
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::Le => ordering.is_le(),
        CmpOp::Gt => ordering.is_gt(),
        CmpOp::Ge => ordering.is_ge(),
        CmpOp::Eq => ordering.is_eq(),
        CmpOp::Ne => ordering.is_ne(),
    })
}

/// Scales a monetary amount to minor currency units (cents), rounding half
/// away from zero. Returns `None` if the result leaves the i64 range.
pub fn to_minor_units(amount: &BigDecimal) -> Option<i64> {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
}

fn promote(lhs: &Value, rhs: &Value) -> Option<(BigDecimal, BigDecimal)> {
    Some((lhs.as_decimal()?, rhs.as_decimal()?))
}

fn type_mismatch(op: &str, lhs: &Value, rhs: &Value, left: &str, right: &str) -> RuntimeError {
    RuntimeError::TypeMismatch {
        left: format!("{left} ({})", lhs.type_name()),
        right: format!("{right} ({})", rhs.type_name()),
        op: op.to_string(),
    }
}

fn division_by_zero(left: &str, right: &str) -> RuntimeError {
    RuntimeError::DivisionByZero {
        dividend: left.to_string(),
        divisor: right.to_string(),
    }
}
