//! Runtime values and the declared-type vocabulary of procedure documents.
//!
//! Authority documents declare every variable and constant with a Java-flavoured
//! type name (`int`, `BigDecimal`, `double`, `boolean`) and a literal string.
//! [`DeclaredType::parse`] turns such a pair into a [`Value`]. A malformed
//! number becomes zero rather than an error.

use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use serde::{Deserialize, Serialize};

/// The type a variable or constant is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclaredType {
    Integer,
    Decimal,
    Boolean,
    Text,
}

impl DeclaredType {
    /// Maps a document type name to a declared type.
    ///
    /// `int` is Integer, `BigDecimal` and `double` are Decimal, `boolean` is
    /// Boolean. Every other name is handled as Text.
    pub fn from_type_name(name: &str) -> DeclaredType {
        match name.trim() {
            "int" => DeclaredType::Integer,
            "BigDecimal" | "double" => DeclaredType::Decimal,
            "boolean" => DeclaredType::Boolean,
            _ => DeclaredType::Text,
        }
    }

    /// Parses a literal as authored in the document.
    pub fn parse(self, literal: &str) -> Value {
        match self {
            DeclaredType::Integer => {
                if literal.contains("default") {
                    return Value::Integer(0);
                }
                Value::Integer(literal.trim().parse().unwrap_or(0))
            }
            DeclaredType::Decimal => Value::Decimal(decimal_literal(literal)),
            DeclaredType::Boolean => Value::Boolean(literal.trim() == "true"),
            DeclaredType::Text => Value::Text(literal.to_string()),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeclaredType::Integer => "int",
            DeclaredType::Decimal => "BigDecimal",
            DeclaredType::Boolean => "boolean",
            DeclaredType::Text => "String",
        };
        f.write_str(name)
    }
}

/// Parses a Decimal literal, including the Java `BigDecimal` spellings that
/// authority documents use for defaults and constants.
fn decimal_literal(literal: &str) -> BigDecimal {
    let literal = literal.trim();
    if let Ok(value) = BigDecimal::from_str(literal) {
        return value;
    }
    match literal {
        "BigDecimal.ONE" => return BigDecimal::from(1),
        "BigDecimal.TEN" => return BigDecimal::from(10),
        _ => {}
    }
    let argument = literal
        .strip_prefix("new BigDecimal(")
        .or_else(|| literal.strip_prefix("BigDecimal.valueOf("))
        .and_then(|rest| rest.strip_suffix(')'));
    if let Some(argument) = argument {
        let argument = argument.trim().trim_matches('"');
        if let Ok(value) = BigDecimal::from_str(argument) {
            return value;
        }
    }
    // `BigDecimal.ZERO` and every other unrecognised form fold to zero.
    BigDecimal::from(0)
}

/// A value held by a variable, a constant, or produced by an operation.
///
/// Serializes untagged, so integers and booleans appear as plain JSON numbers
/// and booleans, and decimals as their exact string form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Decimal(BigDecimal),
    Boolean(bool),
    Text(String),
}

impl Value {
    /// Interprets a bare operand reference as a literal.
    ///
    /// Tries Integer, then Decimal (only when the text contains a decimal
    /// point), then Boolean. Returns `None` for anything else.
    pub fn infer_literal(text: &str) -> Option<Value> {
        if let Ok(v) = text.parse::<i64>() {
            return Some(Value::Integer(v));
        }
        if text.contains('.') {
            if let Ok(v) = BigDecimal::from_str(text) {
                return Some(Value::Decimal(v));
            }
        }
        match text {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        }
    }

    /// Promotes a numeric value to a decimal for arithmetic and comparison.
    ///
    /// Booleans count as 0 and 1. Text never promotes.
    pub fn as_decimal(&self) -> Option<BigDecimal> {
        match self {
            Value::Integer(v) => Some(BigDecimal::from(*v)),
            Value::Decimal(v) => Some(v.clone()),
            Value::Boolean(b) => Some(BigDecimal::from(i64::from(*b))),
            Value::Text(_) => None,
        }
    }

    /// Converts a value for storage in a variable of the given declared type.
    ///
    /// Integer and Boolean widen into Decimal. Decimal narrows into Integer by
    /// truncating toward zero, and stays Decimal if the truncated value does
    /// not fit. Boolean becomes 0 or 1 in an Integer. Every other combination
    /// is stored unchanged.
    pub fn coerce_to(self, declared: DeclaredType) -> Value {
        match (declared, self) {
            (DeclaredType::Decimal, Value::Integer(v)) => Value::Decimal(BigDecimal::from(v)),
            (DeclaredType::Decimal, Value::Boolean(b)) => {
                Value::Decimal(BigDecimal::from(i64::from(b)))
            }
            (DeclaredType::Integer, Value::Decimal(d)) => match truncate_to_i64(&d) {
                Some(v) => Value::Integer(v),
                None => Value::Decimal(d),
            },
            (DeclaredType::Integer, Value::Boolean(b)) => Value::Integer(i64::from(b)),
            (_, value) => value,
        }
    }

    /// Returns a human-readable name of the value's variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Decimal(_) => "Decimal",
            Value::Boolean(_) => "Boolean",
            Value::Text(_) => "Text",
        }
    }
}

/// Truncates a decimal toward zero, returning `None` if it leaves the i64 range.
pub fn truncate_to_i64(value: &BigDecimal) -> Option<i64> {
    value.with_scale_round(0, RoundingMode::Down).to_i64()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Value::Decimal(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    // -----------------------------------------------------------------------
    // Declared type names
    // -----------------------------------------------------------------------

    #[test]
    fn type_names_map_to_declared_types() {
        assert_eq!(DeclaredType::from_type_name("int"), DeclaredType::Integer);
        assert_eq!(DeclaredType::from_type_name("BigDecimal"), DeclaredType::Decimal);
        assert_eq!(DeclaredType::from_type_name("double"), DeclaredType::Decimal);
        assert_eq!(DeclaredType::from_type_name("boolean"), DeclaredType::Boolean);
        assert_eq!(DeclaredType::from_type_name("String"), DeclaredType::Text);
        assert_eq!(DeclaredType::from_type_name("long[]"), DeclaredType::Text);
    }

    // -----------------------------------------------------------------------
    // Literal parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parse_literals_by_declared_type() {
        let cases = [
            (DeclaredType::Integer, "123", Value::Integer(123)),
            (DeclaredType::Integer, "-7", Value::Integer(-7)),
            (DeclaredType::Integer, "invalid", Value::Integer(0)),
            (DeclaredType::Integer, "default", Value::Integer(0)),
            (DeclaredType::Decimal, "123.45", Value::Decimal(dec("123.45"))),
            (DeclaredType::Decimal, "invalid", Value::Decimal(dec("0"))),
            (DeclaredType::Boolean, "true", Value::Boolean(true)),
            (DeclaredType::Boolean, "false", Value::Boolean(false)),
            (DeclaredType::Boolean, "yes", Value::Boolean(false)),
            (DeclaredType::Text, "test", Value::Text("test".into())),
        ];
        for (ty, literal, expected) in cases {
            assert_eq!(ty.parse(literal), expected, "parsing {literal:?} as {ty}");
        }
    }

    #[test]
    fn decimal_java_spellings() {
        let d = DeclaredType::Decimal;
        assert_eq!(d.parse("BigDecimal.ZERO"), Value::Decimal(dec("0")));
        assert_eq!(d.parse("BigDecimal.ONE"), Value::Decimal(dec("1")));
        assert_eq!(d.parse("BigDecimal.TEN"), Value::Decimal(dec("10")));
        assert_eq!(d.parse("new BigDecimal(12)"), Value::Decimal(dec("12")));
        assert_eq!(d.parse("BigDecimal.valueOf(0.5)"), Value::Decimal(dec("0.5")));
        assert_eq!(d.parse("new BigDecimal(\"1.25\")"), Value::Decimal(dec("1.25")));
        assert_eq!(d.parse("new BigDecimal[12]"), Value::Decimal(dec("0")));
    }

    #[test]
    fn infer_literal_order() {
        assert_eq!(Value::infer_literal("42"), Some(Value::Integer(42)));
        assert_eq!(Value::infer_literal("0.25"), Some(Value::Decimal(dec("0.25"))));
        assert_eq!(Value::infer_literal("true"), Some(Value::Boolean(true)));
        assert_eq!(Value::infer_literal("1e5"), None);
        assert_eq!(Value::infer_literal("ZRE4J"), None);
    }

    // -----------------------------------------------------------------------
    // Promotion and coercion
    // -----------------------------------------------------------------------

    #[test]
    fn numeric_promotion() {
        assert_eq!(Value::Integer(3).as_decimal(), Some(dec("3")));
        assert_eq!(Value::Boolean(true).as_decimal(), Some(dec("1")));
        assert_eq!(Value::Boolean(false).as_decimal(), Some(dec("0")));
        assert_eq!(Value::Text("3".into()).as_decimal(), None);
    }

    #[test]
    fn coercion_into_declared_types() {
        assert_eq!(
            Value::Integer(5).coerce_to(DeclaredType::Decimal),
            Value::Decimal(dec("5"))
        );
        assert_eq!(
            Value::Decimal(dec("-2.9")).coerce_to(DeclaredType::Integer),
            Value::Integer(-2)
        );
        assert_eq!(
            Value::Boolean(true).coerce_to(DeclaredType::Integer),
            Value::Integer(1)
        );
        assert_eq!(
            Value::Integer(1).coerce_to(DeclaredType::Boolean),
            Value::Integer(1)
        );
        let huge = dec("1e30");
        assert_eq!(
            Value::Decimal(huge.clone()).coerce_to(DeclaredType::Integer),
            Value::Decimal(huge)
        );
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Integer(12),
            Value::Boolean(true),
            Value::Text("x".into()),
        ])
        .unwrap();
        assert_eq!(json, r#"[12,true,"x"]"#);
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    proptest::proptest! {
        #[test]
        fn integer_literals_infer_as_integers(v in proptest::prelude::any::<i64>()) {
            proptest::prop_assert_eq!(Value::infer_literal(&v.to_string()), Some(Value::Integer(v)));
            proptest::prop_assert_eq!(DeclaredType::Integer.parse(&v.to_string()), Value::Integer(v));
        }

        #[test]
        fn decimal_truncation_stays_within_one(units in -1_000_000i64..1_000_000, cents in 0u8..100) {
            let d = dec(&format!("{units}.{cents:02}"));
            let t = truncate_to_i64(&d).unwrap();
            proptest::prop_assert_eq!(t, units);
        }
    }
}
