//! Per-calculation variable storage.

use indexmap::IndexMap;
use taxpap_core::{DeclaredType, Namespace, Procedure, Value};

use super::error::RuntimeError;

/// The mutable state of one calculation.
///
/// Holds the three writable namespaces. Constants are read straight from the
/// shared [`Procedure`]. A context is created per call and dropped afterwards,
/// so nothing carries over between calculations.
#[derive(Debug)]
pub struct ExecutionContext<'p> {
    procedure: &'p Procedure,
    inputs: IndexMap<String, Value>,
    outputs: IndexMap<String, Value>,
    internals: IndexMap<String, Value>,
}

impl<'p> ExecutionContext<'p> {
    /// Creates a context with every declared default in place.
    pub fn new(procedure: &'p Procedure) -> Self {
        let defaults = |ns| {
            procedure
                .declarations(ns)
                .filter_map(|decl| Some((decl.name.clone(), decl.default.clone()?)))
                .collect::<IndexMap<_, _>>()
        };
        ExecutionContext {
            procedure,
            inputs: defaults(Namespace::Inputs),
            outputs: defaults(Namespace::Outputs),
            internals: defaults(Namespace::Internals),
        }
    }

    /// Stores a caller-supplied input, coerced to its declared type.
    ///
    /// Text supplied for a declared non-text input is parsed the way the
    /// document's own literals are, so `"50000"` for an `int` input is 50000.
    pub fn seed_input(&mut self, name: &str, value: Value) {
        let value = match self.procedure.declaration(Namespace::Inputs, name) {
            Some(decl) => match value {
                Value::Text(text) if decl.declared_type != DeclaredType::Text => {
                    decl.declared_type.parse(&text)
                }
                other => other.coerce_to(decl.declared_type),
            },
            None => {
                tracing::warn!(input = name, "input is not declared by the procedure");
                value
            }
        };
        self.inputs.insert(name.to_string(), value);
    }

    /// Reads a variable reference.
    ///
    /// Lookup order is inputs, internals, constants, outputs. A name found in
    /// none of them is read as a literal.
    pub fn resolve(&self, name: &str) -> Result<Value, RuntimeError> {
        self.inputs
            .get(name)
            .or_else(|| self.internals.get(name))
            .or_else(|| self.procedure.constant(name))
            .or_else(|| self.outputs.get(name))
            .cloned()
            .or_else(|| Value::infer_literal(name))
            .ok_or_else(|| RuntimeError::UnresolvedVariable {
                name: name.to_string(),
            })
    }

    /// Writes `value` to `name` and returns the namespace that received it.
    pub fn assign(&mut self, name: &str, value: Value) -> Namespace {
        let (namespace, value) = match self.procedure.declared_namespace(name) {
            Some((ns, decl)) => (ns, value.coerce_to(decl.declared_type)),
            None => (Namespace::Internals, value),
        };
        let table = match namespace {
            Namespace::Inputs => &mut self.inputs,
            Namespace::Outputs => &mut self.outputs,
            _ => &mut self.internals,
        };
        table.insert(name.to_string(), value);
        namespace
    }

    /// Reads one namespace directly, without fallback.
    pub fn get(&self, namespace: Namespace, name: &str) -> Option<&Value> {
        match namespace {
            Namespace::Inputs => self.inputs.get(name),
            Namespace::Outputs => self.outputs.get(name),
            Namespace::Internals => self.internals.get(name),
            Namespace::Constants => self.procedure.constant(name),
        }
    }

    /// Consumes the context, returning the outputs in declaration order.
    ///
    /// Outputs that were never assigned and have no default are left out.
    pub fn into_outputs(mut self) -> IndexMap<String, Value> {
        let mut ordered = IndexMap::with_capacity(self.outputs.len());
        for decl in self.procedure.declarations(Namespace::Outputs) {
            if let Some(value) = self.outputs.swap_remove(&decl.name) {
                ordered.insert(decl.name.clone(), value);
            }
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use taxpap_core::{DeclaredType, VariableDeclaration};

    use super::*;

    fn procedure() -> Procedure {
        let mut p = Procedure::new("ctx", "1");
        let decl = |name: &str, ty, default: Option<&str>| VariableDeclaration::new(name, ty, default);
        p.declare(Namespace::Inputs, decl("X", DeclaredType::Integer, Some("0"))).unwrap();
        p.declare(Namespace::Inputs, decl("SHARED", DeclaredType::Integer, Some("1"))).unwrap();
        p.declare(Namespace::Internals, decl("SHARED", DeclaredType::Integer, Some("2"))).unwrap();
        p.declare(Namespace::Internals, decl("TMP", DeclaredType::Decimal, None)).unwrap();
        p.declare(Namespace::Outputs, decl("B", DeclaredType::Decimal, None)).unwrap();
        p.declare(Namespace::Outputs, decl("A", DeclaredType::Decimal, Some("BigDecimal.ZERO"))).unwrap();
        p.add_constant("ZAHL100", Value::Decimal(BigDecimal::from(100))).unwrap();
        p
    }

    #[test]
    fn defaults_are_seeded_and_bare_declarations_stay_absent() {
        let p = procedure();
        let ctx = ExecutionContext::new(&p);
        assert_eq!(ctx.get(Namespace::Inputs, "X"), Some(&Value::Integer(0)));
        assert_eq!(ctx.get(Namespace::Internals, "TMP"), None);
        assert_eq!(ctx.get(Namespace::Outputs, "B"), None);
        assert_eq!(ctx.get(Namespace::Constants, "ZAHL100"), Some(&Value::Decimal(BigDecimal::from(100))));
    }

    #[test]
    fn inputs_shadow_internals() {
        let p = procedure();
        let mut ctx = ExecutionContext::new(&p);
        assert_eq!(ctx.resolve("SHARED"), Ok(Value::Integer(1)));
        // Writes go to the input as well, so the shadow never diverges.
        assert_eq!(ctx.assign("SHARED", Value::Integer(9)), Namespace::Inputs);
        assert_eq!(ctx.resolve("SHARED"), Ok(Value::Integer(9)));
        assert_eq!(ctx.get(Namespace::Internals, "SHARED"), Some(&Value::Integer(2)));
    }

    #[test]
    fn literals_resolve_when_no_variable_matches() {
        let p = procedure();
        let ctx = ExecutionContext::new(&p);
        assert_eq!(ctx.resolve("42"), Ok(Value::Integer(42)));
        assert_eq!(ctx.resolve("0.5"), Ok(Value::Decimal("0.5".parse().unwrap())));
        assert_eq!(ctx.resolve("true"), Ok(Value::Boolean(true)));
        assert_eq!(
            ctx.resolve("NOPE"),
            Err(RuntimeError::UnresolvedVariable { name: "NOPE".into() })
        );
    }

    #[test]
    fn assignment_coerces_and_routes_undeclared_names_to_internals() {
        let p = procedure();
        let mut ctx = ExecutionContext::new(&p);
        assert_eq!(ctx.assign("A", Value::Integer(5)), Namespace::Outputs);
        assert_eq!(ctx.get(Namespace::Outputs, "A"), Some(&Value::Decimal(BigDecimal::from(5))));
        assert_eq!(ctx.assign("SCRATCH", Value::Boolean(true)), Namespace::Internals);
        assert_eq!(ctx.resolve("SCRATCH"), Ok(Value::Boolean(true)));
    }

    #[test]
    fn seeded_inputs_are_coerced() {
        let p = procedure();
        let mut ctx = ExecutionContext::new(&p);
        ctx.seed_input("X", Value::Decimal("12.9".parse().unwrap()));
        assert_eq!(ctx.resolve("X"), Ok(Value::Integer(12)));
        ctx.seed_input("X", Value::Text(" 50000 ".into()));
        assert_eq!(ctx.resolve("X"), Ok(Value::Integer(50000)));
        ctx.seed_input("EXTRA", Value::Text("kept".into()));
        assert_eq!(ctx.resolve("EXTRA"), Ok(Value::Text("kept".into())));
    }

    #[test]
    fn outputs_come_back_in_declaration_order() {
        let p = procedure();
        let mut ctx = ExecutionContext::new(&p);
        ctx.assign("B", Value::Integer(1));
        let outputs = ctx.into_outputs();
        let names: Vec<_> = outputs.keys().map(String::as_str).collect();
        assert_eq!(names, ["B", "A"]);
    }
}
