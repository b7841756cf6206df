//! The loaded, immutable form of a procedure document.
//!
//! A [`Procedure`] holds three declaration namespaces (inputs, outputs,
//! internals), the constants, and the method table. Declarations keep their
//! document order through [`IndexMap`], and their defaults are parsed once at
//! load time so every calculation can reset its context without re-parsing.
//!
//! Nothing here checks that the names used inside method bodies exist. Method
//! bodies may refer to literals and to undeclared working variables, so that
//! check happens when an operation runs.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::ops::Operation;
use crate::value::{DeclaredType, Value};

/// Name of the method every calculation starts from.
pub const ENTRY_POINT: &str = "MAIN";

/// A named scope of variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Inputs,
    Outputs,
    Internals,
    Constants,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Namespace::Inputs => "INPUTS",
            Namespace::Outputs => "OUTPUTS",
            Namespace::Internals => "INTERNALS",
            Namespace::Constants => "CONSTANTS",
        };
        f.write_str(name)
    }
}

/// A declared input, output or internal variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDeclaration {
    pub name: String,
    pub declared_type: DeclaredType,
    /// The default as authored, if any.
    pub default_literal: Option<String>,
    /// The default parsed with the declared type.
    pub default: Option<Value>,
}

impl VariableDeclaration {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType, default: Option<&str>) -> Self {
        VariableDeclaration {
            name: name.into(),
            declared_type,
            default_literal: default.map(str::to_string),
            default: default.map(|literal| declared_type.parse(literal)),
        }
    }
}

/// A loaded procedure. Immutable once built, and shared read-only between
/// calculations.
#[derive(Debug, Clone, Serialize)]
pub struct Procedure {
    pub name: String,
    pub version: String,
    inputs: IndexMap<String, VariableDeclaration>,
    outputs: IndexMap<String, VariableDeclaration>,
    internals: IndexMap<String, VariableDeclaration>,
    constants: IndexMap<String, Value>,
    methods: IndexMap<String, Vec<Operation>>,
}

impl Procedure {
    /// Creates an empty procedure. The loader fills it through the builder
    /// methods below, and so do tests.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Procedure {
            name: name.into(),
            version: version.into(),
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            internals: IndexMap::new(),
            constants: IndexMap::new(),
            methods: IndexMap::new(),
        }
    }

    /// Adds a variable declaration to the inputs, outputs or internals.
    ///
    /// Returns [`LoadError::DuplicateDeclaration`] if the namespace already
    /// declares the name. Declaring into [`Namespace::Constants`] goes through
    /// [`Procedure::add_constant`] instead, using the parsed default as value.
    pub fn declare(
        &mut self,
        namespace: Namespace,
        declaration: VariableDeclaration,
    ) -> Result<(), LoadError> {
        if namespace == Namespace::Constants {
            let value = declaration
                .default
                .unwrap_or_else(|| declaration.declared_type.parse(""));
            return self.add_constant(declaration.name, value);
        }
        let table = match namespace {
            Namespace::Inputs => &mut self.inputs,
            Namespace::Outputs => &mut self.outputs,
            _ => &mut self.internals,
        };
        if table.contains_key(&declaration.name) {
            return Err(LoadError::DuplicateDeclaration {
                namespace,
                name: declaration.name,
            });
        }
        table.insert(declaration.name.clone(), declaration);
        Ok(())
    }

    /// Adds a constant.
    pub fn add_constant(&mut self, name: impl Into<String>, value: Value) -> Result<(), LoadError> {
        let name = name.into();
        if self.constants.contains_key(&name) {
            return Err(LoadError::DuplicateDeclaration {
                namespace: Namespace::Constants,
                name,
            });
        }
        self.constants.insert(name, value);
        Ok(())
    }

    /// Adds a method body under `name`.
    pub fn add_method(
        &mut self,
        name: impl Into<String>,
        operations: Vec<Operation>,
    ) -> Result<(), LoadError> {
        let name = name.into();
        if self.methods.contains_key(&name) {
            return Err(LoadError::DuplicateMethod { name });
        }
        self.methods.insert(name, operations);
        Ok(())
    }

    /// Declarations of one namespace, in document order.
    ///
    /// Constants have no declarations; use [`Procedure::constants`].
    pub fn declarations(&self, namespace: Namespace) -> impl Iterator<Item = &VariableDeclaration> {
        let table = match namespace {
            Namespace::Inputs => Some(&self.inputs),
            Namespace::Outputs => Some(&self.outputs),
            Namespace::Internals => Some(&self.internals),
            Namespace::Constants => None,
        };
        table.into_iter().flat_map(|t| t.values())
    }

    /// Looks up a declaration within one namespace.
    pub fn declaration(&self, namespace: Namespace, name: &str) -> Option<&VariableDeclaration> {
        match namespace {
            Namespace::Inputs => self.inputs.get(name),
            Namespace::Outputs => self.outputs.get(name),
            Namespace::Internals => self.internals.get(name),
            Namespace::Constants => None,
        }
    }

    /// Finds the namespace that receives writes to `name`.
    ///
    /// The declaration lists are consulted in the order inputs, outputs,
    /// internals. This is deliberately not the read order of the execution
    /// context.
    pub fn declared_namespace(&self, name: &str) -> Option<(Namespace, &VariableDeclaration)> {
        [Namespace::Inputs, Namespace::Outputs, Namespace::Internals]
            .into_iter()
            .find_map(|ns| self.declaration(ns, name).map(|decl| (ns, decl)))
    }

    pub fn constants(&self) -> &IndexMap<String, Value> {
        &self.constants
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// The operation list of a method, if the procedure defines it.
    pub fn method(&self, name: &str) -> Option<&[Operation]> {
        self.methods.get(name).map(Vec::as_slice)
    }

    /// Method names with their bodies, in document order.
    pub fn methods(&self) -> impl Iterator<Item = (&str, &[Operation])> {
        self.methods
            .iter()
            .map(|(name, ops)| (name.as_str(), ops.as_slice()))
    }

    /// The body of `MAIN`.
    pub fn entry_point(&self) -> Option<&[Operation]> {
        self.method(ENTRY_POINT)
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;

    fn int_decl(name: &str, default: Option<&str>) -> VariableDeclaration {
        VariableDeclaration::new(name, DeclaredType::Integer, default)
    }

    #[test]
    fn defaults_parse_eagerly() {
        let decl = VariableDeclaration::new("ZKF", DeclaredType::Decimal, Some("BigDecimal.ZERO"));
        assert_eq!(decl.default_literal.as_deref(), Some("BigDecimal.ZERO"));
        assert_eq!(decl.default, Some(Value::Decimal(BigDecimal::from(0))));

        let bare = int_decl("LZZ", None);
        assert_eq!(bare.default, None);
    }

    #[test]
    fn duplicate_declarations_are_rejected_per_namespace() {
        let mut p = Procedure::new("test", "1");
        p.declare(Namespace::Inputs, int_decl("A", None)).unwrap();
        p.declare(Namespace::Internals, int_decl("A", None)).unwrap();

        let err = p.declare(Namespace::Inputs, int_decl("A", Some("1"))).unwrap_err();
        assert!(matches!(
            err,
            LoadError::DuplicateDeclaration { namespace: Namespace::Inputs, ref name } if name == "A"
        ));

        p.add_constant("C", Value::Integer(1)).unwrap();
        assert!(p.add_constant("C", Value::Integer(2)).is_err());
    }

    #[test]
    fn declaring_a_constant_uses_its_default() {
        let mut p = Procedure::new("test", "1");
        p.declare(Namespace::Constants, int_decl("ZAHL12", Some("12")))
            .unwrap();
        assert_eq!(p.constant("ZAHL12"), Some(&Value::Integer(12)));
        assert_eq!(p.declarations(Namespace::Constants).count(), 0);
    }

    #[test]
    fn write_namespace_prefers_inputs_then_outputs() {
        let mut p = Procedure::new("test", "1");
        p.declare(Namespace::Internals, int_decl("X", None)).unwrap();
        p.declare(Namespace::Outputs, int_decl("X", None)).unwrap();
        p.declare(Namespace::Internals, int_decl("Y", None)).unwrap();
        p.declare(Namespace::Inputs, int_decl("Y", None)).unwrap();

        assert_eq!(p.declared_namespace("X").map(|(ns, _)| ns), Some(Namespace::Outputs));
        assert_eq!(p.declared_namespace("Y").map(|(ns, _)| ns), Some(Namespace::Inputs));
        assert!(p.declared_namespace("Z").is_none());
    }

    #[test]
    fn methods_keep_document_order() {
        let mut p = Procedure::new("test", "1");
        p.add_method(ENTRY_POINT, vec![]).unwrap();
        p.add_method("MPARA", vec![Operation::BausteinFinish]).unwrap();
        assert!(matches!(
            p.add_method("MPARA", vec![]),
            Err(LoadError::DuplicateMethod { .. })
        ));

        let names: Vec<_> = p.methods().map(|(name, _)| name).collect();
        assert_eq!(names, ["MAIN", "MPARA"]);
        assert_eq!(p.method("MPARA").map(<[_]>::len), Some(1));
        assert!(p.entry_point().is_some());
    }
}
