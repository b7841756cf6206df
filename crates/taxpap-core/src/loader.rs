//! Loads authority XML documents into a [`Procedure`].
//!
//! Loading happens in two passes. The document is first read into a small
//! element tree with `quick-xml`, keeping only element names, attributes and
//! children. The tree is then walked section by section (`VARIABLES`,
//! `CONSTANTS`, `METHODS`) and fed into the [`Procedure`] builder.
//!
//! Structural problems (malformed XML, a missing `MAIN`, a missing required
//! attribute, an element outside the operation vocabulary, an unknown
//! operator) abort the load. References inside method bodies are not checked.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::LoadError;
use crate::ops::{CmpOp, EvalOp, OpKind, Operation};
use crate::procedure::{Namespace, Procedure, VariableDeclaration, ENTRY_POINT};
use crate::value::DeclaredType;

/// Loads a procedure from an XML string.
pub fn load_str(xml: &str) -> Result<Procedure, LoadError> {
    let root = parse_tree(xml)?;
    let procedure = build_procedure(&root)?;
    tracing::debug!(
        name = %procedure.name,
        version = %procedure.version,
        inputs = procedure.declarations(Namespace::Inputs).count(),
        outputs = procedure.declarations(Namespace::Outputs).count(),
        internals = procedure.declarations(Namespace::Internals).count(),
        constants = procedure.constants().len(),
        methods = procedure.methods().count(),
        "loaded procedure"
    );
    Ok(procedure)
}

/// Loads a procedure from any byte stream holding UTF-8 XML.
pub fn load_reader<R: Read>(mut reader: R) -> Result<Procedure, LoadError> {
    let mut xml = String::new();
    reader
        .read_to_string(&mut xml)
        .map_err(|source| LoadError::Read { source })?;
    load_str(&xml)
}

/// Loads a procedure from an XML file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Procedure, LoadError> {
    let path = path.as_ref();
    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    load_reader(BufReader::new(file)).map_err(|e| match e {
        LoadError::Read { source } => io_error(source),
        other => other,
    })
}

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

/// An XML element reduced to what the procedure format uses.
#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    /// Returns a non-empty attribute value.
    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<&str, LoadError> {
        self.attr(key).ok_or_else(|| LoadError::MissingAttribute {
            element: self.name.clone(),
            attribute: key.to_string(),
        })
    }
}

fn xml_error(position: u64, message: impl fmt::Display) -> LoadError {
    LoadError::Xml {
        position,
        message: message.to_string(),
    }
}

fn parse_tree(xml: &str) -> Result<Element, LoadError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position() as u64;
        match reader.read_event() {
            Ok(Event::Start(start)) => open.push(element_from(&start, position)?),
            Ok(Event::Empty(start)) => {
                let element = element_from(&start, position)?;
                attach(&mut open, &mut root, element, position)?;
            }
            Ok(Event::End(_)) => {
                let element = open
                    .pop()
                    .ok_or_else(|| xml_error(position, "closing tag without an open element"))?;
                attach(&mut open, &mut root, element, position)?;
            }
            Ok(Event::Eof) => break,
            // Text, comments, CDATA, declarations and processing instructions
            // carry nothing the procedure format uses.
            Ok(_) => {}
            Err(e) => return Err(xml_error(reader.buffer_position() as u64, e)),
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(xml_error(
            reader.buffer_position() as u64,
            format!("document ends inside '{}'", unclosed.name),
        ));
    }
    root.ok_or_else(|| xml_error(0, "document has no root element"))
}

fn element_from(start: &BytesStart<'_>, position: u64) -> Result<Element, LoadError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(position, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| xml_error(position, e))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: u64,
) -> Result<(), LoadError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(xml_error(position, "more than one root element")),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Procedure construction
// ---------------------------------------------------------------------------

fn build_procedure(root: &Element) -> Result<Procedure, LoadError> {
    if root.name != "PAP" {
        return Err(LoadError::UnexpectedRoot {
            element: root.name.clone(),
        });
    }
    let mut procedure = Procedure::new(
        root.attr("name").unwrap_or_default(),
        root.attr("version").unwrap_or_default(),
    );

    for section in &root.children {
        match section.name.as_str() {
            "VARIABLES" => load_variables(&mut procedure, section)?,
            "CONSTANTS" => load_constants(&mut procedure, section)?,
            "METHODS" => load_methods(&mut procedure, section)?,
            other => tracing::debug!(element = other, "ignoring unknown procedure section"),
        }
    }

    if procedure.entry_point().is_none() {
        return Err(LoadError::MissingEntryPoint);
    }
    Ok(procedure)
}

fn load_variables(procedure: &mut Procedure, section: &Element) -> Result<(), LoadError> {
    for group in &section.children {
        let (namespace, item) = match group.name.as_str() {
            "INPUTS" => (Namespace::Inputs, "INPUT"),
            // Authorities split outputs over several OUTPUTS sections.
            "OUTPUTS" => (Namespace::Outputs, "OUTPUT"),
            "INTERNALS" => (Namespace::Internals, "INTERNAL"),
            other => {
                tracing::debug!(element = other, "ignoring unknown variable group");
                continue;
            }
        };
        for element in group.children.iter().filter(|e| e.name == item) {
            let declaration = VariableDeclaration::new(
                element.required("name")?,
                DeclaredType::from_type_name(element.required("type")?),
                element.attr("default"),
            );
            procedure.declare(namespace, declaration)?;
        }
    }
    Ok(())
}

fn load_constants(procedure: &mut Procedure, section: &Element) -> Result<(), LoadError> {
    for element in section.children.iter().filter(|e| e.name == "CONSTANT") {
        let declared = DeclaredType::from_type_name(element.required("type")?);
        let value = declared.parse(element.required("value")?);
        procedure.add_constant(element.required("name")?, value)?;
    }
    Ok(())
}

fn load_methods(procedure: &mut Procedure, section: &Element) -> Result<(), LoadError> {
    for element in &section.children {
        let name = match element.name.as_str() {
            "MAIN" => ENTRY_POINT,
            "METHOD" => element.required("name")?,
            other => {
                tracing::debug!(element = other, "ignoring unknown element under METHODS");
                continue;
            }
        };
        let mut operations = Vec::new();
        collect_operations(name, element, &mut operations)?;
        procedure.add_method(name, operations)?;
    }
    Ok(())
}

/// Flattens a method body into its marker sequence.
///
/// `THEN` and `ELSE` written as containers contribute their marker followed by
/// their children. An `IF` written as a container is flattened the same way
/// and closed with a `BAUSTEINFINISH`.
fn collect_operations(
    method: &str,
    element: &Element,
    out: &mut Vec<Operation>,
) -> Result<(), LoadError> {
    for child in &element.children {
        let kind = OpKind::from_element_name(&child.name).ok_or_else(|| {
            LoadError::UnknownOperation {
                method: method.to_string(),
                element: child.name.clone(),
            }
        })?;
        out.push(build_operation(kind, child)?);
        match kind {
            OpKind::Then | OpKind::Else => collect_operations(method, child, out)?,
            OpKind::If if !child.children.is_empty() => {
                collect_operations(method, child, out)?;
                out.push(Operation::BausteinFinish);
            }
            _ if !child.children.is_empty() => {
                tracing::debug!(method, element = %child.name, "ignoring children of leaf operation");
            }
            _ => {}
        }
    }
    Ok(())
}

fn build_operation(kind: OpKind, element: &Element) -> Result<Operation, LoadError> {
    let operation = match kind {
        OpKind::Execute => Operation::Execute {
            method: element.required("method")?.to_string(),
        },
        OpKind::Eval => {
            let op = parse_op::<EvalOp>(element)?;
            let left = match op {
                EvalOp::Assign => None,
                _ => Some(element.required("left")?.to_string()),
            };
            Operation::Eval {
                target: element.required("target")?.to_string(),
                left,
                right: element.required("right")?.to_string(),
                op,
            }
        }
        OpKind::If => Operation::If {
            left: element.required("left")?.to_string(),
            right: element.required("right")?.to_string(),
            op: parse_op::<CmpOp>(element)?,
        },
        OpKind::Compare => Operation::Compare {
            target: element.required("target")?.to_string(),
            left: element.required("left")?.to_string(),
            right: element.required("right")?.to_string(),
            op: parse_op::<CmpOp>(element)?,
        },
        OpKind::Then => Operation::Then,
        OpKind::Else => Operation::Else,
        OpKind::BausteinFinish => Operation::BausteinFinish,
    };
    Ok(operation)
}

fn parse_op<T: std::str::FromStr>(element: &Element) -> Result<T, LoadError> {
    let symbol = element.required("op")?;
    symbol.parse().map_err(|_| LoadError::UnknownOperator {
        element: element.name.clone(),
        op: symbol.to_string(),
    })
}
