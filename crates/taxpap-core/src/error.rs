//! Load-time error types for taxpap-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering every
//! way an authority document can fail to become a [`Procedure`](crate::Procedure).
//! A procedure is only usable once it has been loaded without error.

use std::path::PathBuf;

use thiserror::Error;

use crate::procedure::Namespace;

/// Errors produced while loading a procedure document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The document is not well-formed XML.
    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// The document file could not be read.
    #[error("failed to read procedure document '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document stream could not be read.
    #[error("failed to read procedure document: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    /// The root element is not `PAP`.
    #[error("unexpected root element '{element}', expected 'PAP'")]
    UnexpectedRoot { element: String },

    /// No `MAIN` method was found under `METHODS`.
    #[error("procedure has no MAIN method")]
    MissingEntryPoint,

    /// A required attribute is absent on an element.
    #[error("element '{element}' is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// A method body contains an element outside the operation vocabulary.
    #[error("unknown operation '{element}' in method '{method}'")]
    UnknownOperation { method: String, element: String },

    /// An `op` attribute does not name a supported operator.
    #[error("unknown operator '{op}' on element '{element}'")]
    UnknownOperator { element: String, op: String },

    /// The same name is declared twice in one namespace.
    #[error("duplicate declaration of '{name}' in {namespace}")]
    DuplicateDeclaration { namespace: Namespace, name: String },

    /// Two methods share a name (or MAIN appears twice).
    #[error("duplicate method '{name}'")]
    DuplicateMethod { name: String },
}
