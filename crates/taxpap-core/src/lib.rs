pub mod error;
pub mod loader;
pub mod ops;
pub mod procedure;
pub mod value;

// Re-export commonly used types
pub use error::LoadError;
pub use loader::{load_file, load_reader, load_str};
pub use ops::{CmpOp, EvalOp, OpKind, Operation};
pub use procedure::{Namespace, Procedure, VariableDeclaration, ENTRY_POINT};
pub use value::{DeclaredType, Value};
