//! Error Types
//!
//! Every compile failure is a deterministic function of the compiler input, so
//! the pipeline stops at the first error and never returns partial output.

use thiserror::Error;

/// Result type alias for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

/// Fatal compile errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The extractor met an expression or statement shape it does not handle
    #[error("unsupported construct `{construct}` in {site}")]
    UnsupportedConstruct { site: String, construct: String },

    /// A node reference was requested for an element without an identifier
    #[error("cannot reference <{tag}>: no identifier has been assigned")]
    MissingIdentifier { tag: String },

    /// A path does not agree with the declared data schema or with another binding
    #[error("type mismatch at `{path}`: {reason}")]
    TypeMismatch { path: String, reason: String },

    /// A DOM path was requested for a node outside the assumed ancestor
    #[error("<{tag}> is not a descendant of an addressable element")]
    BrokenAncestry { tag: String },
}

/// Result type alias for runtime view operations
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

/// Errors raised by the reactive view runtime
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// A view can only wrap an object or an array
    #[error("cannot create a view over {found}")]
    NotAnObject { found: &'static str },

    /// Element writes are limited to the indices a JavaScript array accepts
    #[error("array index {index} is out of range")]
    InvalidArrayIndex { index: usize },

    /// Lengths are limited to what a JavaScript array accepts
    #[error("invalid array length {length}")]
    InvalidArrayLength { length: u64 },
}

impl RuntimeError {
    pub(crate) fn not_an_object(value: &serde_json::Value) -> Self {
        let found = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "a boolean",
            serde_json::Value::Number(_) => "a number",
            serde_json::Value::String(_) => "a string",
            serde_json::Value::Array(_) => "an array",
            serde_json::Value::Object(_) => "an object",
        };
        RuntimeError::NotAnObject { found }
    }
}
