#![deny(clippy::all)]

//! Twinrender Compiler
//!
//! Compiles a parsed component template into three artifacts: a client
//! render generator that builds DOM through `h(...)`, a server render
//! function that returns escaped markup as one string, and a mapping tree
//! that tells the reactive runtime how each data path is reflected in the
//! rendered output.

pub mod binding;
pub mod compiler;
pub mod config;
pub mod error;
pub mod expression;
pub mod mapping;
pub mod output;
pub mod path;
pub mod render;
pub mod runtime;
pub mod schema;
pub mod template;

pub use compiler::{compile_component, compile_components, CompiledComponent, ComponentSource};
pub use config::{CompilerConfig, ScriptLanguage};
pub use error::{CompileError, Result, RuntimeError, RuntimeResult};
pub use path::{Path, PathSegment};
