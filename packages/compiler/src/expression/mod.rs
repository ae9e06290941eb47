//! Expression Module
//!
//! Binding expressions and their data dependencies.

pub mod ast;
pub mod extractor;

pub use ast::{Expr, Statement};
pub use extractor::{extract_dependencies, extract_statement, Extraction, Local};
