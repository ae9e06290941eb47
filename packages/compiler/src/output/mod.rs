//! Output Module
//!
//! Output AST shared by both render backends, and its printer.

pub mod abstract_emitter;
pub mod output_ast;
