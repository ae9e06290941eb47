//! Template Module
//!
//! The annotated template tree consumed by both backends.

pub mod ast;
pub mod dom;
pub mod html_tags;

pub use ast::{Element, NodeFlags, NodeId, NodeKind, Template, TemplateNode};
