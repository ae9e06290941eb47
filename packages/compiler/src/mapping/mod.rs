//! Mapping Module
//!
//! The mapping tree: per-path callbacks shared by every instance of a
//! component.

pub mod callbacks;
pub mod compiler;
pub mod tree;

pub use compiler::{build_mapping_tree, CompiledMapping};
pub use tree::{MappingNode, NodeType};
