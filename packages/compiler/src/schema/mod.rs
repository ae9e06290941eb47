//! Schema Module
//!
//! Declared data types for components.

pub mod type_signature;

pub use type_signature::{resolve_path_type, TypeSignature};
