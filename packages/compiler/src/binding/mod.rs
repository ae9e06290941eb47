//! Binding Module

pub mod registry;

pub use registry::{BindingKind, BindingRegistry, BindingSite, DependencyRecord};
