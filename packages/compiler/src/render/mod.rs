//! Render Module
//!
//! The client and server backends. Both read binding expressions from the
//! same [`BindingRegistry`], so conditions and loop sources agree between
//! them.

pub mod client;
pub mod escape;
pub mod lower;
pub mod server;

use crate::binding::registry::{BindingKind, BindingRegistry, BindingSite};
use crate::config::CompilerConfig;
use crate::expression::ast::Expr;
use crate::template::ast::{NodeId, Template};

/// Everything a backend reads while emitting one component
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub template: &'a Template,
    pub registry: &'a BindingRegistry,
    pub config: &'a CompilerConfig,
}

impl<'a> RenderContext<'a> {
    pub fn new(template: &'a Template, registry: &'a BindingRegistry, config: &'a CompilerConfig) -> Self {
        RenderContext {
            template,
            registry,
            config,
        }
    }

    /// The rewritten expression at a site, or `fallback` when the registry
    /// never saw it
    pub fn binding<'e>(&'e self, node: NodeId, kind: BindingKind, fallback: &'e Expr) -> &'e Expr {
        self.registry
            .expression_for(&BindingSite::new(node, kind))
            .unwrap_or(fallback)
    }
}
