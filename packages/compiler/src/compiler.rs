//! Component Compiler
//!
//! Entry point of a compile. The template is annotated with element
//! identifiers, every binding is extracted once into a registry, and the
//! client backend, server backend and mapping compiler all read from that
//! registry.

use crate::binding::BindingRegistry;
use crate::config::CompilerConfig;
use crate::error::Result;
use crate::mapping::{build_mapping_tree, CompiledMapping};
use crate::output::abstract_emitter::{emit_expression, emit_statements};
use crate::output::output_ast as o;
use crate::path::Path;
use crate::render::client::build_client_render_method;
use crate::render::server::build_server_render_method;
use crate::render::RenderContext;
use crate::schema::TypeSignature;
use crate::template::ast::Template;
use crate::template::dom::annotate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::slice;
use tracing::{debug, instrument};

/// One component to compile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSource {
    pub name: String,
    pub template: Template,
    /// Names that resolve outside the component data
    #[serde(default)]
    pub globals: HashSet<String>,
    /// Declared shape of the component data
    #[serde(default)]
    pub schema: Option<TypeSignature>,
}

impl ComponentSource {
    pub fn new(name: impl Into<String>, template: Template) -> Self {
        ComponentSource {
            name: name.into(),
            template,
            globals: HashSet::new(),
            schema: None,
        }
    }
}

/// Output of a compile
#[derive(Debug, Clone)]
pub struct CompiledComponent {
    pub name: String,
    /// The template after identifier assignment
    pub template: Template,
    pub client_render: o::Statement,
    pub server_render: o::Statement,
    pub mapping: CompiledMapping,
    /// Every distinct data path the template reads
    pub dependencies: Vec<Path>,
}

impl CompiledComponent {
    pub fn client_source(&self, config: &CompilerConfig) -> String {
        emit_statements(slice::from_ref(&self.client_render), false, config.minify)
    }

    pub fn server_source(&self, config: &CompilerConfig) -> String {
        emit_statements(
            slice::from_ref(&self.server_render),
            config.print_types(),
            config.minify,
        )
    }

    pub fn mapping_source(&self, config: &CompilerConfig) -> String {
        emit_expression(&self.mapping.to_literal(), false, config.minify)
    }
}

/// Compiles one component; the first error aborts the whole compile
#[instrument(skip_all, fields(component = %source.name))]
pub fn compile_component(source: &ComponentSource, config: &CompilerConfig) -> Result<CompiledComponent> {
    let mut template = source.template.clone();
    annotate(&mut template);

    let mut globals = source.globals.clone();
    globals.insert("this".to_string());
    let registry = BindingRegistry::build(&template, &globals)?;
    debug!(records = registry.records().len(), "extracted bindings");

    let ctx = RenderContext::new(&template, &registry, config);
    let client_render = build_client_render_method(&ctx)?;
    let server_render = build_server_render_method(&ctx)?;
    let mapping = build_mapping_tree(&ctx, source.schema.as_ref())?;
    let dependencies = registry.dependencies();

    Ok(CompiledComponent {
        name: source.name.clone(),
        template,
        client_render,
        server_render,
        mapping,
        dependencies,
    })
}

/// Compiles independent components in parallel, keeping input order
pub fn compile_components(
    sources: &[ComponentSource],
    config: &CompilerConfig,
) -> Vec<Result<CompiledComponent>> {
    sources
        .par_iter()
        .map(|source| compile_component(source, config))
        .collect()
}
