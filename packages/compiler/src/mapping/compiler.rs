//! Mapping Tree Compiler
//!
//! Folds every dependency record into one mapping tree for the component.

use crate::binding::registry::{BindingKind, DependencyRecord};
use crate::error::Result;
use crate::mapping::callbacks::{compile_callbacks, compile_iterator_callbacks};
use crate::mapping::tree::{MappingNode, NodeType};
use crate::output::output_ast as o;
use crate::path::Path;
use crate::render::RenderContext;
use crate::schema::{resolve_path_type, TypeSignature};
use tracing::{debug, instrument};

/// Mapping tree with output-AST callbacks
pub type CompiledMapping = MappingNode<o::Expression>;

#[instrument(skip_all, fields(records = ctx.registry.records().len()))]
pub fn build_mapping_tree(
    ctx: &RenderContext<'_>,
    schema: Option<&TypeSignature>,
) -> Result<CompiledMapping> {
    let mut root = CompiledMapping::new();
    root.node_type = Some(NodeType::Object);

    for record in ctx.registry.records() {
        for path in &record.paths {
            if let Some(schema) = schema {
                resolve_path_type(path, schema)?;
            }
            let callbacks = compile_callbacks(ctx, record, path)?;
            let leaf = root.ensure_path(path)?;
            if let Some(get) = callbacks.get {
                leaf.attach_get(get);
            }
            if let Some(set) = callbacks.set {
                leaf.attach_set(set);
            }
        }
        if record.site.kind == BindingKind::IteratorSource {
            attach_iterator(ctx, record, &mut root)?;
        }
    }
    debug!(properties = root.children.len(), "built mapping tree");
    Ok(root)
}

/// Tags a loop source as an array and gives it length and push callbacks
fn attach_iterator(
    ctx: &RenderContext<'_>,
    record: &DependencyRecord,
    root: &mut CompiledMapping,
) -> Result<()> {
    let node = record.site.node;
    let element_path = match ctx.registry.local_for(node).and_then(|l| l.path.as_ref()) {
        Some(path) => path,
        None => return Ok(()),
    };
    // the alias path is the source path followed by the loop marker
    let segments = element_path.segments();
    let source = match Path::from_segments(segments[..segments.len() - 1].iter().cloned()) {
        Some(source) => source,
        None => return Ok(()),
    };

    let array = root.ensure_path(&source)?;
    array.set_type(NodeType::Array, &|| source.to_string())?;
    if let Some(callbacks) = compile_iterator_callbacks(ctx, node, &source)? {
        let length = array.length.get_or_insert_with(Default::default);
        length.attach_get(callbacks.length_get);
        length.attach_set(callbacks.length_set);
        array.push = Some(callbacks.push);
    }
    Ok(())
}
