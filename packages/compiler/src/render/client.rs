//! Client Backend
//!
//! Emits the `render` generator of a component. Every rendered node becomes
//! a call to the runtime's `h`:
//!
//! ```text
//! h(tagName, attributes | 0, events | 0, ...children)
//! ```

use crate::binding::registry::BindingKind;
use crate::error::Result;
use crate::expression::ast::Expr;
use crate::output::output_ast as o;
use crate::path::index_identifier;
use crate::render::lower::{client_data_root, lower_expr};
use crate::render::RenderContext;
use crate::template::ast::{Element, NodeId, NodeKind};
use crate::template::dom::{loop_depth, rendered_children};
use tracing::debug;

/// Builds `function* render() { yield ...; }` over the template's top-level
/// nodes
pub fn build_client_render_method(ctx: &RenderContext<'_>) -> Result<o::Statement> {
    let mut statements = Vec::new();
    for child in rendered_children(ctx.template, ctx.template.root) {
        let rendered = match render_node(ctx, child)? {
            Some(rendered) => rendered,
            None => continue,
        };
        // `yield ...x` is not valid, delegate instead
        let statement = match rendered {
            o::Expression::Spread(spread) => spread.expr.to_yield(true),
            other => other.to_yield(false),
        };
        statements.push(statement.to_stmt());
    }
    debug!(yields = statements.len(), "built client render method");

    Ok(o::Statement::DeclareFn(o::DeclareFunctionStmt {
        name: "render".to_string(),
        params: Vec::new(),
        statements,
        is_generator: true,
        type_: None,
    }))
}

/// Render expression for any node; `None` for nodes that render nothing
pub fn render_node(ctx: &RenderContext<'_>, id: NodeId) -> Result<Option<o::Expression>> {
    match &ctx.template.node(id).kind {
        NodeKind::Element(_) => render_element(ctx, id, false).map(Some),
        NodeKind::Text(text) => match &text.value {
            Some(value) => {
                let value = ctx.binding(id, BindingKind::Text, value);
                lower_expr(value, &client_data_root()).map(Some)
            }
            None => Ok(Some(o::literal(text.text.as_str()))),
        },
        NodeKind::Comment(comment) if comment.is_fragment => {
            let args = if comment.comment.is_empty() {
                Vec::new()
            } else {
                vec![o::literal(comment.comment.as_str())]
            };
            Ok(Some(o::variable("createComment").call_fn(args)))
        }
        NodeKind::Comment(_) => Ok(None),
    }
}

/// Render expression for an element.
///
/// With `skip_conditional` a conditional root renders its truthy branch
/// only, which is what the guard selects at runtime.
pub fn render_element(
    ctx: &RenderContext<'_>,
    id: NodeId,
    skip_conditional: bool,
) -> Result<o::Expression> {
    let element = match ctx.template.element(id) {
        Some(element) => element,
        None => return Ok(o::null_expr()),
    };

    if element.is_slot() {
        return Ok(o::spread(o::this_expr().prop("slotElement")));
    }

    if let (false, true, Some(condition)) = (
        skip_conditional,
        element.is_conditional_root(),
        element.condition.as_ref(),
    ) {
        let guard = ctx.binding(id, BindingKind::ConditionalGuard, condition);
        let guard = lower_expr(guard, &client_data_root())?;
        let truthy = render_element(ctx, id, true)?;
        let falsy = match element.else_node {
            Some(else_node) => render_element(ctx, else_node, false)?,
            None => o::null_expr(),
        };
        return Ok(guard.conditional(truthy, falsy));
    }

    let mut args = vec![
        o::literal(element.tag_name.as_str()),
        attributes_argument(ctx, id, element)?,
        events_argument(ctx, id, element)?,
    ];

    if let (true, Some(iteration)) = (element.is_iterator_root(), element.iteration.as_ref()) {
        let subject = ctx.binding(id, BindingKind::IteratorSource, &iteration.subject);
        let subject = lower_expr(subject, &client_data_root())?;
        let items = render_item_nodes(ctx, id)?;
        let params = vec![
            o::FnParam::new(iteration.variable.as_str()),
            o::FnParam::new(index_identifier(loop_depth(ctx.template, id))),
        ];
        let mapped = if items.len() == 1 {
            let item = items.into_iter().next().unwrap_or_else(o::null_expr);
            subject.prop("map").call_fn(vec![o::arrow_fn_expr(params, item)])
        } else {
            subject
                .prop("flatMap")
                .call_fn(vec![o::arrow_fn_expr(params, o::literal_arr(items))])
        };
        args.push(o::spread(mapped));
    } else {
        for child in rendered_children(ctx.template, id) {
            if let Some(rendered) = render_node(ctx, child)? {
                args.push(rendered);
            }
        }
    }

    if ctx.config.trim_trailing_zeros {
        // the tag name argument always stays
        while args.len() > 1 && args.last().map_or(false, |a| a.is_falsy_sentinel()) {
            args.pop();
        }
    }

    Ok(o::variable("h").call_fn(args))
}

/// The render expressions of one iteration of iterator root `id`
pub fn render_item_nodes(ctx: &RenderContext<'_>, id: NodeId) -> Result<Vec<o::Expression>> {
    let mut items = Vec::new();
    for child in rendered_children(ctx.template, id) {
        if let Some(rendered) = render_node(ctx, child)? {
            items.push(rendered);
        }
    }
    Ok(items)
}

fn attributes_argument(ctx: &RenderContext<'_>, id: NodeId, element: &Element) -> Result<o::Expression> {
    let mut entries = Vec::new();
    for (name, value) in &element.attributes {
        let value = match value {
            Some(value) => o::literal(value.as_str()),
            None => o::literal(true),
        };
        entries.push((name.clone(), value));
    }
    for (name, value) in &element.dynamic_attributes {
        let value = ctx.binding(id, BindingKind::Attribute(name.clone()), value);
        entries.push((name.clone(), lower_expr(value, &client_data_root())?));
    }
    Ok(if entries.is_empty() {
        o::falsy_sentinel()
    } else {
        o::literal_map(entries)
    })
}

/// Component methods are bound to `this`; any other handler is emitted from its
/// registry-rewritten expression, so its data reads go through `this.data`
fn events_argument(ctx: &RenderContext<'_>, id: NodeId, element: &Element) -> Result<o::Expression> {
    if element.events.is_empty() {
        return Ok(o::falsy_sentinel());
    }
    let mut entries = Vec::new();
    for event in &element.events {
        let callback = match (event.exists_on_component, method_name(&event.handler)) {
            (true, Some(method)) => o::this_expr()
                .prop(method)
                .prop("bind")
                .call_fn(vec![o::this_expr()]),
            _ => {
                let handler = ctx.binding(id, BindingKind::Event(event.event.clone()), &event.handler);
                lower_expr(handler, &client_data_root())?
            }
        };
        entries.push((event.event.clone(), callback));
    }
    Ok(o::literal_map(entries))
}

/// `someEvent` and `this.someEvent` both name the method `someEvent`
fn method_name(handler: &Expr) -> Option<&str> {
    let chain = handler.reference_chain()?;
    match chain.as_slice() {
        [name] | ["this", name] => Some(*name),
        _ => None,
    }
}
