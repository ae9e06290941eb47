//! Server Backend
//!
//! Emits `render(data, contentSlot, metaSlot)`, a pure function returning
//! the component's markup as one string concatenation. Every dynamic value
//! goes through the runtime's `escape` exactly once; static text is escaped
//! here.

use crate::binding::registry::BindingKind;
use crate::error::Result;
use crate::output::output_ast as o;
use crate::path::index_identifier;
use crate::render::escape::{escape_call, escape_html};
use crate::render::lower::{lower_expr, server_data_root};
use crate::render::RenderContext;
use crate::template::ast::{NodeId, NodeKind};
use crate::template::dom::{loop_depth, rendered_children};
use crate::template::html_tags::is_void_element;
use tracing::debug;

pub const CONTENT_SLOT: &str = "contentSlot";
pub const META_SLOT: &str = "metaSlot";

enum Part {
    Literal(String),
    Dynamic(o::Expression),
}

/// Pieces of markup, merged into one `+` chain at the end
#[derive(Default)]
struct Concatenation {
    parts: Vec<Part>,
}

impl Concatenation {
    fn push_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.parts.last_mut() {
            Some(Part::Literal(last)) => last.push_str(text),
            _ => self.parts.push(Part::Literal(text.to_string())),
        }
    }

    fn push_expr(&mut self, expr: o::Expression) {
        match expr.as_string_literal() {
            Some(text) => {
                let text = text.to_string();
                self.push_str(&text);
            }
            None => self.parts.push(Part::Dynamic(expr)),
        }
    }

    fn into_expression(self) -> o::Expression {
        let mut parts = self.parts.into_iter().map(|part| match part {
            Part::Literal(text) => o::literal(text),
            Part::Dynamic(expr) => expr,
        });
        let first = match parts.next() {
            Some(first) => first,
            None => return o::literal(""),
        };
        // a leading dynamic part could be a number, so keep string addition
        let first = match first {
            o::Expression::Literal(_) => first,
            dynamic => o::literal("").plus(dynamic),
        };
        parts.fold(first, |acc, part| acc.plus(part))
    }
}

/// Builds the server render function
pub fn build_server_render_method(ctx: &RenderContext<'_>) -> Result<o::Statement> {
    let mut out = Concatenation::default();
    for child in rendered_children(ctx.template, ctx.template.root) {
        render_node(ctx, child, &mut out)?;
    }
    debug!(parts = out.parts.len(), "built server render method");

    let typed = ctx.config.print_types();
    let param = |name: &str, type_: o::Type| {
        if typed {
            o::FnParam::typed(name, type_)
        } else {
            o::FnParam::new(name)
        }
    };
    Ok(o::Statement::DeclareFn(o::DeclareFunctionStmt {
        name: "render".to_string(),
        params: vec![
            param("data", o::dynamic_type()),
            param(CONTENT_SLOT, o::string_type()),
            param(META_SLOT, o::string_type()),
        ],
        statements: vec![o::Statement::return_stmt(out.into_expression())],
        is_generator: false,
        type_: typed.then(o::string_type),
    }))
}

fn render_node(ctx: &RenderContext<'_>, id: NodeId, out: &mut Concatenation) -> Result<()> {
    match &ctx.template.node(id).kind {
        NodeKind::Element(_) => render_element(ctx, id, false, out),
        NodeKind::Text(text) => {
            match &text.value {
                Some(value) => {
                    let value = ctx.binding(id, BindingKind::Text, value);
                    out.push_expr(escape_call(lower_expr(value, &server_data_root())?));
                }
                None => out.push_str(&escape_html(&text.text)),
            }
            Ok(())
        }
        NodeKind::Comment(comment) => {
            if comment.is_fragment {
                out.push_str("<!--");
                out.push_str(&comment.comment);
                out.push_str("-->");
            }
            Ok(())
        }
    }
}

fn render_element(
    ctx: &RenderContext<'_>,
    id: NodeId,
    skip_conditional: bool,
    out: &mut Concatenation,
) -> Result<()> {
    let element = match ctx.template.element(id) {
        Some(element) => element,
        None => return Ok(()),
    };

    if element.is_slot() {
        let slot = match element.attributes.get("for") {
            Some(Some(name)) if name == "meta" => META_SLOT,
            _ => CONTENT_SLOT,
        };
        out.push_expr(o::variable(slot));
        return Ok(());
    }

    if let (false, true, Some(condition)) = (
        skip_conditional,
        element.is_conditional_root(),
        element.condition.as_ref(),
    ) {
        let guard = ctx.binding(id, BindingKind::ConditionalGuard, condition);
        let guard = lower_expr(guard, &server_data_root())?;
        let mut truthy = Concatenation::default();
        render_element(ctx, id, true, &mut truthy)?;
        let mut falsy = Concatenation::default();
        if let Some(else_node) = element.else_node {
            render_element(ctx, else_node, false, &mut falsy)?;
        }
        out.push_expr(guard.conditional(truthy.into_expression(), falsy.into_expression()));
        return Ok(());
    }

    out.push_str("<");
    out.push_str(&element.tag_name);
    for (name, value) in &element.attributes {
        out.push_str(" ");
        out.push_str(name);
        if let Some(value) = value {
            out.push_str("=\"");
            out.push_str(&escape_html(value));
            out.push_str("\"");
        }
    }
    for (name, value) in &element.dynamic_attributes {
        let value = ctx.binding(id, BindingKind::Attribute(name.clone()), value);
        out.push_str(" ");
        out.push_str(name);
        out.push_str("=\"");
        out.push_expr(escape_call(lower_expr(value, &server_data_root())?));
        out.push_str("\"");
    }
    out.push_str(">");

    if is_void_element(&element.tag_name) {
        return Ok(());
    }

    if let (true, Some(iteration)) = (element.is_iterator_root(), element.iteration.as_ref()) {
        let subject = ctx.binding(id, BindingKind::IteratorSource, &iteration.subject);
        let subject = lower_expr(subject, &server_data_root())?;
        let mut item = Concatenation::default();
        for child in rendered_children(ctx.template, id) {
            render_node(ctx, child, &mut item)?;
        }
        let params = vec![
            o::FnParam::new(iteration.variable.as_str()),
            o::FnParam::new(index_identifier(loop_depth(ctx.template, id))),
        ];
        let joined = subject
            .prop("map")
            .call_fn(vec![o::arrow_fn_expr(params, item.into_expression())])
            .prop("join")
            .call_fn(vec![o::literal("")]);
        out.push_expr(joined);
    } else {
        for child in rendered_children(ctx.template, id) {
            render_node(ctx, child, out)?;
        }
    }

    out.push_str("</");
    out.push_str(&element.tag_name);
    out.push_str(">");
    Ok(())
}
