//! Callback Compiler
//!
//! Turns a dependency record into the arrow functions stored on the mapping
//! tree. Setters take `(value, $i0, ..)` and getters `($i0, ..)`, one index
//! per loop marker on the path. A setter re-evaluates the binding with the
//! written value in place of the path it was triggered by.

use crate::binding::registry::{BindingKind, DependencyRecord};
use crate::error::Result;
use crate::expression::ast::{Expr, ObjectEntry, TemplatePart};
use crate::output::output_ast as o;
use crate::path::{chain_from, index_identifier, MarkerTable, Path};
use crate::render::client::{render_element, render_item_nodes};
use crate::render::lower::{client_data_root, lower_expr};
use crate::render::RenderContext;
use crate::template::ast::NodeId;
use crate::template::dom::{loop_depth, node_reference, rendered_children};
use tracing::debug;

pub const VALUE_PARAM: &str = "value";

/// Callbacks attached at the leaf of one record path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCallbacks {
    pub get: Option<o::Expression>,
    pub set: Option<o::Expression>,
}

/// Callbacks attached to the source array of a loop
#[derive(Debug, Clone, PartialEq)]
pub struct IteratorCallbacks {
    pub length_get: o::Expression,
    pub length_set: o::Expression,
    pub push: o::Expression,
}

fn index_params(count: usize) -> Vec<o::FnParam> {
    (0..count).map(|d| o::FnParam::new(index_identifier(d))).collect()
}

fn getter(indices: usize, body: o::Expression) -> o::Expression {
    o::arrow_fn_expr(index_params(indices), body)
}

fn setter(indices: usize, extra: Option<usize>, body: o::Expression) -> o::Expression {
    let mut params = vec![o::FnParam::new(VALUE_PARAM)];
    params.extend(index_params(indices));
    if let Some(extra) = extra {
        params.push(o::FnParam::new(index_identifier(extra)));
    }
    o::arrow_fn_expr(params, body)
}

/// Member chains compare equal whether or not their links are optional
fn same_reference(a: &Expr, b: &Expr) -> bool {
    match (a, b) {
        (
            Expr::Member {
                object: oa,
                property: pa,
                ..
            },
            Expr::Member {
                object: ob,
                property: pb,
                ..
            },
        ) => pa == pb && same_reference(oa, ob),
        (
            Expr::Index {
                object: oa,
                index: ia,
            },
            Expr::Index {
                object: ob,
                index: ib,
            },
        ) => ia == ib && same_reference(oa, ob),
        _ => a == b,
    }
}

/// Rebuilds `expr` with every occurrence of `target` replaced
pub fn substitute(expr: &Expr, target: &Expr, replacement: &Expr) -> Expr {
    if same_reference(expr, target) {
        return replacement.clone();
    }
    let sub = |e: &Expr| Box::new(substitute(e, target, replacement));
    let sub_all = |es: &[Expr]| {
        es.iter()
            .map(|e| substitute(e, target, replacement))
            .collect::<Vec<_>>()
    };
    match expr {
        Expr::Member {
            object,
            property,
            optional,
        } => Expr::Member {
            object: sub(object),
            property: property.clone(),
            optional: *optional,
        },
        Expr::Index { object, index } => Expr::Index {
            object: sub(object),
            index: sub(index),
        },
        Expr::Binary { operator, lhs, rhs } => Expr::Binary {
            operator: *operator,
            lhs: sub(lhs),
            rhs: sub(rhs),
        },
        Expr::Unary { operator, operand } => Expr::Unary {
            operator: *operator,
            operand: sub(operand),
        },
        Expr::Call { callee, arguments } => Expr::Call {
            callee: sub(callee),
            arguments: sub_all(arguments),
        },
        Expr::New { callee, arguments } => Expr::New {
            callee: sub(callee),
            arguments: sub_all(arguments),
        },
        Expr::Conditional {
            condition,
            when_true,
            when_false,
        } => Expr::Conditional {
            condition: sub(condition),
            when_true: sub(when_true),
            when_false: sub(when_false),
        },
        Expr::TemplateLiteral { parts } => Expr::TemplateLiteral {
            parts: parts
                .iter()
                .map(|part| match part {
                    TemplatePart::Text(text) => TemplatePart::Text(text.clone()),
                    TemplatePart::Expr(e) => TemplatePart::Expr(substitute(e, target, replacement)),
                })
                .collect(),
        },
        Expr::Object { entries } => Expr::Object {
            entries: entries
                .iter()
                .map(|entry| ObjectEntry {
                    key: entry.key.clone(),
                    value: substitute(&entry.value, target, replacement),
                })
                .collect(),
        },
        Expr::Array { elements } => Expr::Array {
            elements: sub_all(elements),
        },
        Expr::DataRoot | Expr::Identifier { .. } | Expr::Literal { .. } | Expr::Function { .. } => {
            expr.clone()
        }
    }
}

/// Compiles the get and set callbacks of `record` for one of its paths.
///
/// Nothing is produced for event handlers and loop sources, nor when the
/// site sits in more loops than the path has markers: such a setter could
/// not tell which rendered copy to update.
pub fn compile_callbacks(
    ctx: &RenderContext<'_>,
    record: &DependencyRecord,
    path: &Path,
) -> Result<RecordCallbacks> {
    let node = record.site.node;
    let indices = path.marker_count();
    if loop_depth(ctx.template, node) > indices {
        debug!(path = %path, site = %record.site, "binding repeats per loop item; no callbacks");
        return Ok(RecordCallbacks::default());
    }

    let reference = chain_from(&MarkerTable::symbolic(), path, Expr::DataRoot);
    let is_identity = same_reference(&record.expression, &reference);
    let with_value = substitute(&record.expression, &reference, &Expr::ident(VALUE_PARAM));
    let with_value = lower_expr(&with_value, &client_data_root())?;

    Ok(match &record.site.kind {
        BindingKind::Attribute(name) => {
            let elem = node_reference(ctx.template, node)?;
            let set = elem
                .clone()
                .prop("setAttribute")
                .call_fn(vec![o::literal(name.as_str()), with_value]);
            let get = is_identity.then(|| {
                getter(
                    indices,
                    elem.prop("getAttribute").call_fn(vec![o::literal(name.as_str())]),
                )
            });
            RecordCallbacks {
                get,
                set: Some(setter(indices, None, set)),
            }
        }
        BindingKind::Text => {
            let text = node_reference(ctx.template, node)?;
            let set = text.clone().set_prop("data", with_value);
            let get = is_identity.then(|| getter(indices, text.prop("data")));
            RecordCallbacks {
                get,
                set: Some(setter(indices, None, set)),
            }
        }
        BindingKind::ConditionalGuard => {
            let elem = node_reference(ctx.template, node)?;
            let truthy = render_element(ctx, node, true)?;
            let falsy = match ctx.template.element(node).and_then(|e| e.else_node) {
                Some(else_node) => render_element(ctx, else_node, false)?,
                None => o::null_expr(),
            };
            let set = o::this_expr()
                .prop("setElem")
                .call_fn(vec![elem, with_value.conditional(truthy, falsy)]);
            RecordCallbacks {
                get: None,
                set: Some(setter(indices, None, set)),
            }
        }
        BindingKind::Event(_) | BindingKind::IteratorSource => RecordCallbacks::default(),
    })
}

/// Compiles the length and push callbacks of the array rendered by
/// iterator root `node`, whose source is `path`.
///
/// `push` receives the index of the new element after the enclosing loop
/// indices.
pub fn compile_iterator_callbacks(
    ctx: &RenderContext<'_>,
    node: NodeId,
    path: &Path,
) -> Result<Option<IteratorCallbacks>> {
    let indices = path.marker_count();
    let depth = loop_depth(ctx.template, node);
    if depth > indices {
        return Ok(None);
    }

    let elem = node_reference(ctx.template, node)?;
    let width = rendered_children(ctx.template, node).len().max(1);
    let scale = |expr: o::Expression, op: o::BinaryOperator| {
        if width == 1 {
            expr
        } else {
            expr.binary(op, o::literal(width))
        }
    };

    let length_get = getter(
        indices,
        scale(elem.clone().prop("childNodes").prop("length"), o::BinaryOperator::Divide),
    );
    let length_set = setter(
        indices,
        None,
        o::this_expr().prop("trimChildren").call_fn(vec![
            elem.clone(),
            scale(o::variable(VALUE_PARAM), o::BinaryOperator::Multiply),
        ]),
    );
    let push = setter(
        indices,
        Some(depth),
        elem.prop("append").call_fn(render_item_nodes(ctx, node)?),
    );
    Ok(Some(IteratorCallbacks {
        length_get,
        length_set,
        push,
    }))
}
