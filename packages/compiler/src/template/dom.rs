//! Node Identifiers and DOM Paths
//!
//! Runtime code finds elements in two ways. Elements outside any loop are
//! tagged with a generated identifier (appended to their `class`) and looked
//! up with `this.getElem(id)`. Nodes rendered by a loop are reached by
//! walking `childNodes` down from the nearest tagged ancestor, with loop
//! indices standing in for positions below an iterator root.

use crate::error::{CompileError, Result};
use crate::output::output_ast as o;
use crate::path::index_identifier;
use crate::template::ast::{NodeId, NodeKind, Template};
use std::collections::HashSet;

fn to_base36(mut n: usize) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[n % 36]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn append_class(template: &mut Template, id: NodeId, identifier: &str) {
    if let Some(element) = template.element_mut(id) {
        let class = match element.attributes.get("class") {
            Some(Some(existing)) if !existing.is_empty() => format!("{} {}", existing, identifier),
            _ => identifier.to_string(),
        };
        element.attributes.insert("class".to_string(), Some(class));
    }
}

/// Returns the identifier of element `id`, assigning one on first use.
///
/// The identifier is appended to the element's `class`. The else branch of a
/// conditional root gets the same identifier, so whichever branch is mounted
/// answers the lookup.
pub fn add_identifier(template: &mut Template, id: NodeId) -> Option<String> {
    let element = template.element(id)?;
    if let Some(identifier) = &element.identifier {
        return Some(identifier.clone());
    }
    let else_node = element.else_node;

    let used: HashSet<String> = template
        .nodes
        .iter()
        .filter_map(|n| match &n.kind {
            NodeKind::Element(e) => e.identifier.clone(),
            _ => None,
        })
        .collect();
    let mut identifier = format!("p{}", to_base36(template.next_identifier));
    template.next_identifier += 1;
    while used.contains(&identifier) {
        identifier = format!("p{}", to_base36(template.next_identifier));
        template.next_identifier += 1;
    }

    for target in std::iter::once(id).chain(else_node) {
        if let Some(element) = template.element_mut(target) {
            element.identifier = Some(identifier.clone());
        }
        append_class(template, target, &identifier);
    }
    Some(identifier)
}

/// Whether some strict ancestor of `id` is an iterator root
pub fn is_multiple(template: &Template, id: NodeId) -> bool {
    loop_depth(template, id) > 0
}

/// Number of iterator roots strictly above `id`
pub fn loop_depth(template: &Template, id: NodeId) -> usize {
    let mut depth = 0;
    let mut point = template.parent(id);
    while let Some(current) = point {
        if template.element(current).map_or(false, |e| e.is_iterator_root()) {
            depth += 1;
        }
        point = template.parent(current);
    }
    depth
}

/// Whether a node produces a DOM node at render time
pub fn is_rendered(template: &Template, id: NodeId) -> bool {
    match &template.node(id).kind {
        NodeKind::Comment(comment) => comment.is_fragment,
        _ => true,
    }
}

/// The rendered children of `id`
pub fn rendered_children(template: &Template, id: NodeId) -> Vec<NodeId> {
    template
        .children(id)
        .iter()
        .copied()
        .filter(|child| is_rendered(template, *child))
        .collect()
}

/// Position of `id` among its parent's rendered children.
///
/// An else branch takes the position of its conditional root.
pub fn rendered_index(template: &Template, id: NodeId) -> Result<usize> {
    let broken = || CompileError::BrokenAncestry {
        tag: template.describe(id),
    };
    let parent = template.parent(id).ok_or_else(broken)?;
    let siblings = rendered_children(template, parent);
    if let Some(index) = siblings.iter().position(|s| *s == id) {
        return Ok(index);
    }
    siblings
        .iter()
        .position(|s| template.element(*s).and_then(|e| e.else_node) == Some(id))
        .ok_or_else(broken)
}

/// `this.getElem('id')`
pub fn get_elem(template: &Template, id: NodeId) -> Result<o::Expression> {
    let element = template
        .element(id)
        .ok_or_else(|| CompileError::MissingIdentifier {
            tag: template.describe(id),
        })?;
    let identifier = element
        .identifier
        .as_ref()
        .ok_or_else(|| CompileError::MissingIdentifier {
            tag: element.tag_name.clone(),
        })?;
    Ok(o::this_expr()
        .prop("getElem")
        .call_fn(vec![o::literal(identifier.as_str())]))
}

/// Expression evaluating to the DOM node rendered for `id`.
///
/// Loop indices appear as `$iN` for the loop at depth `N`; callbacks take
/// them as parameters.
pub fn node_reference(template: &Template, id: NodeId) -> Result<o::Expression> {
    if id == template.root {
        return Ok(o::this_expr());
    }
    if template.element(id).is_some() && !is_multiple(template, id) {
        return get_elem(template, id);
    }

    let mut steps: Vec<o::Expression> = Vec::new();
    let mut point = id;
    loop {
        let parent = template.parent(point).ok_or_else(|| CompileError::BrokenAncestry {
            tag: template.describe(id),
        })?;
        let position = rendered_index(template, point)?;
        let parent_element = template.element(parent);
        let step = if parent_element.map_or(false, |e| e.is_iterator_root()) {
            let index = o::variable(index_identifier(loop_depth(template, parent)));
            let width = rendered_children(template, parent).len();
            if width == 1 {
                index
            } else {
                index
                    .binary(o::BinaryOperator::Multiply, o::literal(width))
                    .plus(o::literal(position))
            }
        } else {
            o::literal(position)
        };
        steps.push(step);
        point = parent;
        if point == template.root || !is_multiple(template, point) {
            break;
        }
    }

    let anchor = if point == template.root {
        o::this_expr()
    } else {
        get_elem(template, point)?
    };
    Ok(steps
        .into_iter()
        .rev()
        .fold(anchor, |acc, step| acc.prop("childNodes").key(step)))
}

/// Tags every element that runtime callbacks will need to find and
/// synthesizes the missing else branches of conditional roots.
pub fn annotate(template: &mut Template) {
    let ids: Vec<NodeId> = (0..template.nodes.len()).map(NodeId).collect();
    for id in ids.iter().copied() {
        if id == template.root || is_multiple(template, id) {
            continue;
        }
        let needs_identifier = match template.element(id) {
            Some(element) => {
                !element.dynamic_attributes.is_empty()
                    || element.is_conditional_root()
                    || element.is_iterator_root()
                    || template.children(id).iter().any(|child| {
                        matches!(&template.node(*child).kind, NodeKind::Text(t) if t.value.is_some())
                    })
            }
            None => false,
        };
        if needs_identifier {
            add_identifier(template, id);
        }
    }

    for id in ids {
        let missing_else = template
            .element(id)
            .map_or(false, |e| e.is_conditional_root() && e.else_node.is_none());
        if missing_else {
            create_null_else_element(template, id);
        }
    }
}

/// `<span class="{identifier}" data-else>` standing in for an absent else branch
pub fn create_null_else_element(template: &mut Template, conditional: NodeId) -> NodeId {
    let identifier = template
        .element(conditional)
        .and_then(|e| e.identifier.clone());
    let placeholder = template.add_else_element(conditional, "span");
    if let Some(identifier) = identifier {
        if let Some(element) = template.element_mut(placeholder) {
            element.identifier = Some(identifier.clone());
        }
        template.set_attribute(placeholder, "class", Some(&identifier));
    }
    template.set_attribute(placeholder, "data-else", None);
    placeholder
}
