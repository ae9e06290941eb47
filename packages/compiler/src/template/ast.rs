//! Template AST
//!
//! An annotated template, stored as an arena of nodes. Children are index
//! lists and every node keeps the index of its parent.

use crate::expression::ast::Expr;
use bitflags::bitflags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Handle of a node inside its [`Template`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

bitflags! {
    /// Marks elements whose children are computed at render time
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct NodeFlags: u8 {
        const CONDITIONAL_ROOT = 1 << 0;
        const ITERATOR_ROOT = 1 << 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBinding {
    pub event: String,
    pub handler: Expr,
    /// The handler names a method declared on the component
    #[serde(default)]
    pub exists_on_component: bool,
}

/// `for variable of subject`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    pub variable: String,
    pub subject: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub tag_name: String,
    /// Static attributes; `None` is a boolean-presence attribute
    #[serde(default)]
    pub attributes: IndexMap<String, Option<String>>,
    #[serde(default)]
    pub dynamic_attributes: IndexMap<String, Expr>,
    #[serde(default)]
    pub events: Vec<EventBinding>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub flags: NodeFlags,
    #[serde(default)]
    pub condition: Option<Expr>,
    #[serde(default)]
    pub else_node: Option<NodeId>,
    #[serde(default)]
    pub iteration: Option<Iteration>,
}

impl Element {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Element {
            tag_name: tag_name.into(),
            attributes: IndexMap::new(),
            dynamic_attributes: IndexMap::new(),
            events: Vec::new(),
            identifier: None,
            flags: NodeFlags::empty(),
            condition: None,
            else_node: None,
            iteration: None,
        }
    }

    pub fn is_conditional_root(&self) -> bool {
        self.flags.contains(NodeFlags::CONDITIONAL_ROOT)
    }

    pub fn is_iterator_root(&self) -> bool {
        self.flags.contains(NodeFlags::ITERATOR_ROOT)
    }

    pub fn is_slot(&self) -> bool {
        self.tag_name == "slot"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    /// Interpolated expression replacing `text` at render time
    #[serde(default)]
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment: String,
    /// Fragment comments are placeholders that both backends render
    #[serde(default)]
    pub is_fragment: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    Element(Element),
    Text(Text),
    Comment(Comment),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateNode {
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub nodes: Vec<TemplateNode>,
    pub root: NodeId,
    /// Counter behind generated identifiers
    #[serde(default)]
    pub next_identifier: usize,
}

impl Template {
    /// A template whose root is a `<template>` element
    pub fn new() -> Self {
        Template {
            nodes: vec![TemplateNode {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Element(Element::new("template")),
            }],
            root: NodeId(0),
            next_identifier: 0,
        }
    }

    pub fn node(&self, id: NodeId) -> &TemplateNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Tag name for elements, `#text`/`#comment` otherwise
    pub fn describe(&self, id: NodeId) -> String {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => element.tag_name.clone(),
            NodeKind::Text(_) => "#text".to_string(),
            NodeKind::Comment(_) => "#comment".to_string(),
        }
    }

    fn push_node(&mut self, parent: Option<NodeId>, kind: NodeKind, attach: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TemplateNode {
            parent,
            children: Vec::new(),
            kind,
        });
        if let (true, Some(parent)) = (attach, parent) {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub fn add_element(&mut self, parent: NodeId, tag_name: &str) -> NodeId {
        self.push_node(Some(parent), NodeKind::Element(Element::new(tag_name)), true)
    }

    pub fn add_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let kind = NodeKind::Text(Text {
            text: text.to_string(),
            value: None,
        });
        self.push_node(Some(parent), kind, true)
    }

    pub fn add_dynamic_text(&mut self, parent: NodeId, value: Expr) -> NodeId {
        let kind = NodeKind::Text(Text {
            text: String::new(),
            value: Some(value),
        });
        self.push_node(Some(parent), kind, true)
    }

    pub fn add_comment(&mut self, parent: NodeId, comment: &str, is_fragment: bool) -> NodeId {
        let kind = NodeKind::Comment(Comment {
            comment: comment.to_string(),
            is_fragment,
        });
        self.push_node(Some(parent), kind, true)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: Option<&str>) {
        if let Some(element) = self.element_mut(id) {
            element
                .attributes
                .insert(name.to_string(), value.map(str::to_string));
        }
    }

    pub fn set_dynamic_attribute(&mut self, id: NodeId, name: &str, value: Expr) {
        if let Some(element) = self.element_mut(id) {
            element.dynamic_attributes.insert(name.to_string(), value);
        }
    }

    pub fn add_event(&mut self, id: NodeId, event: &str, handler: Expr, exists_on_component: bool) {
        if let Some(element) = self.element_mut(id) {
            element.events.push(EventBinding {
                event: event.to_string(),
                handler,
                exists_on_component,
            });
        }
    }

    pub fn make_conditional(&mut self, id: NodeId, condition: Expr) {
        if let Some(element) = self.element_mut(id) {
            element.flags.insert(NodeFlags::CONDITIONAL_ROOT);
            element.condition = Some(condition);
        }
    }

    /// Creates the else branch of conditional `id`.
    ///
    /// The branch is not a child of anything; its parent is the conditional's
    /// parent so that ancestry walks behave the same from either branch.
    pub fn add_else_element(&mut self, id: NodeId, tag_name: &str) -> NodeId {
        let parent = self.parent(id);
        let else_id = self.push_node(parent, NodeKind::Element(Element::new(tag_name)), false);
        if let Some(element) = self.element_mut(id) {
            element.else_node = Some(else_id);
        }
        else_id
    }

    pub fn make_iterator(&mut self, id: NodeId, variable: &str, subject: Expr) {
        if let Some(element) = self.element_mut(id) {
            element.flags.insert(NodeFlags::ITERATOR_ROOT);
            element.iteration = Some(Iteration {
                variable: variable.to_string(),
                subject,
            });
        }
    }
}

impl Default for Template {
    fn default() -> Self {
        Template::new()
    }
}
