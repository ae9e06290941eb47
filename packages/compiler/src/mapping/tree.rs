//! Mapping Tree
//!
//! Nested descriptor keyed by path segment. Compiled once per component with
//! output-AST callbacks, then re-instantiated by the runtime with closures.

use crate::error::{CompileError, Result};
use crate::output::output_ast as o;
use crate::path::{Path, PathSegment};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeType {
    Object,
    Array,
}

impl NodeType {
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Object => "Object",
            NodeType::Array => "Array",
        }
    }
}

/// One node of a mapping tree.
///
/// `get` is replaced by later registrations while `set` accumulates, so
/// every binding on a path is updated on write but a read has one source.
#[derive(Debug, Clone)]
pub struct MappingNode<G, S = G> {
    pub node_type: Option<NodeType>,
    pub get: Option<G>,
    pub set: Vec<S>,
    pub children: IndexMap<String, MappingNode<G, S>>,
    /// Shared schema of every element, for arrays
    pub element: Option<Box<MappingNode<G, S>>>,
    /// How to read and shrink the rendered length, for arrays
    pub length: Option<Box<MappingNode<G, S>>>,
    /// Called when a write appends to an array
    pub push: Option<S>,
}

impl<G, S> Default for MappingNode<G, S> {
    fn default() -> Self {
        MappingNode {
            node_type: None,
            get: None,
            set: Vec::new(),
            children: IndexMap::new(),
            element: None,
            length: None,
            push: None,
        }
    }
}

impl<G, S> MappingNode<G, S> {
    pub fn new() -> Self {
        MappingNode::default()
    }

    pub fn is_array(&self) -> bool {
        self.node_type == Some(NodeType::Array)
    }

    pub fn property(&self, name: &str) -> Option<&MappingNode<G, S>> {
        self.children.get(name)
    }

    pub fn element(&self) -> Option<&MappingNode<G, S>> {
        self.element.as_deref()
    }

    pub fn length(&self) -> Option<&MappingNode<G, S>> {
        self.length.as_deref()
    }

    /// Follows `path` without creating anything
    pub fn lookup(&self, path: &Path) -> Option<&MappingNode<G, S>> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match segment {
                PathSegment::Property(name) if name == "length" && node.is_array() => node.length(),
                PathSegment::Property(name) => node.property(name),
                PathSegment::Marker { .. } => node.element(),
            })
    }

    /// Tags this node, failing when it is already tagged differently.
    ///
    /// An untagged node may hold a `length` child read before anything
    /// marked it as an array; tagging it as an array moves that child into
    /// the length slot.
    pub fn set_type(&mut self, node_type: NodeType, at: &dyn Fn() -> String) -> Result<()> {
        match self.node_type {
            Some(existing) if existing == node_type => return Ok(()),
            Some(existing) => {
                return Err(CompileError::TypeMismatch {
                    path: at(),
                    reason: format!(
                        "used both as {} and as {}",
                        existing.name(),
                        node_type.name()
                    ),
                })
            }
            None => {}
        }
        if node_type == NodeType::Array {
            if self.children.keys().any(|key| key != "length") {
                return Err(CompileError::TypeMismatch {
                    path: at(),
                    reason: "properties read on a value used as an Array".to_string(),
                });
            }
            if let Some(length) = self.children.shift_remove("length") {
                self.length = Some(Box::new(length));
            }
        }
        self.node_type = Some(node_type);
        Ok(())
    }

    /// Walks `path`, creating and tagging nodes on the way, and returns the
    /// node at its end.
    pub fn ensure_path(&mut self, path: &Path) -> Result<&mut MappingNode<G, S>> {
        let mut node = self;
        for (i, segment) in path.segments().iter().enumerate() {
            let at = || {
                Path::from_segments(path.segments()[..i.max(1)].iter().cloned())
                    .map(|p| p.to_string())
                    .unwrap_or_default()
            };
            node = match segment {
                PathSegment::Property(name) if name == "length" && node.node_type != Some(NodeType::Object) => {
                    if node.is_array() {
                        node.length.get_or_insert_with(Default::default).as_mut()
                    } else {
                        node.children.entry(name.clone()).or_default()
                    }
                }
                PathSegment::Property(name) => {
                    node.set_type(NodeType::Object, &at)?;
                    node.children.entry(name.clone()).or_default()
                }
                PathSegment::Marker { .. } => {
                    node.set_type(NodeType::Array, &at)?;
                    node.element.get_or_insert_with(Default::default).as_mut()
                }
            };
        }
        Ok(node)
    }

    pub fn attach_get(&mut self, get: G) {
        self.get = Some(get);
    }

    pub fn attach_set(&mut self, set: S) {
        self.set.push(set);
    }

    /// Rebuilds the tree with every callback converted
    pub fn map_callbacks<G2, S2>(
        self,
        fg: &mut impl FnMut(G) -> G2,
        fs: &mut impl FnMut(S) -> S2,
    ) -> MappingNode<G2, S2> {
        MappingNode {
            node_type: self.node_type,
            get: self.get.map(&mut *fg),
            set: self.set.into_iter().map(&mut *fs).collect(),
            children: self
                .children
                .into_iter()
                .map(|(key, child)| (key, child.map_callbacks(fg, fs)))
                .collect(),
            element: self.element.map(|e| Box::new(e.map_callbacks(fg, fs))),
            length: self.length.map(|l| Box::new(l.map_callbacks(fg, fs))),
            push: self.push.map(&mut *fs),
        }
    }
}

impl MappingNode<o::Expression> {
    /// Object literal for the client bundle.
    ///
    /// Keys are `type`, `get`, `set` (an array, called in order), `push`,
    /// `length`, `*` for the element schema, and one entry per property.
    pub fn to_literal(&self) -> o::Expression {
        let mut entries = Vec::new();
        if let Some(node_type) = self.node_type {
            entries.push(("type".to_string(), o::literal(node_type.name())));
        }
        if let Some(get) = &self.get {
            entries.push(("get".to_string(), get.clone()));
        }
        if !self.set.is_empty() {
            entries.push(("set".to_string(), o::literal_arr(self.set.clone())));
        }
        if let Some(push) = &self.push {
            entries.push(("push".to_string(), push.clone()));
        }
        if let Some(length) = &self.length {
            entries.push(("length".to_string(), length.to_literal()));
        }
        if let Some(element) = &self.element {
            entries.push(("*".to_string(), element.to_literal()));
        }
        for (key, child) in &self.children {
            entries.push((key.clone(), child.to_literal()));
        }
        o::literal_map(entries)
    }
}
