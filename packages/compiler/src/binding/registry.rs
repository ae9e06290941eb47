//! Binding Registry
//!
//! One walk over the template that runs the dependency extractor at every
//! binding site and keeps a record for each site that reads data.

use crate::error::Result;
use crate::expression::ast::Expr;
use crate::expression::extractor::{extract_dependencies, resolve_reference, Local};
use crate::path::{Path, PathSegment};
use crate::template::ast::{NodeId, NodeKind, Template};
use crate::template::dom::loop_depth;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum BindingKind {
    Attribute(String),
    Event(String),
    Text,
    ConditionalGuard,
    IteratorSource,
}

/// A node and the binding on it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BindingSite {
    pub node: NodeId,
    pub kind: BindingKind,
}

impl BindingSite {
    pub fn new(node: NodeId, kind: BindingKind) -> Self {
        BindingSite { node, kind }
    }
}

impl fmt::Display for BindingSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BindingKind::Attribute(name) => write!(f, "attribute `{}` of node {}", name, self.node.0),
            BindingKind::Event(name) => write!(f, "`{}` handler of node {}", name, self.node.0),
            BindingKind::Text => write!(f, "text node {}", self.node.0),
            BindingKind::ConditionalGuard => write!(f, "condition of node {}", self.node.0),
            BindingKind::IteratorSource => write!(f, "loop source of node {}", self.node.0),
        }
    }
}

/// A binding site and the data paths its expression reads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyRecord {
    pub site: BindingSite,
    /// The expression with every data reference rooted at the data root
    pub expression: Expr,
    pub paths: Vec<Path>,
}

/// Result of a registry walk
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    records: Vec<DependencyRecord>,
    expressions: IndexMap<BindingSite, Expr>,
    locals: IndexMap<NodeId, Local>,
}

impl BindingRegistry {
    /// Walks `template` in document order. A conditional's else branch is
    /// visited right after the conditional root's own subtree.
    pub fn build(template: &Template, globals: &HashSet<String>) -> Result<Self> {
        let mut registry = BindingRegistry::default();
        let mut locals = Vec::new();
        registry.visit(template, template.root, globals, &mut locals)?;
        Ok(registry)
    }

    pub fn records(&self) -> &[DependencyRecord] {
        &self.records
    }

    /// The rewritten expression at `site`, whether or not it reads data
    pub fn expression_for(&self, site: &BindingSite) -> Option<&Expr> {
        self.expressions.get(site)
    }

    pub fn record_for(&self, site: &BindingSite) -> Option<&DependencyRecord> {
        self.records.iter().find(|record| &record.site == site)
    }

    /// The loop alias introduced by iterator root `node`
    pub fn local_for(&self, node: NodeId) -> Option<&Local> {
        self.locals.get(&node)
    }

    /// Every distinct path read anywhere in the template
    pub fn dependencies(&self) -> Vec<Path> {
        let mut paths: Vec<Path> = Vec::new();
        for path in self.records.iter().flat_map(|r| r.paths.iter()) {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }

    fn insert(
        &mut self,
        site: BindingSite,
        expr: &Expr,
        locals: &[Local],
        globals: &HashSet<String>,
    ) -> Result<()> {
        if self.expressions.contains_key(&site) {
            return Ok(());
        }
        let extraction = extract_dependencies(expr, locals, globals, &site.to_string())?;
        self.expressions
            .insert(site.clone(), extraction.expression.clone());
        if !extraction.paths.is_empty() {
            self.records.push(DependencyRecord {
                site,
                expression: extraction.expression,
                paths: extraction.paths,
            });
        }
        Ok(())
    }

    fn visit(
        &mut self,
        template: &Template,
        id: NodeId,
        globals: &HashSet<String>,
        locals: &mut Vec<Local>,
    ) -> Result<()> {
        match &template.node(id).kind {
            NodeKind::Text(text) => {
                if let Some(value) = &text.value {
                    self.insert(BindingSite::new(id, BindingKind::Text), value, locals, globals)?;
                }
                return Ok(());
            }
            NodeKind::Comment(_) => return Ok(()),
            NodeKind::Element(_) => {}
        }
        let element = match template.element(id) {
            Some(element) => element,
            None => return Ok(()),
        };
        if element.is_slot() {
            return Ok(());
        }

        if let (true, Some(condition)) = (element.is_conditional_root(), &element.condition) {
            let site = BindingSite::new(id, BindingKind::ConditionalGuard);
            self.insert(site, condition, locals, globals)?;
        }
        let mut introduced = None;
        if let (true, Some(iteration)) = (element.is_iterator_root(), &element.iteration) {
            let site = BindingSite::new(id, BindingKind::IteratorSource);
            self.insert(site, &iteration.subject, locals, globals)?;

            let depth = loop_depth(template, id);
            let path = resolve_reference(&iteration.subject, locals, globals)
                .map(|source| source.with(PathSegment::marker(iteration.variable.clone(), depth)));
            let local = Local::new(iteration.variable.clone(), depth, path);
            self.locals.insert(id, local.clone());
            introduced = Some(local);
        }
        for (name, value) in &element.dynamic_attributes {
            let site = BindingSite::new(id, BindingKind::Attribute(name.clone()));
            self.insert(site, value, locals, globals)?;
        }
        for event in &element.events {
            if event.exists_on_component {
                continue;
            }
            let site = BindingSite::new(id, BindingKind::Event(event.event.clone()));
            self.insert(site, &event.handler, locals, globals)?;
        }

        let pushed = introduced.is_some();
        if let Some(local) = introduced {
            locals.push(local);
        }
        let children = template.children(id).to_vec();
        let walked = children
            .into_iter()
            .try_for_each(|child| self.visit(template, child, globals, locals));
        if pushed {
            locals.pop();
        }
        walked?;

        if let (true, Some(else_node)) = (element.is_conditional_root(), element.else_node) {
            self.visit(template, else_node, globals, locals)?;
        }
        Ok(())
    }
}
