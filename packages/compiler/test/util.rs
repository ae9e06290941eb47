//! Test Utilities
//!
//! Compile helpers and a node-shape model used to compare what the two
//! backends render.

#![allow(dead_code)]

use twinrender_compiler::output::output_ast as o;
use twinrender_compiler::template::Template;
use twinrender_compiler::{compile_component, CompiledComponent, CompilerConfig, ComponentSource};

pub fn minified() -> CompilerConfig {
    CompilerConfig::minified()
}

/// Compiles `template` with no globals and minified output
pub fn compile(template: Template) -> CompiledComponent {
    compile_with(template, &[], &minified())
}

pub fn compile_with(template: Template, globals: &[&str], config: &CompilerConfig) -> CompiledComponent {
    let mut source = ComponentSource::new("test-component", template);
    source.globals = globals.iter().map(|g| g.to_string()).collect();
    compile_component(&source, config).expect("template should compile")
}

pub fn client(component: &CompiledComponent) -> String {
    component.client_source(&minified())
}

pub fn server(component: &CompiledComponent) -> String {
    component.server_source(&minified())
}

pub fn mapping(component: &CompiledComponent) -> String {
    component.mapping_source(&minified())
}

/// Rendered structure, independent of how it was produced
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Element {
        tag: String,
        attributes: Vec<(String, Option<String>)>,
        children: Vec<Shape>,
    },
    Text(String),
    Comment(String),
}

fn string_literal(expr: &o::Expression) -> Option<String> {
    match expr {
        o::Expression::Literal(o::LiteralExpr {
            value: o::LiteralValue::String(s),
        }) => Some(s.clone()),
        _ => None,
    }
}

fn client_node(expr: &o::Expression) -> Shape {
    if let Some(text) = string_literal(expr) {
        return Shape::Text(text);
    }
    let call = match expr {
        o::Expression::InvokeFn(call) => call,
        other => panic!("not a static render expression: {:?}", other),
    };
    let callee = match &*call.fn_ {
        o::Expression::ReadVar(var) => var.name.as_str(),
        other => panic!("unexpected callee: {:?}", other),
    };
    match callee {
        "createComment" => Shape::Comment(call.args.first().and_then(string_literal).unwrap_or_default()),
        "h" => {
            let tag = string_literal(&call.args[0]).expect("tag name");
            let attributes = match call.args.get(1) {
                Some(o::Expression::LiteralMap(map)) => map
                    .entries
                    .iter()
                    .map(|entry| {
                        let value = match &*entry.value {
                            o::Expression::Literal(o::LiteralExpr {
                                value: o::LiteralValue::Bool(true),
                            }) => None,
                            other => Some(string_literal(other).expect("static attribute value")),
                        };
                        (entry.key.clone(), value)
                    })
                    .collect(),
                _ => Vec::new(),
            };
            let children = call.args.iter().skip(3).map(client_node).collect();
            Shape::Element {
                tag,
                attributes,
                children,
            }
        }
        other => panic!("unexpected call to {}", other),
    }
}

/// Shapes yielded by a client render generator built from static markup
pub fn client_shapes(render: &o::Statement) -> Vec<Shape> {
    let decl = match render {
        o::Statement::DeclareFn(decl) => decl,
        other => panic!("not a function declaration: {:?}", other),
    };
    decl.statements
        .iter()
        .map(|statement| match statement {
            o::Statement::Expression(stmt) => match &*stmt.expr {
                o::Expression::Yield(y) => client_node(&y.expr),
                other => panic!("not a yield: {:?}", other),
            },
            other => panic!("unexpected statement: {:?}", other),
        })
        .collect()
}

/// The markup returned by a server render function built from static markup
pub fn server_markup(render: &o::Statement) -> String {
    let decl = match render {
        o::Statement::DeclareFn(decl) => decl,
        other => panic!("not a function declaration: {:?}", other),
    };
    match decl.statements.as_slice() {
        [o::Statement::Return(ret)] => string_literal(&ret.value).expect("a single string literal"),
        other => panic!("unexpected body: {:?}", other),
    }
}

const VOID_TAGS: &[&str] = &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

struct MarkupReader<'a> {
    rest: &'a str,
}

impl<'a> MarkupReader<'a> {
    fn take_until(&mut self, stop: impl Fn(char) -> bool) -> &'a str {
        let end = self.rest.find(stop).unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    fn skip(&mut self, prefix: &str) {
        assert!(self.rest.starts_with(prefix), "expected `{}` at `{}`", prefix, self.rest);
        self.rest = &self.rest[prefix.len()..];
    }

    fn nodes(&mut self) -> Vec<Shape> {
        let mut nodes = Vec::new();
        while !self.rest.is_empty() && !self.rest.starts_with("</") {
            if self.rest.starts_with("<!--") {
                self.skip("<!--");
                let end = self.rest.find("-->").expect("unterminated comment");
                nodes.push(Shape::Comment(self.rest[..end].to_string()));
                self.rest = &self.rest[end + 3..];
            } else if self.rest.starts_with('<') {
                nodes.push(self.element());
            } else {
                nodes.push(Shape::Text(unescape(self.take_until(|c| c == '<'))));
            }
        }
        nodes
    }

    fn element(&mut self) -> Shape {
        self.skip("<");
        let tag = self.take_until(|c| c == ' ' || c == '>').to_string();
        let mut attributes = Vec::new();
        loop {
            self.rest = self.rest.trim_start();
            if self.rest.starts_with('>') {
                self.skip(">");
                break;
            }
            let name = self.take_until(|c| c == '=' || c == ' ' || c == '>').to_string();
            let value = if self.rest.starts_with('=') {
                self.skip("=\"");
                let value = unescape(self.take_until(|c| c == '"'));
                self.skip("\"");
                Some(value)
            } else {
                None
            };
            attributes.push((name, value));
        }
        let children = if VOID_TAGS.contains(&tag.as_str()) {
            Vec::new()
        } else {
            let children = self.nodes();
            self.skip("</");
            self.skip(&tag);
            self.skip(">");
            children
        };
        Shape::Element {
            tag,
            attributes,
            children,
        }
    }
}

/// Parses the static markup produced by the server backend
pub fn markup_shapes(markup: &str) -> Vec<Shape> {
    MarkupReader { rest: markup }.nodes()
}
