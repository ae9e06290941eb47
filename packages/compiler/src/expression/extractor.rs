//! Dependency Extractor
//!
//! Finds the data paths an expression reads and returns a copy of it in which
//! every data reference starts at [`Expr::DataRoot`].
//!
//! A reference is a maximal member chain rooted at an identifier. Its root
//! decides what happens to it:
//! - a global is left alone and not tracked
//! - a loop alias bound to a data path is replaced by that path, with the
//!   loop's marker read through the `$iN` index variable
//! - a loop alias without a data path is left alone and not tracked
//! - anything else is data and gets re-rooted

use crate::error::{CompileError, Result};
use crate::expression::ast::{Expr, ObjectEntry, Statement, TemplatePart};
use crate::path::{chain_from, MarkerTable, Path, PathSegment};
use std::collections::HashSet;

/// A loop alias in scope at a binding site
#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub alias: String,
    /// Nesting depth of the loop that introduced the alias
    pub depth: usize,
    /// Data path of one element of the loop source, ending in the loop's
    /// marker
    pub path: Option<Path>,
}

impl Local {
    pub fn new(alias: impl Into<String>, depth: usize, path: Option<Path>) -> Self {
        Local {
            alias: alias.into(),
            depth,
            path,
        }
    }
}

/// Result of extracting one expression
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Distinct paths, in first-read order
    pub paths: Vec<Path>,
    pub expression: Expr,
}

enum Root<'l> {
    Global,
    Local(&'l Local),
    Data,
}

struct Extractor<'a> {
    locals: Vec<Local>,
    globals: &'a HashSet<String>,
    site: &'a str,
    paths: Vec<Path>,
}

impl<'a> Extractor<'a> {
    fn new(locals: &[Local], globals: &'a HashSet<String>, site: &'a str) -> Self {
        Extractor {
            locals: locals.to_vec(),
            globals,
            site,
            paths: Vec::new(),
        }
    }

    fn classify(&self, name: &str) -> Root<'_> {
        if self.globals.contains(name) {
            return Root::Global;
        }
        match self.locals.iter().rev().find(|local| local.alias == name) {
            Some(local) => Root::Local(local),
            None => Root::Data,
        }
    }

    fn record(&mut self, path: Path) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    fn unsupported(&self, construct: &str) -> CompileError {
        CompileError::UnsupportedConstruct {
            site: self.site.to_string(),
            construct: construct.to_string(),
        }
    }

    /// Rewrites a member chain. `tracked` is how many leading names of the
    /// chain make up the recorded path.
    fn reference(&mut self, expr: &Expr, chain: &[&str], tracked: usize) -> Expr {
        let rest = chain[1..tracked]
            .iter()
            .map(|name| PathSegment::property(*name));
        let (path, replacement) = match self.classify(chain[0]) {
            Root::Global | Root::Local(Local { path: None, .. }) => return expr.clone(),
            Root::Local(Local {
                path: Some(base), ..
            }) => {
                let replacement = chain_from(&MarkerTable::symbolic(), base, Expr::DataRoot);
                let path = Path::from_segments(base.segments().iter().cloned().chain(rest));
                (path, replacement)
            }
            Root::Data => {
                let path = Path::from_segments(
                    std::iter::once(PathSegment::property(chain[0])).chain(rest),
                );
                (path, Expr::DataRoot.member(chain[0]))
            }
        };
        if let Some(path) = path {
            self.record(path);
        }
        reroot(expr, replacement)
    }

    fn expr(&mut self, expr: &Expr) -> Result<Expr> {
        if let Some(chain) = expr.reference_chain() {
            return Ok(self.reference(expr, &chain, chain.len()));
        }

        Ok(match expr {
            Expr::DataRoot | Expr::Literal { .. } | Expr::Identifier { .. } => expr.clone(),
            Expr::Member {
                object,
                property,
                optional,
            } => Expr::Member {
                object: Box::new(self.expr(object)?),
                property: property.clone(),
                optional: *optional,
            },
            Expr::Index { object, index } => {
                let object = match object.reference_chain() {
                    Some(chain) => self.reference(object, &chain, chain.len()),
                    None => self.expr(object)?,
                };
                Expr::Index {
                    object: Box::new(object),
                    index: Box::new(self.expr(index)?),
                }
            }
            Expr::Binary { operator, lhs, rhs } => Expr::Binary {
                operator: *operator,
                lhs: Box::new(self.expr(lhs)?),
                rhs: Box::new(self.expr(rhs)?),
            },
            Expr::Unary { operator, operand } => Expr::Unary {
                operator: *operator,
                operand: Box::new(self.expr(operand)?),
            },
            Expr::Call { callee, arguments } => {
                // `a.b.trim()` reads `a.b`; the method name is not data
                let callee = match callee.reference_chain() {
                    Some(chain) if chain.len() > 1 => {
                        self.reference(callee, &chain, chain.len() - 1)
                    }
                    _ => self.expr(callee)?,
                };
                Expr::Call {
                    callee: Box::new(callee),
                    arguments: self.exprs(arguments)?,
                }
            }
            Expr::Conditional {
                condition,
                when_true,
                when_false,
            } => Expr::Conditional {
                condition: Box::new(self.expr(condition)?),
                when_true: Box::new(self.expr(when_true)?),
                when_false: Box::new(self.expr(when_false)?),
            },
            Expr::TemplateLiteral { parts } => Expr::TemplateLiteral {
                parts: parts
                    .iter()
                    .map(|part| match part {
                        TemplatePart::Text(text) => Ok(TemplatePart::Text(text.clone())),
                        TemplatePart::Expr(value) => Ok(TemplatePart::Expr(self.expr(value)?)),
                    })
                    .collect::<Result<_>>()?,
            },
            Expr::Object { entries } => Expr::Object {
                entries: entries
                    .iter()
                    .map(|entry| {
                        Ok(ObjectEntry {
                            key: entry.key.clone(),
                            value: self.expr(&entry.value)?,
                        })
                    })
                    .collect::<Result<_>>()?,
            },
            Expr::Array { elements } => Expr::Array {
                elements: self.exprs(elements)?,
            },
            Expr::Function { .. } | Expr::New { .. } => {
                return Err(self.unsupported(expr.kind_name()))
            }
        })
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Result<Vec<Expr>> {
        exprs.iter().map(|e| self.expr(e)).collect()
    }

    fn statements(&mut self, statements: &[Statement]) -> Result<Vec<Statement>> {
        statements.iter().map(|s| self.statement(s)).collect()
    }

    fn statement(&mut self, statement: &Statement) -> Result<Statement> {
        Ok(match statement {
            Statement::Return { value } => Statement::Return {
                value: value.as_ref().map(|v| self.expr(v)).transpose()?,
            },
            Statement::Expression { expr } => Statement::Expression {
                expr: self.expr(expr)?,
            },
            Statement::If {
                condition,
                body,
                otherwise,
            } => Statement::If {
                condition: self.expr(condition)?,
                body: self.statements(body)?,
                otherwise: self.statements(otherwise)?,
            },
            Statement::ForOf {
                variable,
                subject,
                body,
            } => {
                let subject = self.expr(subject)?;
                let depth = self.locals.iter().map(|l| l.depth + 1).max().unwrap_or(0);
                // the loop variable is a plain binding inside the statement body
                self.locals.push(Local::new(variable.clone(), depth, None));
                let body = self.statements(body);
                self.locals.pop();
                Statement::ForOf {
                    variable: variable.clone(),
                    subject,
                    body: body?,
                }
            }
        })
    }
}

/// Replaces the root identifier of a member chain, keeping optional links
fn reroot(expr: &Expr, root: Expr) -> Expr {
    match expr {
        Expr::Identifier { .. } => root,
        Expr::Member {
            object,
            property,
            optional,
        } => Expr::Member {
            object: Box::new(reroot(object, root)),
            property: property.clone(),
            optional: *optional,
        },
        other => other.clone(),
    }
}

/// Extracts the data paths read by `expr`.
///
/// `locals` lists the loop aliases in scope, innermost last. `site`
/// describes the binding site for diagnostics.
pub fn extract_dependencies(
    expr: &Expr,
    locals: &[Local],
    globals: &HashSet<String>,
    site: &str,
) -> Result<Extraction> {
    let mut extractor = Extractor::new(locals, globals, site);
    let expression = extractor.expr(expr)?;
    Ok(Extraction {
        paths: extractor.paths,
        expression,
    })
}

/// Statement counterpart of [`extract_dependencies`]
pub fn extract_statement(
    statement: &Statement,
    locals: &[Local],
    globals: &HashSet<String>,
    site: &str,
) -> Result<(Vec<Path>, Statement)> {
    let mut extractor = Extractor::new(locals, globals, site);
    let statement = extractor.statement(statement)?;
    Ok((extractor.paths, statement))
}

/// The data path `expr` reads when it is a bare reference to data.
///
/// Used to give a loop alias the path of its source's elements.
pub fn resolve_reference(expr: &Expr, locals: &[Local], globals: &HashSet<String>) -> Option<Path> {
    let chain = expr.reference_chain()?;
    let extractor = Extractor::new(locals, globals, "");
    let rest = chain[1..].iter().map(|name| PathSegment::property(*name));
    match extractor.classify(chain[0]) {
        Root::Global | Root::Local(Local { path: None, .. }) => None,
        Root::Local(Local {
            path: Some(base), ..
        }) => Path::from_segments(base.segments().iter().cloned().chain(rest)),
        Root::Data => {
            Path::from_segments(std::iter::once(PathSegment::property(chain[0])).chain(rest))
        }
    }
}
