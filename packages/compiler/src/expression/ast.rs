//! Binding Expression AST
//!
//! Already-parsed expressions attached to template bindings. The tree is
//! immutable input: passes that need a different shape build a new tree.

use serde::{Deserialize, Serialize};

/// Literal values that may appear in binding expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::String(s.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(s: String) -> Self {
        LiteralValue::String(s)
    }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self {
        LiteralValue::Number(n)
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Bool(b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Equals,
    NotEquals,
    Identical,
    NotIdentical,
    Lower,
    LowerEquals,
    Bigger,
    BiggerEquals,
    And,
    Or,
    NullishCoalesce,
    Assign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnaryOperator {
    Not,
    Minus,
    Plus,
    Typeof,
}

/// One piece of a template literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub key: String,
    pub value: Expr,
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Expr {
    /// The component's backing data. Never produced by a parser, only by
    /// dependency rewriting.
    DataRoot,
    Identifier {
        name: String,
    },
    Literal {
        value: LiteralValue,
    },
    Member {
        object: Box<Expr>,
        property: String,
        #[serde(default)]
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Binary {
        operator: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        #[serde(default)]
        arguments: Vec<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    TemplateLiteral {
        parts: Vec<TemplatePart>,
    },
    Object {
        entries: Vec<ObjectEntry>,
    },
    Array {
        elements: Vec<Expr>,
    },
    Function {
        params: Vec<String>,
        body: Vec<Statement>,
    },
    New {
        callee: Box<Expr>,
        #[serde(default)]
        arguments: Vec<Expr>,
    },
}

/// Statement node, found in structural positions of computed values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Statement {
    Return {
        value: Option<Expr>,
    },
    Expression {
        expr: Expr,
    },
    If {
        condition: Expr,
        body: Vec<Statement>,
        #[serde(default)]
        otherwise: Vec<Statement>,
    },
    ForOf {
        variable: String,
        subject: Expr,
        body: Vec<Statement>,
    },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Identifier { name: name.into() }
    }

    pub fn literal(value: impl Into<LiteralValue>) -> Expr {
        Expr::Literal {
            value: value.into(),
        }
    }

    /// Builds `a.b.c` from `["a", "b", "c"]`; no parts gives the data root
    pub fn chain(parts: &[&str]) -> Expr {
        match parts.split_first() {
            Some((first, rest)) => rest
                .iter()
                .fold(Expr::ident(*first), |acc, part| acc.member(*part)),
            None => Expr::DataRoot,
        }
    }

    pub fn member(self, property: impl Into<String>) -> Expr {
        Expr::Member {
            object: Box::new(self),
            property: property.into(),
            optional: false,
        }
    }

    pub fn optional_member(self, property: impl Into<String>) -> Expr {
        Expr::Member {
            object: Box::new(self),
            property: property.into(),
            optional: true,
        }
    }

    pub fn index(self, index: Expr) -> Expr {
        Expr::Index {
            object: Box::new(self),
            index: Box::new(index),
        }
    }

    pub fn call(self, arguments: Vec<Expr>) -> Expr {
        Expr::Call {
            callee: Box::new(self),
            arguments,
        }
    }

    pub fn binary(self, operator: BinaryOperator, rhs: Expr) -> Expr {
        Expr::Binary {
            operator,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    /// Name of the node kind, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::DataRoot => "DataRoot",
            Expr::Identifier { .. } => "Identifier",
            Expr::Literal { .. } => "Literal",
            Expr::Member { .. } => "Member",
            Expr::Index { .. } => "Index",
            Expr::Binary { .. } => "Binary",
            Expr::Unary { .. } => "Unary",
            Expr::Call { .. } => "Call",
            Expr::Conditional { .. } => "Conditional",
            Expr::TemplateLiteral { .. } => "TemplateLiteral",
            Expr::Object { .. } => "Object",
            Expr::Array { .. } => "Array",
            Expr::Function { .. } => "Function",
            Expr::New { .. } => "New",
        }
    }

    /// If this is a member chain rooted at an identifier, returns the
    /// identifier followed by each property name.
    ///
    /// `a?.b.c` gives `["a", "b", "c"]`; optional links are flattened.
    pub fn reference_chain(&self) -> Option<Vec<&str>> {
        match self {
            Expr::Identifier { name } => Some(vec![name.as_str()]),
            Expr::Member {
                object, property, ..
            } => {
                let mut chain = object.reference_chain()?;
                chain.push(property.as_str());
                Some(chain)
            }
            _ => None,
        }
    }
}
