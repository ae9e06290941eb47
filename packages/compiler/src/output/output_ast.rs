//! Output AST Module
//!
//! Abstract function bodies produced by the backends and handed to a
//! pretty-printer.

use serde::Serialize;

//// Types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuiltinTypeName {
    Dynamic,
    Bool,
    String,
    Number,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Type {
    Builtin(BuiltinTypeName),
}

pub fn dynamic_type() -> Type {
    Type::Builtin(BuiltinTypeName::Dynamic)
}

pub fn string_type() -> Type {
    Type::Builtin(BuiltinTypeName::String)
}

///// Expressions

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOperator {
    Minus,
    Plus,
    Not,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    Assign,
    Identical,
    NotIdentical,
    Minus,
    Plus,
    Divide,
    Multiply,
    Modulo,
    And,
    Or,
    Lower,
    LowerEquals,
    Bigger,
    BiggerEquals,
    NullishCoalesce,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    ReadVar(ReadVarExpr),
    ReadProp(ReadPropExpr),
    ReadKey(ReadKeyExpr),
    WriteProp(WritePropExpr),
    Literal(LiteralExpr),
    LiteralArray(LiteralArrayExpr),
    LiteralMap(LiteralMapExpr),
    TemplateLiteral(TemplateLiteralExpr),
    InvokeFn(InvokeFunctionExpr),
    Instantiate(InstantiateExpr),
    Conditional(ConditionalExpr),
    BinaryOp(BinaryOperatorExpr),
    Unary(UnaryOperatorExpr),
    Fn(FunctionExpr),
    ArrowFn(ArrowFunctionExpr),
    Spread(SpreadExpr),
    Yield(YieldExpr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadVarExpr {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadPropExpr {
    pub receiver: Box<Expression>,
    pub name: String,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadKeyExpr {
    pub receiver: Box<Expression>,
    pub index: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WritePropExpr {
    pub receiver: Box<Expression>,
    pub name: String,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteralExpr {
    pub value: LiteralValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    Null,
    String(String),
    Number(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteralArrayExpr {
    pub entries: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteralMapEntry {
    pub key: String,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteralMapExpr {
    pub entries: Vec<LiteralMapEntry>,
}

/// `elements` always holds one more entry than `expressions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateLiteralExpr {
    pub elements: Vec<String>,
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvokeFunctionExpr {
    pub fn_: Box<Expression>,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstantiateExpr {
    pub class_expr: Box<Expression>,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalExpr {
    pub condition: Box<Expression>,
    pub true_case: Box<Expression>,
    pub false_case: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryOperatorExpr {
    pub operator: BinaryOperator,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnaryOperatorExpr {
    pub operator: UnaryOperator,
    pub expr: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FnParam {
    pub name: String,
    pub type_: Option<Type>,
}

impl FnParam {
    pub fn new(name: impl Into<String>) -> Self {
        FnParam {
            name: name.into(),
            type_: None,
        }
    }

    pub fn typed(name: impl Into<String>, type_: Type) -> Self {
        FnParam {
            name: name.into(),
            type_: Some(type_),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionExpr {
    pub name: Option<String>,
    pub params: Vec<FnParam>,
    pub statements: Vec<Statement>,
    pub is_generator: bool,
    pub type_: Option<Type>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowFunctionExpr {
    pub params: Vec<FnParam>,
    pub body: ArrowFunctionBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArrowFunctionBody {
    Expression(Box<Expression>),
    Statements(Vec<Statement>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadExpr {
    pub expr: Box<Expression>,
}

/// `yield expr`, or `yield* expr` when `delegate` is set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldExpr {
    pub expr: Box<Expression>,
    pub delegate: bool,
}

///// Statements

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    DeclareFn(DeclareFunctionStmt),
    Expression(ExpressionStatement),
    Return(ReturnStatement),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclareFunctionStmt {
    pub name: String,
    pub params: Vec<FnParam>,
    pub statements: Vec<Statement>,
    pub is_generator: bool,
    pub type_: Option<Type>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionStatement {
    pub expr: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnStatement {
    pub value: Box<Expression>,
}

// Helper functions for creating common expressions
pub fn variable(name: impl Into<String>) -> Expression {
    Expression::ReadVar(ReadVarExpr { name: name.into() })
}

pub fn literal(value: impl Into<LiteralValue>) -> Expression {
    Expression::Literal(LiteralExpr {
        value: value.into(),
    })
}

pub fn literal_arr(values: Vec<Expression>) -> Expression {
    Expression::LiteralArray(LiteralArrayExpr { entries: values })
}

pub fn literal_map(entries: Vec<(String, Expression)>) -> Expression {
    Expression::LiteralMap(LiteralMapExpr {
        entries: entries
            .into_iter()
            .map(|(key, value)| LiteralMapEntry {
                key,
                value: Box::new(value),
            })
            .collect(),
    })
}

pub fn not(expr: Expression) -> Expression {
    Expression::Unary(UnaryOperatorExpr {
        operator: UnaryOperator::Not,
        expr: Box::new(expr),
    })
}

pub fn spread(expr: Expression) -> Expression {
    Expression::Spread(SpreadExpr {
        expr: Box::new(expr),
    })
}

pub fn arrow_fn(params: Vec<FnParam>, body: ArrowFunctionBody) -> Expression {
    Expression::ArrowFn(ArrowFunctionExpr { params, body })
}

/// `(params) => body`
pub fn arrow_fn_expr(params: Vec<FnParam>, body: Expression) -> Expression {
    arrow_fn(params, ArrowFunctionBody::Expression(Box::new(body)))
}

pub fn null_expr() -> Expression {
    literal(LiteralValue::Null)
}

/// The `0` passed where an optional argument is absent
pub fn falsy_sentinel() -> Expression {
    literal(0.0)
}

/// `this`
pub fn this_expr() -> Expression {
    variable("this")
}

// Implement conversions
impl From<String> for LiteralValue {
    fn from(s: String) -> Self {
        LiteralValue::String(s)
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::String(s.to_string())
    }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self {
        LiteralValue::Number(n)
    }
}

impl From<usize> for LiteralValue {
    fn from(n: usize) -> Self {
        LiteralValue::Number(n as f64)
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Bool(b)
    }
}

impl Expression {
    pub fn prop(self, name: impl Into<String>) -> Expression {
        Expression::ReadProp(ReadPropExpr {
            receiver: Box::new(self),
            name: name.into(),
            optional: false,
        })
    }

    pub fn key(self, index: Expression) -> Expression {
        Expression::ReadKey(ReadKeyExpr {
            receiver: Box::new(self),
            index: Box::new(index),
        })
    }

    pub fn call_fn(self, params: Vec<Expression>) -> Expression {
        Expression::InvokeFn(InvokeFunctionExpr {
            fn_: Box::new(self),
            args: params,
        })
    }

    pub fn conditional(self, true_case: Expression, false_case: Expression) -> Expression {
        Expression::Conditional(ConditionalExpr {
            condition: Box::new(self),
            true_case: Box::new(true_case),
            false_case: Box::new(false_case),
        })
    }

    pub fn binary(self, operator: BinaryOperator, rhs: Expression) -> Expression {
        Expression::BinaryOp(BinaryOperatorExpr {
            operator,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        })
    }

    pub fn plus(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Plus, rhs)
    }

    pub fn set_prop(self, name: impl Into<String>, value: Expression) -> Expression {
        Expression::WriteProp(WritePropExpr {
            receiver: Box::new(self),
            name: name.into(),
            value: Box::new(value),
        })
    }

    pub fn to_stmt(self) -> Statement {
        Statement::Expression(ExpressionStatement {
            expr: Box::new(self),
        })
    }

    pub fn to_yield(self, delegate: bool) -> Expression {
        Expression::Yield(YieldExpr {
            expr: Box::new(self),
            delegate,
        })
    }

    pub fn is_falsy_sentinel(&self) -> bool {
        matches!(
            self,
            Expression::Literal(LiteralExpr {
                value: LiteralValue::Number(n)
            }) if *n == 0.0
        )
    }

    /// The string value of a string literal
    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Expression::Literal(LiteralExpr {
                value: LiteralValue::String(s),
            }) => Some(s),
            _ => None,
        }
    }
}

impl Statement {
    pub fn return_stmt(value: Expression) -> Statement {
        Statement::Return(ReturnStatement {
            value: Box::new(value),
        })
    }
}
