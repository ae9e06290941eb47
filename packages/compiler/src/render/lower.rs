//! Expression Lowering
//!
//! Translates binding expressions into output AST. The two backends differ
//! only in what the data root lowers to.

use crate::error::{CompileError, Result};
use crate::expression::ast::{self as ast, Expr, TemplatePart};
use crate::output::output_ast as o;

/// `this.data`, the data root seen by client code
pub fn client_data_root() -> o::Expression {
    o::this_expr().prop("data")
}

/// `data`, the data root seen by the server renderer
pub fn server_data_root() -> o::Expression {
    o::variable("data")
}

fn binary_operator(op: ast::BinaryOperator) -> o::BinaryOperator {
    use ast::BinaryOperator as B;
    match op {
        B::Plus => o::BinaryOperator::Plus,
        B::Minus => o::BinaryOperator::Minus,
        B::Multiply => o::BinaryOperator::Multiply,
        B::Divide => o::BinaryOperator::Divide,
        B::Modulo => o::BinaryOperator::Modulo,
        B::Equals => o::BinaryOperator::Equals,
        B::NotEquals => o::BinaryOperator::NotEquals,
        B::Identical => o::BinaryOperator::Identical,
        B::NotIdentical => o::BinaryOperator::NotIdentical,
        B::Lower => o::BinaryOperator::Lower,
        B::LowerEquals => o::BinaryOperator::LowerEquals,
        B::Bigger => o::BinaryOperator::Bigger,
        B::BiggerEquals => o::BinaryOperator::BiggerEquals,
        B::And => o::BinaryOperator::And,
        B::Or => o::BinaryOperator::Or,
        B::NullishCoalesce => o::BinaryOperator::NullishCoalesce,
        B::Assign => o::BinaryOperator::Assign,
    }
}

fn unary_operator(op: ast::UnaryOperator) -> o::UnaryOperator {
    match op {
        ast::UnaryOperator::Not => o::UnaryOperator::Not,
        ast::UnaryOperator::Minus => o::UnaryOperator::Minus,
        ast::UnaryOperator::Plus => o::UnaryOperator::Plus,
        ast::UnaryOperator::Typeof => o::UnaryOperator::Typeof,
    }
}

pub fn lower_literal(value: &ast::LiteralValue) -> o::Expression {
    match value {
        ast::LiteralValue::Null => o::null_expr(),
        ast::LiteralValue::Bool(b) => o::literal(*b),
        ast::LiteralValue::Number(n) => o::literal(*n),
        ast::LiteralValue::String(s) => o::literal(s.as_str()),
    }
}

/// Lowers `expr`, printing [`Expr::DataRoot`] as `data_root`
pub fn lower_expr(expr: &Expr, data_root: &o::Expression) -> Result<o::Expression> {
    let lower = |e: &Expr| lower_expr(e, data_root);
    let lower_all = |es: &[Expr]| es.iter().map(|e| lower_expr(e, data_root)).collect::<Result<Vec<_>>>();

    Ok(match expr {
        Expr::DataRoot => data_root.clone(),
        Expr::Identifier { name } => o::variable(name.as_str()),
        Expr::Literal { value } => lower_literal(value),
        Expr::Member {
            object,
            property,
            optional,
        } => o::Expression::ReadProp(o::ReadPropExpr {
            receiver: Box::new(lower(object)?),
            name: property.clone(),
            optional: *optional,
        }),
        Expr::Index { object, index } => lower(object)?.key(lower(index)?),
        Expr::Binary { operator, lhs, rhs } => {
            lower(lhs)?.binary(binary_operator(*operator), lower(rhs)?)
        }
        Expr::Unary { operator, operand } => o::Expression::Unary(o::UnaryOperatorExpr {
            operator: unary_operator(*operator),
            expr: Box::new(lower(operand)?),
        }),
        Expr::Call { callee, arguments } => lower(callee)?.call_fn(lower_all(arguments)?),
        Expr::Conditional {
            condition,
            when_true,
            when_false,
        } => lower(condition)?.conditional(lower(when_true)?, lower(when_false)?),
        Expr::TemplateLiteral { parts } => {
            let mut elements = vec![String::new()];
            let mut expressions = Vec::new();
            for part in parts {
                match part {
                    TemplatePart::Text(text) => {
                        if let Some(last) = elements.last_mut() {
                            last.push_str(text);
                        }
                    }
                    TemplatePart::Expr(value) => {
                        expressions.push(lower(value)?);
                        elements.push(String::new());
                    }
                }
            }
            o::Expression::TemplateLiteral(o::TemplateLiteralExpr {
                elements,
                expressions,
            })
        }
        Expr::Object { entries } => o::literal_map(
            entries
                .iter()
                .map(|entry| Ok((entry.key.clone(), lower(&entry.value)?)))
                .collect::<Result<Vec<_>>>()?,
        ),
        Expr::Array { elements } => o::literal_arr(lower_all(elements)?),
        Expr::New { callee, arguments } => o::Expression::Instantiate(o::InstantiateExpr {
            class_expr: Box::new(lower(callee)?),
            args: lower_all(arguments)?,
        }),
        Expr::Function { .. } => {
            return Err(CompileError::UnsupportedConstruct {
                site: "rendered expression".to_string(),
                construct: expr.kind_name().to_string(),
            })
        }
    })
}
