//! Abstract Emitter Module
//!
//! Prints output AST as JavaScript, or TypeScript when `print_types` is set.
//! With `minify` all optional whitespace is left out.

use crate::output::output_ast as o;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

const INDENT_WITH: &str = "  ";

static LEGAL_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_$][0-9a-zA-Z_$]*$").unwrap());

lazy_static::lazy_static! {
    pub static ref BINARY_OPERATORS: HashMap<o::BinaryOperator, &'static str> = {
        let mut m = HashMap::new();
        m.insert(o::BinaryOperator::And, "&&");
        m.insert(o::BinaryOperator::Bigger, ">");
        m.insert(o::BinaryOperator::BiggerEquals, ">=");
        m.insert(o::BinaryOperator::Divide, "/");
        m.insert(o::BinaryOperator::Assign, "=");
        m.insert(o::BinaryOperator::Equals, "==");
        m.insert(o::BinaryOperator::Identical, "===");
        m.insert(o::BinaryOperator::Lower, "<");
        m.insert(o::BinaryOperator::LowerEquals, "<=");
        m.insert(o::BinaryOperator::Minus, "-");
        m.insert(o::BinaryOperator::Modulo, "%");
        m.insert(o::BinaryOperator::Multiply, "*");
        m.insert(o::BinaryOperator::NotEquals, "!=");
        m.insert(o::BinaryOperator::NotIdentical, "!==");
        m.insert(o::BinaryOperator::NullishCoalesce, "??");
        m.insert(o::BinaryOperator::Or, "||");
        m.insert(o::BinaryOperator::Plus, "+");
        m
    };
}

#[derive(Debug, Clone)]
struct EmittedLine {
    parts: Vec<String>,
    indent: usize,
}

impl EmittedLine {
    fn new(indent: usize) -> Self {
        EmittedLine {
            parts: Vec::new(),
            indent,
        }
    }
}

pub struct EmitterVisitorContext {
    lines: Vec<EmittedLine>,
    indent: usize,
}

impl EmitterVisitorContext {
    pub fn create_root() -> Self {
        EmitterVisitorContext {
            lines: vec![EmittedLine::new(0)],
            indent: 0,
        }
    }

    fn current_line_mut(&mut self) -> &mut EmittedLine {
        if self.lines.is_empty() {
            self.lines.push(EmittedLine::new(self.indent));
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    pub fn line_is_empty(&self) -> bool {
        self.lines.last().map_or(true, |l| l.parts.is_empty())
    }

    pub fn print(&mut self, part: &str, new_line: bool) {
        if !part.is_empty() {
            self.current_line_mut().parts.push(part.to_string());
        }
        if new_line {
            self.lines.push(EmittedLine::new(self.indent));
        }
    }

    pub fn println(&mut self, last_part: &str) {
        self.print(last_part, true);
    }

    pub fn inc_indent(&mut self) {
        self.indent += 1;
        if self.line_is_empty() {
            let indent = self.indent;
            self.current_line_mut().indent = indent;
        }
    }

    pub fn dec_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        if self.line_is_empty() {
            let indent = self.indent;
            self.current_line_mut().indent = indent;
        }
    }

    pub fn to_source(&self) -> String {
        let mut lines: Vec<&EmittedLine> = self.lines.iter().collect();
        while lines.last().map_or(false, |l| l.parts.is_empty()) {
            lines.pop();
        }
        lines
            .iter()
            .map(|l| {
                if l.parts.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", INDENT_WITH.repeat(l.indent), l.parts.join(""))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Escape identifier for safe use in generated code
pub fn escape_identifier(input: &str, escape_dollar: bool, always_quote: bool) -> String {
    if input.is_empty() {
        return "''".to_string();
    }
    if !always_quote && LEGAL_IDENTIFIER_RE.is_match(input) {
        return input.to_string();
    }

    let mut escaped = input.replace('\\', "\\\\");
    escaped = escaped.replace('\'', "\\'");
    escaped = escaped.replace('\n', "\\n");
    escaped = escaped.replace('\r', "\\r");
    if escape_dollar {
        escaped = escaped.replace('$', "\\$");
    }

    format!("'{}'", escaped)
}

fn escape_template_text(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

/// JavaScript number formatting for the values the backends produce
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

const PRIMARY: u8 = 20;
const MEMBER: u8 = 19;
const UNARY: u8 = 15;
const ASSIGNMENT: u8 = 2;

fn binary_precedence(op: o::BinaryOperator) -> u8 {
    use o::BinaryOperator::*;
    match op {
        Multiply | Divide | Modulo => 13,
        Plus | Minus => 12,
        Lower | LowerEquals | Bigger | BiggerEquals => 10,
        Equals | NotEquals | Identical | NotIdentical => 9,
        And => 5,
        Or | NullishCoalesce => 4,
        Assign => ASSIGNMENT,
    }
}

fn precedence(expr: &o::Expression) -> u8 {
    match expr {
        o::Expression::ReadVar(_)
        | o::Expression::Literal(_)
        | o::Expression::LiteralArray(_)
        | o::Expression::LiteralMap(_)
        | o::Expression::TemplateLiteral(_)
        // conditionals are always printed inside parentheses
        | o::Expression::Conditional(_) => PRIMARY,
        o::Expression::ReadProp(_)
        | o::Expression::ReadKey(_)
        | o::Expression::InvokeFn(_)
        | o::Expression::Instantiate(_) => MEMBER,
        o::Expression::Unary(_) => UNARY,
        o::Expression::BinaryOp(b) => binary_precedence(b.operator),
        o::Expression::WriteProp(_)
        | o::Expression::ArrowFn(_)
        | o::Expression::Fn(_)
        | o::Expression::Yield(_) => ASSIGNMENT,
        o::Expression::Spread(_) => 1,
    }
}

/// Abstract base emitter visitor
pub struct AbstractEmitterVisitor {
    pub print_types: bool,
    pub minify: bool,
}

impl AbstractEmitterVisitor {
    pub fn new(print_types: bool, minify: bool) -> Self {
        AbstractEmitterVisitor { print_types, minify }
    }

    fn comma(&self) -> &'static str {
        if self.minify {
            ","
        } else {
            ", "
        }
    }

    fn spaced(&self, token: &str) -> String {
        if self.minify {
            token.to_string()
        } else {
            format!(" {} ", token)
        }
    }

    pub fn visit_all_statements(&mut self, statements: &[o::Statement], ctx: &mut EmitterVisitorContext) {
        for statement in statements {
            self.visit_statement(statement, ctx);
            let terminator = statement_terminator(statement);
            if self.minify {
                ctx.print(terminator, false);
            } else {
                ctx.println(terminator);
            }
        }
    }

    pub fn visit_statement(&mut self, stmt: &o::Statement, ctx: &mut EmitterVisitorContext) {
        match stmt {
            o::Statement::DeclareFn(decl) => {
                ctx.print(if decl.is_generator { "function* " } else { "function " }, false);
                ctx.print(&decl.name, false);
                self.visit_params(&decl.params, ctx);
                self.visit_return_type(decl.type_.as_ref(), ctx);
                if !self.minify {
                    ctx.print(" ", false);
                }
                self.visit_block(&decl.statements, ctx);
            }
            o::Statement::Expression(stmt) => self.visit_expression(&stmt.expr, ctx),
            o::Statement::Return(stmt) => {
                ctx.print("return ", false);
                self.visit_expression(&stmt.value, ctx);
            }
        }
    }

    fn visit_block(&mut self, statements: &[o::Statement], ctx: &mut EmitterVisitorContext) {
        if self.minify {
            ctx.print("{", false);
            for (i, statement) in statements.iter().enumerate() {
                if i > 0 {
                    ctx.print(";", false);
                }
                self.visit_statement(statement, ctx);
            }
            ctx.print("}", false);
            return;
        }
        ctx.println("{");
        ctx.inc_indent();
        for statement in statements {
            self.visit_statement(statement, ctx);
            ctx.println(statement_terminator(statement));
        }
        ctx.dec_indent();
        ctx.print("}", false);
    }

    fn visit_params(&mut self, params: &[o::FnParam], ctx: &mut EmitterVisitorContext) {
        ctx.print("(", false);
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                ctx.print(self.comma(), false);
            }
            ctx.print(&escape_identifier(&param.name, false, false), false);
            if let (true, Some(type_)) = (self.print_types, &param.type_) {
                ctx.print(": ", false);
                ctx.print(type_name(type_), false);
            }
        }
        ctx.print(")", false);
    }

    fn visit_return_type(&mut self, type_: Option<&o::Type>, ctx: &mut EmitterVisitorContext) {
        if let (true, Some(type_)) = (self.print_types, type_) {
            ctx.print(": ", false);
            ctx.print(type_name(type_), false);
        }
    }

    fn visit_operand(&mut self, expr: &o::Expression, parens: bool, ctx: &mut EmitterVisitorContext) {
        if parens {
            ctx.print("(", false);
        }
        self.visit_expression(expr, ctx);
        if parens {
            ctx.print(")", false);
        }
    }

    fn visit_args(&mut self, args: &[o::Expression], ctx: &mut EmitterVisitorContext) {
        ctx.print("(", false);
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                ctx.print(self.comma(), false);
            }
            self.visit_expression(arg, ctx);
        }
        ctx.print(")", false);
    }

    pub fn visit_expression(&mut self, expr: &o::Expression, ctx: &mut EmitterVisitorContext) {
        match expr {
            o::Expression::ReadVar(e) => ctx.print(&escape_identifier(&e.name, false, false), false),
            o::Expression::ReadProp(e) => self.visit_read_prop_expr(e, ctx),
            o::Expression::ReadKey(e) => {
                self.visit_operand(&e.receiver, precedence(&e.receiver) < MEMBER, ctx);
                ctx.print("[", false);
                self.visit_expression(&e.index, ctx);
                ctx.print("]", false);
            }
            o::Expression::WriteProp(e) => {
                self.visit_operand(&e.receiver, precedence(&e.receiver) < MEMBER, ctx);
                ctx.print(".", false);
                ctx.print(&e.name, false);
                ctx.print(&self.spaced("="), false);
                self.visit_expression(&e.value, ctx);
            }
            o::Expression::Literal(e) => self.visit_literal_expr(e, ctx),
            o::Expression::LiteralArray(e) => {
                ctx.print("[", false);
                for (i, entry) in e.entries.iter().enumerate() {
                    if i > 0 {
                        ctx.print(self.comma(), false);
                    }
                    self.visit_expression(entry, ctx);
                }
                ctx.print("]", false);
            }
            o::Expression::LiteralMap(e) => self.visit_literal_map_expr(e, ctx),
            o::Expression::TemplateLiteral(e) => {
                ctx.print("`", false);
                for (i, element) in e.elements.iter().enumerate() {
                    ctx.print(&escape_template_text(element), false);
                    if let Some(expression) = e.expressions.get(i) {
                        ctx.print("${", false);
                        self.visit_expression(expression, ctx);
                        ctx.print("}", false);
                    }
                }
                ctx.print("`", false);
            }
            o::Expression::InvokeFn(e) => {
                let parens = matches!(*e.fn_, o::Expression::ArrowFn(_) | o::Expression::Fn(_))
                    || precedence(&e.fn_) < MEMBER;
                self.visit_operand(&e.fn_, parens, ctx);
                self.visit_args(&e.args, ctx);
            }
            o::Expression::Instantiate(e) => {
                ctx.print("new ", false);
                self.visit_operand(&e.class_expr, precedence(&e.class_expr) < MEMBER, ctx);
                self.visit_args(&e.args, ctx);
            }
            o::Expression::Conditional(e) => {
                ctx.print("(", false);
                self.visit_expression(&e.condition, ctx);
                ctx.print(&self.spaced("?"), false);
                self.visit_expression(&e.true_case, ctx);
                ctx.print(&self.spaced(":"), false);
                self.visit_expression(&e.false_case, ctx);
                ctx.print(")", false);
            }
            o::Expression::BinaryOp(e) => self.visit_binary_operator_expr(e, ctx),
            o::Expression::Unary(e) => {
                let op = match e.operator {
                    o::UnaryOperator::Minus => "-",
                    o::UnaryOperator::Plus => "+",
                    o::UnaryOperator::Not => "!",
                    o::UnaryOperator::Typeof => "typeof ",
                };
                ctx.print(op, false);
                self.visit_operand(&e.expr, precedence(&e.expr) < UNARY, ctx);
            }
            o::Expression::Fn(e) => {
                ctx.print(if e.is_generator { "function*" } else { "function" }, false);
                if let Some(name) = &e.name {
                    ctx.print(" ", false);
                    ctx.print(name, false);
                } else if !self.minify {
                    ctx.print(" ", false);
                }
                self.visit_params(&e.params, ctx);
                self.visit_return_type(e.type_.as_ref(), ctx);
                if !self.minify {
                    ctx.print(" ", false);
                }
                self.visit_block(&e.statements, ctx);
            }
            o::Expression::ArrowFn(e) => self.visit_arrow_function_expr(e, ctx),
            o::Expression::Spread(e) => {
                ctx.print("...", false);
                self.visit_operand(&e.expr, precedence(&e.expr) <= ASSIGNMENT, ctx);
            }
            o::Expression::Yield(e) => {
                ctx.print(if e.delegate { "yield* " } else { "yield " }, false);
                self.visit_operand(&e.expr, precedence(&e.expr) < ASSIGNMENT, ctx);
            }
        }
    }

    fn visit_read_prop_expr(&mut self, expr: &o::ReadPropExpr, ctx: &mut EmitterVisitorContext) {
        self.visit_operand(&expr.receiver, precedence(&expr.receiver) < MEMBER, ctx);
        if LEGAL_IDENTIFIER_RE.is_match(&expr.name) {
            ctx.print(if expr.optional { "?." } else { "." }, false);
            ctx.print(&expr.name, false);
        } else {
            ctx.print(if expr.optional { "?.[" } else { "[" }, false);
            ctx.print(&escape_identifier(&expr.name, false, true), false);
            ctx.print("]", false);
        }
    }

    fn visit_literal_expr(&mut self, expr: &o::LiteralExpr, ctx: &mut EmitterVisitorContext) {
        let value_str = match &expr.value {
            o::LiteralValue::Null => "null".to_string(),
            o::LiteralValue::String(s) => escape_identifier(s, false, true),
            o::LiteralValue::Number(n) => format_number(*n),
            o::LiteralValue::Bool(b) => b.to_string(),
        };
        ctx.print(&value_str, false);
    }

    fn visit_literal_map_expr(&mut self, expr: &o::LiteralMapExpr, ctx: &mut EmitterVisitorContext) {
        ctx.print("{", false);
        for (i, entry) in expr.entries.iter().enumerate() {
            if i > 0 {
                ctx.print(self.comma(), false);
            }
            ctx.print(&escape_identifier(&entry.key, false, false), false);
            ctx.print(if self.minify { ":" } else { ": " }, false);
            self.visit_expression(&entry.value, ctx);
        }
        ctx.print("}", false);
    }

    fn visit_binary_operator_expr(
        &mut self,
        expr: &o::BinaryOperatorExpr,
        ctx: &mut EmitterVisitorContext,
    ) {
        let own = binary_precedence(expr.operator);
        let mixes_nullish = |side: &o::Expression| {
            expr.operator == o::BinaryOperator::NullishCoalesce
                && matches!(side, o::Expression::BinaryOp(b)
                    if matches!(b.operator, o::BinaryOperator::And | o::BinaryOperator::Or))
        };
        // assignment is right-associative, everything else left-associative
        let (lhs_parens, rhs_parens) = if expr.operator == o::BinaryOperator::Assign {
            (precedence(&expr.lhs) <= own, precedence(&expr.rhs) < own)
        } else {
            (precedence(&expr.lhs) < own, precedence(&expr.rhs) <= own)
        };
        self.visit_operand(&expr.lhs, lhs_parens || mixes_nullish(&expr.lhs), ctx);
        if let Some(op_str) = BINARY_OPERATORS.get(&expr.operator) {
            ctx.print(&self.spaced(op_str), false);
        }
        self.visit_operand(&expr.rhs, rhs_parens || mixes_nullish(&expr.rhs), ctx);
    }

    fn visit_arrow_function_expr(
        &mut self,
        expr: &o::ArrowFunctionExpr,
        ctx: &mut EmitterVisitorContext,
    ) {
        self.visit_params(&expr.params, ctx);
        ctx.print(&self.spaced("=>"), false);
        match &expr.body {
            o::ArrowFunctionBody::Expression(body) => {
                let parens = matches!(**body, o::Expression::LiteralMap(_))
                    || precedence(body) < ASSIGNMENT;
                self.visit_operand(body, parens, ctx);
            }
            o::ArrowFunctionBody::Statements(statements) => self.visit_block(statements, ctx),
        }
    }
}

fn statement_terminator(statement: &o::Statement) -> &'static str {
    match statement {
        o::Statement::DeclareFn(_) => "",
        _ => ";",
    }
}

fn type_name(type_: &o::Type) -> &'static str {
    match type_ {
        o::Type::Builtin(o::BuiltinTypeName::Dynamic) => "any",
        o::Type::Builtin(o::BuiltinTypeName::Bool) => "boolean",
        o::Type::Builtin(o::BuiltinTypeName::String) => "string",
        o::Type::Builtin(o::BuiltinTypeName::Number) => "number",
    }
}

/// Prints one expression
pub fn emit_expression(expr: &o::Expression, print_types: bool, minify: bool) -> String {
    let mut visitor = AbstractEmitterVisitor::new(print_types, minify);
    let mut ctx = EmitterVisitorContext::create_root();
    visitor.visit_expression(expr, &mut ctx);
    ctx.to_source()
}

/// Prints a list of statements, one per line unless minified
pub fn emit_statements(statements: &[o::Statement], print_types: bool, minify: bool) -> String {
    let mut visitor = AbstractEmitterVisitor::new(print_types, minify);
    let mut ctx = EmitterVisitorContext::create_root();
    visitor.visit_all_statements(statements, &mut ctx);
    ctx.to_source()
}
