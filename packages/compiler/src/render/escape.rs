//! HTML Escaping
//!
//! Server output wraps every interpolated value in a call to the runtime's
//! `escape` function. [`escape_html`] is the same transformation, applied at
//! compile time to static text.

use crate::output::output_ast as o;
use std::borrow::Cow;

pub const ESCAPE_FUNCTION: &str = "escape";

/// Replaces `&`, `<`, `>` and `"` with their entities
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(|c| matches!(c, '&' | '<' | '>' | '"')) {
        return Cow::Borrowed(input);
    }
    let mut escaped = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

fn is_escape_call(expr: &o::Expression) -> bool {
    matches!(expr, o::Expression::InvokeFn(call)
        if matches!(&*call.fn_, o::Expression::ReadVar(v) if v.name == ESCAPE_FUNCTION))
}

/// `escape(expr)`, unless `expr` already is such a call
pub fn escape_call(expr: o::Expression) -> o::Expression {
    if is_escape_call(&expr) {
        expr
    } else {
        o::variable(ESCAPE_FUNCTION).call_fn(vec![expr])
    }
}
