use twinrender_compiler::output::abstract_emitter::{emit_expression, emit_statements, escape_identifier};
use twinrender_compiler::output::output_ast as o;

fn min(expr: &o::Expression) -> String {
    emit_expression(expr, false, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_escape_single_quotes() {
        assert_eq!(escape_identifier("'", false, true), "'\\''");
    }

    #[test]
    fn should_escape_backslash() {
        assert_eq!(escape_identifier("\\", false, true), "'\\\\'");
    }

    #[test]
    fn should_escape_newlines() {
        assert_eq!(escape_identifier("\n", false, true), "'\\n'");
        assert_eq!(escape_identifier("\r", false, true), "'\\r'");
    }

    #[test]
    fn should_escape_dollar_only_when_asked() {
        assert_eq!(escape_identifier("$", true, true), "'\\$'");
        assert_eq!(escape_identifier("$", false, true), "'$'");
    }

    #[test]
    fn should_add_quotes_for_non_identifiers() {
        assert_eq!(escape_identifier("==", false, false), "'=='");
        assert_eq!(escape_identifier("$i0", false, false), "$i0");
    }

    #[test]
    fn should_quote_illegal_property_names() {
        let expr = o::variable("attrs").prop("data-id");
        assert_eq!(min(&expr), "attrs['data-id']");
        let optional = o::Expression::ReadProp(o::ReadPropExpr {
            receiver: Box::new(o::variable("user")),
            name: "name".to_string(),
            optional: true,
        });
        assert_eq!(min(&optional), "user?.name");
    }

    #[test]
    fn should_parenthesize_lower_precedence_operands() {
        let sum = o::variable("a").plus(o::variable("b"));
        let product = sum.binary(o::BinaryOperator::Multiply, o::variable("c"));
        assert_eq!(min(&product), "(a+b)*c");

        let nested = o::variable("x").binary(
            o::BinaryOperator::Minus,
            o::variable("y").binary(o::BinaryOperator::Minus, o::variable("z")),
        );
        assert_eq!(min(&nested), "x-(y-z)");
    }

    #[test]
    fn should_group_nullish_mixed_with_logical_operators() {
        let expr = o::variable("a")
            .binary(o::BinaryOperator::Or, o::variable("b"))
            .binary(o::BinaryOperator::NullishCoalesce, o::variable("c"));
        assert_eq!(min(&expr), "(a||b)??c");
    }

    #[test]
    fn should_chain_assignments_to_the_right() {
        let expr = o::variable("a").binary(
            o::BinaryOperator::Assign,
            o::variable("b").binary(o::BinaryOperator::Assign, o::literal(1.0)),
        );
        assert_eq!(min(&expr), "a=b=1");
    }

    #[test]
    fn should_always_parenthesize_conditionals() {
        let expr = o::variable("ok").conditional(o::literal("yes"), o::literal("no"));
        assert_eq!(min(&expr), "(ok?'yes':'no')");
        assert_eq!(emit_expression(&expr, false, false), "(ok ? 'yes' : 'no')");
    }

    #[test]
    fn should_wrap_object_bodies_of_arrow_functions() {
        let arrow = o::arrow_fn_expr(
            vec![o::FnParam::new("x")],
            o::literal_map(vec![("value".to_string(), o::variable("x"))]),
        );
        assert_eq!(min(&arrow), "(x)=>({value:x})");
        let invoked = arrow.call_fn(vec![o::literal(1.0)]);
        assert_eq!(min(&invoked), "((x)=>({value:x}))(1)");
    }

    #[test]
    fn should_print_template_literals() {
        let expr = o::Expression::TemplateLiteral(o::TemplateLiteralExpr {
            elements: vec!["cost: $".to_string(), " `each`".to_string()],
            expressions: vec![o::variable("price")],
        });
        assert_eq!(min(&expr), "`cost: $${price} \\`each\\``");
    }

    #[test]
    fn should_print_unary_and_instantiation() {
        let negated = o::not(o::variable("a").binary(o::BinaryOperator::And, o::variable("b")));
        assert_eq!(min(&negated), "!(a&&b)");
        let created = o::Expression::Instantiate(o::InstantiateExpr {
            class_expr: Box::new(o::variable("Date")),
            args: vec![o::literal(0.0)],
        });
        assert_eq!(min(&created), "new Date(0)");
    }

    #[test]
    fn should_print_spread_and_yield() {
        let spread = o::spread(o::variable("items").prop("map").call_fn(vec![]));
        assert_eq!(min(&spread), "...items.map()");
        let delegated = o::variable("rest").to_yield(true);
        assert_eq!(min(&delegated), "yield* rest");
    }

    #[test]
    fn should_print_numbers_like_javascript() {
        assert_eq!(min(&o::literal(3.0)), "3");
        assert_eq!(min(&o::literal(2.5)), "2.5");
        assert_eq!(min(&o::literal(7usize)), "7");
    }

    #[test]
    fn should_separate_statements() {
        let statements = vec![
            o::variable("a").call_fn(vec![]).to_stmt(),
            o::variable("b").call_fn(vec![]).to_stmt(),
        ];
        assert_eq!(emit_statements(&statements, false, true), "a();b();");
        assert_eq!(emit_statements(&statements, false, false), "a();\nb();");
    }

    #[test]
    fn should_print_typed_function_declarations() {
        let decl = o::Statement::DeclareFn(o::DeclareFunctionStmt {
            name: "render".to_string(),
            params: vec![o::FnParam::typed("data", o::dynamic_type())],
            statements: vec![o::Statement::return_stmt(o::literal(""))],
            is_generator: false,
            type_: Some(o::string_type()),
        });
        assert_eq!(
            emit_statements(std::slice::from_ref(&decl), true, false),
            "function render(data: any): string {\n  return '';\n}"
        );
        assert_eq!(
            emit_statements(std::slice::from_ref(&decl), false, true),
            "function render(data){return ''}"
        );
    }
}
