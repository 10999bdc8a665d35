use pretty_assertions::assert_eq;
use rive_parser::ast::{
    BinaryOperator, Expression, FunctionBody, Item, Statement, StringPart,
};
use rive_parser::control_flow::Pattern;
use rive_parser::parse;
use rive_core::types::{TypeId, TypeKind};

fn parse_ok(src: &str) -> rive_parser::ast::Program {
    parse(src).expect("parse").0
}

fn main_body(src: &str) -> Vec<Statement> {
    let program = parse_ok(src);
    let Item::Function(func) = program.items.into_iter().next().expect("one item");
    match func.body {
        FunctionBody::Block(block) => block.statements,
        FunctionBody::Expression(_) => panic!("expected block body"),
    }
}

#[test]
fn parses_an_empty_main() {
    let program = parse_ok("fun main() {}");
    assert_eq!(program.items.len(), 1);
    let Item::Function(func) = &program.items[0];
    assert_eq!(func.name, "main");
    assert_eq!(func.return_type, TypeId::UNIT);
    assert!(func.params.is_empty());
}

#[test]
fn parses_params_and_return_type() {
    let program = parse_ok("fun add(a: Int, b: Int): Int { return a + b }");
    let Item::Function(func) = &program.items[0];
    assert_eq!(func.params.len(), 2);
    assert_eq!(func.params[0].name, "a");
    assert_eq!(func.params[0].param_type, TypeId::INT);
    assert_eq!(func.return_type, TypeId::INT);
}

#[test]
fn parses_expression_bodied_functions() {
    let program = parse_ok("fun double(x: Int): Int = x * 2");
    let Item::Function(func) = &program.items[0];
    assert!(matches!(func.body, FunctionBody::Expression(_)));
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let stmts = main_body("fun main() { let x = 1 + 2 * 3 }");
    let Statement::Let { initializer, .. } = &stmts[0] else {
        panic!("expected let");
    };
    let Expression::Binary {
        operator: BinaryOperator::Add,
        right,
        ..
    } = initializer
    else {
        panic!("expected addition at the top: {initializer:?}");
    };
    assert!(matches!(
        **right,
        Expression::Binary {
            operator: BinaryOperator::Multiply,
            ..
        }
    ));
}

#[test]
fn elvis_has_lowest_precedence() {
    let stmts = main_body("fun main() { let x = a ?: b + 1 }");
    let Statement::Let { initializer, .. } = &stmts[0] else {
        panic!("expected let");
    };
    let Expression::Elvis { fallback, .. } = initializer else {
        panic!("expected elvis at the top: {initializer:?}");
    };
    assert!(matches!(
        **fallback,
        Expression::Binary {
            operator: BinaryOperator::Add,
            ..
        }
    ));
}

#[test]
fn parses_nullable_types_and_inferred_nullable_lets() {
    let (program, registry) =
        parse("fun main() { let a: Int? = null\nlet b? = 42 }").expect("parse");
    let Item::Function(func) = &program.items[0];
    let FunctionBody::Block(block) = &func.body else {
        panic!("expected block body");
    };

    let Statement::Let {
        var_type: Some(ty),
        infer_nullable: false,
        ..
    } = &block.statements[0]
    else {
        panic!("expected annotated let");
    };
    assert!(matches!(
        registry.kind(*ty),
        Some(TypeKind::Optional { inner }) if *inner == TypeId::INT
    ));

    assert!(matches!(
        &block.statements[1],
        Statement::Let {
            infer_nullable: true,
            var_type: None,
            ..
        }
    ));
}

#[test]
fn rejects_nullable_marker_with_annotation() {
    let err = parse("fun main() { let x?: Int = null }").unwrap_err();
    assert!(err.to_string().contains("cannot combine"));
}

#[test]
fn parses_const_and_rejects_const_mut() {
    let stmts = main_body("fun main() { const LIMIT = 10 }");
    assert!(matches!(&stmts[0], Statement::Const { name, .. } if name == "LIMIT"));
    assert!(parse("fun main() { const mut x = 1 }").is_err());
}

#[test]
fn parses_array_types_and_index_assignment() {
    let stmts = main_body("fun main() { let mut xs: [Int; 3] = [1, 2, 3]\nxs[0] = 9 }");
    assert!(matches!(&stmts[0], Statement::Let { mutable: true, .. }));
    let Statement::AssignIndex { name, .. } = &stmts[1] else {
        panic!("expected index assignment: {:?}", stmts[1]);
    };
    assert_eq!(name, "xs");
}

#[test]
fn rejects_invalid_assignment_targets() {
    assert!(parse("fun main() { 1 + 2 = 3 }").is_err());
    assert!(parse("fun main() { f() = 3 }").is_err());
}

#[test]
fn parses_else_if_chains() {
    let stmts = main_body(
        "fun main() { if a { } else if b { } else if c { } else { } }",
    );
    let Statement::Expression {
        expression: Expression::If(if_expr),
        ..
    } = &stmts[0]
    else {
        panic!("expected if statement");
    };
    assert_eq!(if_expr.else_if_branches.len(), 2);
    assert!(if_expr.else_block.is_some());
}

#[test]
fn parses_loops_and_break_with_value() {
    let stmts = main_body(
        "fun main() { let x = loop { break with 42 }\nwhile x < 10 { continue }\nfor i in 0..x { } }",
    );
    assert!(matches!(&stmts[0], Statement::Let { .. }));
    let Statement::Expression {
        expression: Expression::While(_),
        ..
    } = &stmts[1]
    else {
        panic!("expected while: {:?}", stmts[1]);
    };
    let Statement::Expression {
        expression: Expression::For(for_loop),
        ..
    } = &stmts[2]
    else {
        panic!("expected for: {:?}", stmts[2]);
    };
    assert!(matches!(*for_loop.iterable, Expression::Range(_)));
}

#[test]
fn parses_match_with_multi_patterns_and_ranges() {
    let stmts = main_body(
        r#"fun main() {
    let label = match code {
        200 -> "ok",
        404, 410 -> "gone",
        in 500..=599 -> "server",
        _ -> "other",
    }
}"#,
    );
    let Statement::Let { initializer, .. } = &stmts[0] else {
        panic!("expected let");
    };
    let Expression::Match(match_expr) = initializer else {
        panic!("expected match: {initializer:?}");
    };
    assert_eq!(match_expr.arms.len(), 4);
    assert_eq!(match_expr.arms[1].patterns.len(), 2);
    assert!(matches!(
        match_expr.arms[2].patterns[0],
        Pattern::Range {
            inclusive: true,
            ..
        }
    ));
    assert!(matches!(match_expr.arms[3].patterns[0], Pattern::Wildcard { .. }));
}

#[test]
fn match_requires_at_least_one_arm() {
    assert!(parse("fun main() { match x { } }").is_err());
}

#[test]
fn parses_string_interpolation_into_parts() {
    let stmts = main_body(r#"fun main() { let s = "sum: ${1 + 2} via $x" }"#);
    let Statement::Let { initializer, .. } = &stmts[0] else {
        panic!("expected let");
    };
    let Expression::Interpolation { parts, .. } = initializer else {
        panic!("expected interpolation: {initializer:?}");
    };
    assert_eq!(parts.len(), 4);
    assert!(matches!(&parts[0], StringPart::Text(t) if t == "sum: "));
    assert!(matches!(
        &parts[1],
        StringPart::Expr(Expression::Binary { .. })
    ));
    assert!(matches!(&parts[2], StringPart::Text(t) if t == " via "));
    assert!(matches!(
        &parts[3],
        StringPart::Expr(Expression::Variable { name, .. }) if name == "x"
    ));
}

#[test]
fn interpolated_expression_spans_point_into_the_file() {
    let src = r#"fun main() { let s = "v: ${value}" }"#;
    let stmts = main_body(src);
    let Statement::Let { initializer, .. } = &stmts[0] else {
        panic!("expected let");
    };
    let Expression::Interpolation { parts, .. } = initializer else {
        panic!("expected interpolation");
    };
    let StringPart::Expr(expr) = &parts[1] else {
        panic!("expected expr part");
    };
    let span = expr.span();
    assert_eq!(&src[span.start..span.end], "value");
}

#[test]
fn only_identifiers_are_callable() {
    let err = parse("fun main() { (1 + 2)(3) }").unwrap_err();
    assert!(err.to_string().contains("only identifiers can be called"));
}

#[test]
fn top_level_must_be_functions() {
    assert!(parse("let x = 1").is_err());
}

#[test]
fn reports_unknown_types() {
    let err = parse("fun main() { let x: Strang = 1 }").unwrap_err();
    assert!(err.to_string().contains("unknown type `Strang`"));
}
