use rive_ir::{
    lower, RirExpression, RirModule, RirStatement,
};
use rive_core::types::TypeId;

fn lower_src(src: &str) -> RirModule {
    let (program, registry) = rive_parser::parse(src).expect("parse");
    let registry = rive_semantic::analyze(&program, registry).expect("analyze");
    lower(&program, registry).expect("lower")
}

fn main_body(module: &RirModule) -> &rive_ir::RirBlock {
    &module.function("main").expect("main lowered").body
}

#[test]
fn lowers_functions_in_any_order() {
    let module = lower_src(
        "fun main() { let x = double(2) }\nfun double(n: Int): Int = n * 2",
    );
    assert_eq!(module.functions.len(), 2);
    let double = module.function("double").expect("double");
    assert_eq!(double.return_type, TypeId::INT);
    // Expression body becomes the block's trailing value.
    assert!(double.body.final_expr.is_some());
}

#[test]
fn trailing_expression_becomes_final_expr() {
    let module = lower_src("fun f(): Int { let x = 1\nx + 1 }\nfun main() { }");
    let body = &module.function("f").expect("f").body;
    assert_eq!(body.statements.len(), 1);
    let final_expr = body.final_expr.as_ref().expect("final expr");
    assert_eq!(final_expr.type_id(), TypeId::INT);
}

#[test]
fn trailing_call_stays_a_statement() {
    let module = lower_src("fun main() { print(\"hi\") }");
    let body = main_body(&module);
    assert!(body.final_expr.is_none());
    assert_eq!(body.statements.len(), 1);
}

#[test]
fn let_bindings_carry_types_and_strategies() {
    let module = lower_src("fun main() { let mut n = 1\nlet s = \"x\" }");
    let body = main_body(&module);
    let RirStatement::Let {
        type_id,
        mutable,
        strategy,
        ..
    } = &body.statements[0]
    else {
        panic!("expected let");
    };
    assert_eq!(*type_id, TypeId::INT);
    assert!(*mutable);
    assert!(strategy.is_copy());

    let RirStatement::Let { type_id, strategy, .. } = &body.statements[1] else {
        panic!("expected let");
    };
    assert_eq!(*type_id, TypeId::TEXT);
    assert!(!strategy.is_copy());
}

#[test]
fn nullable_binding_wraps_the_initializer() {
    let module = lower_src("fun main() { let x: Int? = 42 }");
    let body = main_body(&module);
    let RirStatement::Let { value, type_id, .. } = &body.statements[0] else {
        panic!("expected let");
    };
    assert!(matches!(**value, RirExpression::WrapOptional { .. }));
    assert_eq!(
        module.type_registry.nullable_inner(*type_id),
        Some(TypeId::INT)
    );
}

#[test]
fn null_initializer_is_typed_by_the_annotation() {
    let module = lower_src("fun main() { let x: Int? = null }");
    let body = main_body(&module);
    let RirStatement::Let { value, type_id, .. } = &body.statements[0] else {
        panic!("expected let");
    };
    let RirExpression::NullLiteral {
        type_id: null_type, ..
    } = **value
    else {
        panic!("expected null literal, got {value:?}");
    };
    assert_eq!(null_type, *type_id);
}

#[test]
fn inferred_nullable_binding_gets_optional_type() {
    let module = lower_src("fun main() { let x? = 7 }");
    let body = main_body(&module);
    let RirStatement::Let { value, type_id, .. } = &body.statements[0] else {
        panic!("expected let");
    };
    assert_eq!(
        module.type_registry.nullable_inner(*type_id),
        Some(TypeId::INT)
    );
    assert!(matches!(**value, RirExpression::WrapOptional { .. }));
}

#[test]
fn elvis_with_plain_fallback_unwraps() {
    let module = lower_src("fun main() { let x: Int? = null\nlet y = x ?: 0 }");
    let body = main_body(&module);
    let RirStatement::Let { value, type_id, .. } = &body.statements[1] else {
        panic!("expected let");
    };
    assert_eq!(*type_id, TypeId::INT);
    let RirExpression::Elvis { result_type, .. } = &**value else {
        panic!("expected elvis, got {value:?}");
    };
    assert_eq!(*result_type, TypeId::INT);
}

#[test]
fn elvis_on_non_nullable_drops_the_fallback() {
    let module = lower_src("fun main() { let x = 1\nlet y = x ?: 2 }");
    let body = main_body(&module);
    let RirStatement::Let { value, .. } = &body.statements[1] else {
        panic!("expected let");
    };
    assert!(matches!(**value, RirExpression::Variable { .. }));
}

#[test]
fn interpolation_lowers_to_format_text() {
    let module = lower_src("fun main() { let n = 2\nprint(\"n = ${n + 1}\") }");
    let body = main_body(&module);
    let RirStatement::Expression { expr, .. } = &body.statements[1] else {
        panic!("expected print call");
    };
    let RirExpression::Call { arguments, .. } = &**expr else {
        panic!("expected call");
    };
    assert!(matches!(arguments[0], RirExpression::FormatText { .. }));
}

#[test]
fn else_if_chains_nest_into_else_blocks() {
    let module = lower_src(
        "fun main() { let n = 1\nif n > 0 { print(\"+\") } else if n < 0 { print(\"-\") } else { print(\"0\") } }",
    );
    let body = main_body(&module);
    let RirStatement::If { else_block, .. } = &body.statements[1] else {
        panic!("expected if statement, got {:?}", body.statements[1]);
    };
    let nested = else_block.as_ref().expect("else block");
    assert!(matches!(nested.statements[0], RirStatement::If { .. }));
}

#[test]
fn value_loop_carries_its_break_type() {
    let module = lower_src("fun main() { let x = loop { break with 42 }\nprint(x) }");
    let body = main_body(&module);
    let RirStatement::Let { value, type_id, .. } = &body.statements[0] else {
        panic!("expected let");
    };
    assert_eq!(*type_id, TypeId::INT);
    let RirExpression::Loop { result_type, .. } = &**value else {
        panic!("expected loop expression, got {value:?}");
    };
    assert_eq!(*result_type, TypeId::INT);
}

#[test]
fn mixed_break_values_widen_to_nullable() {
    let module = lower_src(
        "fun main() { let n = 1\nlet x = loop { if n > 0 { break with 1 }\nbreak with null }\nprint(x ?: 0) }",
    );
    let body = main_body(&module);
    let RirStatement::Let { type_id, value, .. } = &body.statements[1] else {
        panic!("expected let");
    };
    assert_eq!(
        module.type_registry.nullable_inner(*type_id),
        Some(TypeId::INT)
    );
    // The plain `break with 1` is wrapped to Some(1).
    let RirExpression::Loop { body: loop_body, .. } = &**value else {
        panic!("expected loop");
    };
    let RirStatement::If { then_block, .. } = &loop_body.statements[0] else {
        panic!("expected if inside loop");
    };
    let RirStatement::Break {
        value: Some(break_value),
        ..
    } = &then_block.statements[0]
    else {
        panic!("expected break with value");
    };
    assert!(matches!(**break_value, RirExpression::WrapOptional { .. }));
}

#[test]
fn for_loops_keep_range_bounds_and_inclusivity() {
    let module = lower_src("fun main() { for i in 0..=9 { print(i) } }");
    let body = main_body(&module);
    let RirStatement::For {
        inclusive, start, ..
    } = &body.statements[0]
    else {
        panic!("expected for");
    };
    assert!(*inclusive);
    assert!(matches!(**start, RirExpression::IntLiteral { value: 0, .. }));
}

#[test]
fn match_arms_lower_with_or_patterns() {
    let module = lower_src(
        r#"fun main() {
    let code = 404
    let label = match code {
        200 -> "ok",
        404, 410 -> "gone",
        in 500..=599 -> "server",
        _ -> "other",
    }
    print(label)
}"#,
    );
    let body = main_body(&module);
    let RirStatement::Let { value, .. } = &body.statements[1] else {
        panic!("expected let");
    };
    let RirExpression::Match {
        arms, result_type, ..
    } = &**value
    else {
        panic!("expected match, got {value:?}");
    };
    assert_eq!(*result_type, TypeId::TEXT);
    assert_eq!(arms.len(), 4);
    assert!(matches!(arms[1].0, rive_ir::RirPattern::Or { .. }));
    assert!(matches!(
        arms[2].0,
        rive_ir::RirPattern::Range {
            start: 500,
            end: 599,
            inclusive: true,
            ..
        }
    ));
}

#[test]
fn return_values_are_coerced_to_nullable_returns() {
    let module = lower_src(
        "fun find(n: Int): Int? { if n > 0 { return n }\nreturn null }\nfun main() { print(find(1) ?: 0) }",
    );
    let find = &module.function("find").expect("find").body;
    let RirStatement::If { then_block, .. } = &find.statements[0] else {
        panic!("expected if");
    };
    let RirStatement::Return {
        value: Some(value), ..
    } = &then_block.statements[0]
    else {
        panic!("expected return");
    };
    assert!(matches!(**value, RirExpression::WrapOptional { .. }));
}

#[test]
fn rir_dump_renders_pseudocode() {
    let module = lower_src("fun main() { let mut n = 0\nwhile n < 3 { n = n + 1 } }");
    let dump = module.dump();
    assert!(dump.contains("fun main()"));
    assert!(dump.contains("let mut n: Int [copy] = 0"));
    assert!(dump.contains("while (n < 3) {"));
}
