use rive_ir::opt::Optimizer;
use rive_ir::{lower, RirExpression, RirModule, RirStatement};

fn optimized(src: &str) -> RirModule {
    let (program, registry) = rive_parser::parse(src).expect("parse");
    let registry = rive_semantic::analyze(&program, registry).expect("analyze");
    let mut module = lower(&program, registry).expect("lower");
    Optimizer::new().optimize(&mut module);
    module
}

#[test]
fn folds_constants_through_the_pipeline() {
    let module = optimized("fun main() { let x = 1 + 2 * 3\nprint(x) }");
    let body = &module.function("main").expect("main").body;
    let RirStatement::Let { value, .. } = &body.statements[0] else {
        panic!("expected let");
    };
    assert!(matches!(**value, RirExpression::IntLiteral { value: 7, .. }));
}

#[test]
fn reduces_if_true_and_sweeps_the_residue() {
    let module = optimized(
        "fun main() { if 1 < 2 { print(\"yes\") } else { print(\"no\") } }",
    );
    let body = &module.function("main").expect("main").body;
    // The branch collapses to a block holding only the taken side.
    let RirStatement::Block { block, .. } = &body.statements[0] else {
        panic!("expected block, got {:?}", body.statements[0]);
    };
    assert_eq!(block.statements.len(), 1);
}

#[test]
fn removes_unreachable_code_after_return() {
    let module = optimized("fun f(): Int { return 1\nprint(\"dead\") }\nfun main() { }");
    let body = &module.function("f").expect("f").body;
    assert_eq!(body.statements.len(), 1);
    assert!(matches!(body.statements[0], RirStatement::Return { .. }));
}

#[test]
fn drops_constant_false_loops() {
    let module = optimized("fun main() { while 1 > 2 { print(\"never\") }\nprint(\"after\") }");
    let body = &module.function("main").expect("main").body;
    assert_eq!(body.statements.len(), 1);
}

#[test]
fn keeps_effectful_code() {
    let module = optimized("fun main() { print(\"kept\") }");
    let body = &module.function("main").expect("main").body;
    assert_eq!(body.statements.len(), 1);
}
