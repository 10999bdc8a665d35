//! Dead code elimination.

use super::OptimizationPass;
use crate::{RirBlock, RirExpression, RirModule, RirStatement};

/// Removes code that cannot run or cannot be observed:
/// statements after a diverging statement, `while false` loops,
/// effect-free expression statements, and empty block statements.
pub struct DeadCodeElimination;

impl OptimizationPass for DeadCodeElimination {
    fn name(&self) -> &str {
        "dead-code-elimination"
    }

    fn run(&self, module: &mut RirModule) -> bool {
        let mut changed = false;
        for function in &mut module.functions {
            changed |= sweep_block(&mut function.body);
        }
        changed
    }
}

fn sweep_block(block: &mut RirBlock) -> bool {
    let mut changed = false;

    // Nothing runs after return/break/continue.
    if let Some(cut) = block
        .statements
        .iter()
        .position(|statement| statement.diverges())
    {
        if cut + 1 < block.statements.len() || block.final_expr.is_some() {
            block.statements.truncate(cut + 1);
            block.final_expr = None;
            changed = true;
        }
    }

    for statement in &mut block.statements {
        changed |= sweep_statement(statement);
    }

    let before = block.statements.len();
    block.statements.retain(|statement| !is_dead(statement));
    changed |= block.statements.len() != before;

    changed
}

fn sweep_statement(statement: &mut RirStatement) -> bool {
    match statement {
        RirStatement::If {
            then_block,
            else_block,
            ..
        } => {
            let mut changed = sweep_block(then_block);
            if let Some(else_block) = else_block {
                changed |= sweep_block(else_block);
            }
            changed
        }
        RirStatement::While { body, .. }
        | RirStatement::For { body, .. }
        | RirStatement::Loop { body, .. } => sweep_block(body),
        RirStatement::Match { arms, .. } => {
            let mut changed = false;
            for (_, body) in arms {
                changed |= sweep_block(body);
            }
            changed
        }
        RirStatement::Block { block, .. } => sweep_block(block),
        _ => false,
    }
}

fn is_dead(statement: &RirStatement) -> bool {
    match statement {
        // An expression statement with no effects does nothing.
        RirStatement::Expression { expr, .. } => expr.is_pure(),
        // `while false` never runs.
        RirStatement::While { condition, .. } => {
            matches!(**condition, RirExpression::BoolLiteral { value: false, .. })
        }
        RirStatement::Block { block, .. } => block.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rive_core::types::TypeId;
    use rive_core::Span;

    fn span() -> Span {
        Span::new(0, 0)
    }

    fn int_expr_stmt(value: i64) -> RirStatement {
        RirStatement::Expression {
            expr: Box::new(RirExpression::IntLiteral {
                value,
                span: span(),
            }),
            span: span(),
        }
    }

    fn call_stmt(name: &str) -> RirStatement {
        RirStatement::Expression {
            expr: Box::new(RirExpression::Call {
                function: name.to_string(),
                arguments: vec![],
                return_type: TypeId::UNIT,
                span: span(),
            }),
            span: span(),
        }
    }

    #[test]
    fn drops_statements_after_return() {
        let mut block = RirBlock::with_statements(
            vec![
                RirStatement::Return {
                    value: None,
                    span: span(),
                },
                call_stmt("f"),
            ],
            span(),
        );
        assert!(sweep_block(&mut block));
        assert_eq!(block.statements.len(), 1);
    }

    #[test]
    fn drops_pure_expression_statements() {
        let mut block =
            RirBlock::with_statements(vec![int_expr_stmt(1), call_stmt("f")], span());
        assert!(sweep_block(&mut block));
        assert_eq!(block.statements.len(), 1);
        assert!(matches!(
            block.statements[0],
            RirStatement::Expression { .. }
        ));
    }

    #[test]
    fn drops_while_false() {
        let mut block = RirBlock::with_statements(
            vec![RirStatement::While {
                condition: Box::new(RirExpression::BoolLiteral {
                    value: false,
                    span: span(),
                }),
                body: RirBlock::with_statements(vec![call_stmt("f")], span()),
                span: span(),
            }],
            span(),
        );
        assert!(sweep_block(&mut block));
        assert!(block.statements.is_empty());
    }

    #[test]
    fn keeps_effectful_statements() {
        let mut block = RirBlock::with_statements(vec![call_stmt("f")], span());
        assert!(!sweep_block(&mut block));
        assert_eq!(block.statements.len(), 1);
    }
}
